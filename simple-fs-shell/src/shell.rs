use std::fs::File;
use std::io::{self, Read, Write};

use simple_fs::{Volume, BLOCK_SIZE};

const HELP: &str = "\
Commands are:
    format
    mount
    unmount
    debug
    create
    delete  <inode>
    getsize <inode>
    cat     <inode>
    copyin  <file> <inode>
    copyout <inode> <file>
    read    <inode> <length> <offset>
    write   <inode> <offset> <text>
    help
    quit
    exit";

/// 一条命令执行后，REPL 是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl Flow {
    pub fn is_quit(self) -> bool {
        self == Flow::Quit
    }
}

pub struct Shell {
    volume: Volume,
}

impl Shell {
    pub fn new(volume: Volume) -> Self {
        Self { volume }
    }

    /// 解析并执行一行命令，结果写入 `out`
    ///
    /// 只有 `out` 本身的写入错误会向上传播，文件系统错误都打印出来
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = args.first() else {
            return Ok(Flow::Continue);
        };
        log::debug!("command: {args:?}");

        match (cmd, args.len()) {
            ("format", 1) => match self.volume.format() {
                Ok(()) => writeln!(out, "disk formatted.")?,
                Err(err) => writeln!(out, "format failed: {err}")?,
            },
            ("mount", 1) => match self.volume.mount() {
                Ok(()) => writeln!(out, "disk mounted.")?,
                Err(err) => writeln!(out, "mount failed: {err}")?,
            },
            ("unmount", 1) => match self.volume.unmount() {
                Ok(()) => writeln!(out, "disk unmounted.")?,
                Err(err) => writeln!(out, "unmount failed: {err}")?,
            },
            ("debug", 1) => match self.volume.debug() {
                Ok(report) => {
                    writeln!(out, "{report}")?;
                    if let Ok(free) = self.volume.free_blocks() {
                        writeln!(out, "{free} free blocks")?;
                    }
                }
                Err(err) => writeln!(out, "debug failed: {err}")?,
            },
            ("create", 1) => match self.volume.create() {
                Ok(slot) => writeln!(out, "created inode {slot}")?,
                Err(err) => writeln!(out, "create failed: {err}")?,
            },
            ("delete", 2) => match parse_slot(args[1]) {
                Some(slot) => match self.volume.delete(slot) {
                    Ok(()) => writeln!(out, "inode {slot} deleted.")?,
                    Err(err) => writeln!(out, "delete failed: {err}")?,
                },
                None => writeln!(out, "use: delete <inode>")?,
            },
            ("getsize", 2) => match parse_slot(args[1]) {
                Some(slot) => match self.volume.size(slot) {
                    Ok(size) => writeln!(out, "inode {slot} has size {size}")?,
                    Err(err) => writeln!(out, "getsize failed: {err}")?,
                },
                None => writeln!(out, "use: getsize <inode>")?,
            },
            ("cat", 2) => match parse_slot(args[1]) {
                Some(slot) => match self.copy_out(slot, out) {
                    Ok(_) => {}
                    Err(err) => writeln!(out, "cat failed: {err}")?,
                },
                None => writeln!(out, "use: cat <inode>")?,
            },
            ("copyin", 3) => match parse_slot(args[2]) {
                Some(slot) => match self.copy_in(args[1], slot) {
                    Ok(total) => writeln!(out, "{total} bytes copied")?,
                    Err(err) => writeln!(out, "copyin failed: {err}")?,
                },
                None => writeln!(out, "use: copyin <file> <inode>")?,
            },
            ("copyout", 3) => match parse_slot(args[1]) {
                Some(slot) => {
                    let copied =
                        File::create(args[2]).and_then(|mut file| self.copy_out(slot, &mut file));
                    match copied {
                        Ok(total) => writeln!(out, "{total} bytes copied")?,
                        Err(err) => writeln!(out, "copyout failed: {err}")?,
                    }
                }
                None => writeln!(out, "use: copyout <inode> <file>")?,
            },
            ("read", 4) => match (parse_slot(args[1]), args[2].parse::<usize>(), args[3].parse()) {
                (Some(slot), Ok(length), Ok(offset)) => {
                    // 读取不会越过文件末尾，缓冲区按剩余字节数分配
                    let remaining = self.volume.size(slot).unwrap_or(0).saturating_sub(offset);
                    let mut buf = vec![0u8; length.min(remaining)];
                    match self.volume.read(slot, &mut buf, offset) {
                        Ok(n) => {
                            out.write_all(&buf[..n])?;
                            writeln!(out)?;
                            writeln!(out, "{n} bytes read")?;
                        }
                        Err(err) => writeln!(out, "read failed: {err}")?,
                    }
                }
                _ => writeln!(out, "use: read <inode> <length> <offset>")?,
            },
            ("write", n) if n >= 4 => match (parse_slot(args[1]), args[2].parse()) {
                (Some(slot), Ok(offset)) => {
                    let text = skip_words(line, 3);
                    match self.volume.write(slot, text.as_bytes(), offset) {
                        Ok(n) => writeln!(out, "{n} bytes written")?,
                        Err(err) => writeln!(out, "write failed: {err}")?,
                    }
                }
                _ => writeln!(out, "use: write <inode> <offset> <text>")?,
            },
            ("help", _) => writeln!(out, "{HELP}")?,
            ("quit" | "exit", _) => return Ok(Flow::Quit),
            _ => writeln!(out, "unknown command: {cmd}\ntype 'help' for a list of commands.")?,
        }

        Ok(Flow::Continue)
    }

    /// 把宿主机文件追加到 inode 末尾，遇到短写即停止
    fn copy_in(&mut self, path: &str, slot: u32) -> io::Result<usize> {
        let mut file = File::open(path)?;
        let mut offset = self.volume.size(slot).map_err(|err| io::Error::other(err.to_string()))?;
        let mut total = 0;
        let mut buf = vec![0u8; 4 * BLOCK_SIZE];

        loop {
            let len = file.read(&mut buf)?;
            if len == 0 {
                break;
            }
            let written = self
                .volume
                .write(slot, &buf[..len], offset)
                .map_err(|err| io::Error::other(err.to_string()))?;
            offset += written;
            total += written;
            if written < len {
                log::warn!("inode {slot}: copyin stopped after {total} bytes");
                break;
            }
        }

        Ok(total)
    }

    fn copy_out(&self, slot: u32, dest: &mut impl Write) -> io::Result<usize> {
        let mut offset = 0;
        let mut buf = vec![0u8; 4 * BLOCK_SIZE];

        loop {
            let len = self
                .volume
                .read(slot, &mut buf, offset)
                .map_err(|err| io::Error::other(err.to_string()))?;
            if len == 0 {
                break;
            }
            dest.write_all(&buf[..len])?;
            offset += len;
        }

        Ok(offset)
    }
}

fn parse_slot(arg: &str) -> Option<u32> {
    arg.parse().ok()
}

/// 跳过前 `n` 个词，余下部分原样保留（去掉行尾换行）
fn skip_words(line: &str, n: usize) -> &str {
    let mut rest = line.trim_end_matches(['\r', '\n']).trim_start();
    for _ in 0..n {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_dev::RamDisk;
    use std::sync::Arc;

    fn shell(blocks: usize) -> Shell {
        let disk = Arc::new(RamDisk::new(BLOCK_SIZE, blocks));
        Shell::new(Volume::new(disk, || 1_700_000_000))
    }

    fn run(shell: &mut Shell, line: &str) -> String {
        let mut out = Vec::new();
        shell.execute(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn session() {
        let mut sh = shell(20);
        assert_eq!(run(&mut sh, "format"), "disk formatted.\n");
        assert_eq!(run(&mut sh, "mount"), "disk mounted.\n");
        assert_eq!(run(&mut sh, "create"), "created inode 1\n");
        assert_eq!(run(&mut sh, "write 1 0 hello   world\n"), "13 bytes written\n");
        assert_eq!(run(&mut sh, "getsize 1"), "inode 1 has size 13\n");
        assert_eq!(run(&mut sh, "read 1 5 8"), "world\n5 bytes read\n");
        assert_eq!(run(&mut sh, "cat 1"), "hello   world");
        assert_eq!(run(&mut sh, "delete 1"), "inode 1 deleted.\n");
        assert!(run(&mut sh, "getsize 1").starts_with("getsize failed:"));
    }

    #[test]
    fn write_keeps_text_verbatim() {
        let mut sh = shell(20);
        run(&mut sh, "format");
        run(&mut sh, "mount");
        run(&mut sh, "create");

        assert_eq!(run(&mut sh, "  write  1   0 a\tb  c \r\n"), "7 bytes written\n");
        assert_eq!(run(&mut sh, "cat 1"), "a\tb  c ");
    }

    #[test]
    fn read_length_is_clamped_to_file_size() {
        let mut sh = shell(20);
        run(&mut sh, "format");
        run(&mut sh, "mount");
        run(&mut sh, "create");
        run(&mut sh, "write 1 0 hi");

        assert_eq!(
            run(&mut sh, "read 1 18446744073709551615 0"),
            "hi\n2 bytes read\n"
        );
        assert_eq!(run(&mut sh, "read 1 18446744073709551615 5"), "\n0 bytes read\n");
        assert!(run(&mut sh, "read 2 18446744073709551615 0").starts_with("read failed:"));
    }

    #[test]
    fn errors_are_printed() {
        let mut sh = shell(20);
        assert!(run(&mut sh, "mount").starts_with("mount failed:"));
        assert!(run(&mut sh, "create").starts_with("create failed:"));
        assert_eq!(run(&mut sh, "delete x"), "use: delete <inode>\n");
        assert_eq!(run(&mut sh, "read 1 2"), "unknown command: read\ntype 'help' for a list of commands.\n");
        assert_eq!(run(&mut sh, ""), "");
    }

    #[test]
    fn debug_works_unmounted() {
        let mut sh = shell(20);
        run(&mut sh, "format");
        let out = run(&mut sh, "debug");
        assert!(out.contains("20 blocks"));
        assert!(!out.contains("free blocks"));

        run(&mut sh, "mount");
        assert!(run(&mut sh, "debug").contains("17 free blocks"));
    }

    #[test]
    fn quit() {
        let mut sh = shell(20);
        let mut out = Vec::new();
        assert!(sh.execute("quit", &mut out).unwrap().is_quit());
        assert!(sh.execute("exit", &mut out).unwrap().is_quit());
        assert!(!sh.execute("help", &mut out).unwrap().is_quit());
    }

    #[test]
    fn copy_through_host_files() {
        let dir = std::env::temp_dir();
        let src = dir.join(format!("simple-fs-shell-src-{}", std::process::id()));
        let dst = dir.join(format!("simple-fs-shell-dst-{}", std::process::id()));
        let data: Vec<u8> = (0..3 * BLOCK_SIZE + 100).map(|i| (i % 251) as u8).collect();
        std::fs::write(&src, &data).unwrap();

        let mut sh = shell(50);
        run(&mut sh, "format");
        run(&mut sh, "mount");
        run(&mut sh, "create");
        let copied = format!("{} bytes copied\n", data.len());
        assert_eq!(run(&mut sh, &format!("copyin {} 1", src.display())), copied);
        assert_eq!(run(&mut sh, &format!("copyout 1 {}", dst.display())), copied);
        assert_eq!(std::fs::read(&dst).unwrap(), data);

        std::fs::remove_file(src).unwrap();
        std::fs::remove_file(dst).unwrap();
    }
}
