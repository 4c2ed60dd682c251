mod block_file;
mod cli;
mod shell;

use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use block_dev::{BlockDevice, RamDisk};
use clap::Parser;
use simple_fs::{Volume, BLOCK_SIZE};

use self::{block_file::BlockFile, cli::Cli, shell::Shell};

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let block_dev: Arc<dyn BlockDevice> = match &cli.image {
        Some(path) => {
            let fd = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?;
            log::info!("image={path:?} blocks={}", cli.blocks);
            Arc::new(BlockFile::new(fd, cli.blocks)?)
        }
        None => {
            log::info!("in-memory disk, blocks={}", cli.blocks);
            Arc::new(RamDisk::new(BLOCK_SIZE, cli.blocks))
        }
    };

    let mut shell = Shell::new(Volume::new(block_dev, unix_now));
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "simplefs> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if shell.execute(&line, &mut stdout)?.is_quit() {
            break;
        }
    }

    Ok(())
}
