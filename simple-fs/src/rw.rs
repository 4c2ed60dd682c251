//! # 读写引擎
//!
//! 按字节区间读写文件，处理首尾不完整的块。
//! 每写完一个块就把数据块、间接索引块、inode 依次落盘。

use crate::free_map::FreeMap;
use crate::inode_table::InodeTable;
use crate::resolver::Resolver;
use crate::{DataBlock, FsError, Result};
use crate::{BLOCK_SIZE, MAX_FILE_SIZE};

/// 从指定位置(字节偏移)读出数据填充`buf`，不会越过文件大小
pub fn read_at(table: &InodeTable, slot: u32, offset: usize, buf: &mut [u8]) -> Result<usize> {
    let inode = table.get(slot)?;
    let block_device = table.block_device();

    let mut start = offset;
    let end = offset.saturating_add(buf.len()).min(inode.size as usize);
    if start >= end {
        return Ok(0);
    }

    let mut resolver = Resolver::new(table.super_block(), block_device, slot);
    let mut block: DataBlock = [0; BLOCK_SIZE];
    // 已读取多少字节
    let mut read_size = 0;
    while start < end {
        // 当前块的逻辑索引
        let block_index = start / BLOCK_SIZE;
        // 当前块的末地址(字节)
        let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
        let block_read_size = current_block_end - start;
        let dest = &mut buf[read_size..read_size + block_read_size];

        match resolver.lookup(&inode, block_index)? {
            Some(block_id) => {
                block_device.read_block(block_id as usize, &mut block);
                // 绝对地址 % 块大小 = 块内偏移
                let src = &block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_read_size];
                dest.copy_from_slice(src);
            }
            None => {
                log::debug!("inode {slot}: hole at block {block_index}, reading zeros");
                dest.fill(0);
            }
        }

        read_size += block_read_size;
        start = current_block_end;
    }

    Ok(read_size)
}

/// 从指定位置写入`buf`。
///
/// 只允许覆盖已有内容或紧接文件末尾追加，`offset` 超过文件大小时报错。
/// 写到一半耗尽空间或触及文件容量时，返回已经写入的字节数。
pub fn write_at(
    table: &InodeTable,
    free_map: &mut FreeMap,
    slot: u32,
    offset: usize,
    buf: &[u8],
) -> Result<usize> {
    let mut inode = table.get(slot)?;
    let block_device = table.block_device();

    let size = inode.size as usize;
    if offset > size {
        return Err(FsError::OffsetBeyondEnd { offset, size });
    }
    if buf.is_empty() {
        return Ok(0);
    }
    if offset >= MAX_FILE_SIZE {
        return Err(FsError::FileTooLarge);
    }

    let mut start = offset;
    let end = offset.saturating_add(buf.len()).min(MAX_FILE_SIZE);

    let mut resolver = Resolver::new(table.super_block(), block_device, slot);
    let mut block: DataBlock = [0; BLOCK_SIZE];
    let mut written_size = 0;
    while start < end {
        let block_index = start / BLOCK_SIZE;
        let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
        let block_write_size = current_block_end - start;

        let mapping = match resolver.map(&mut inode, block_index, free_map) {
            Ok(mapping) => mapping,
            Err(err @ (FsError::NoSpace | FsError::FileTooLarge)) if written_size > 0 => {
                log::warn!("inode {slot}: short write of {written_size} bytes: {err}");
                break;
            }
            Err(err) => return Err(err),
        };

        // 新块从全 0 开始，旧块要先读出来以保留未覆盖的字节
        if mapping.fresh {
            block.fill(0);
        } else {
            block_device.read_block(mapping.block_id as usize, &mut block);
        }
        block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_write_size]
            .copy_from_slice(&buf[written_size..written_size + block_write_size]);
        block_device.write_block(mapping.block_id as usize, &block);

        if let Some((block_id, indirect)) = resolver.take_dirty_indirect() {
            indirect.store(block_device, block_id);
        }

        written_size += block_write_size;
        start = current_block_end;
        inode.size = inode.size.max(start as u32);
        table.store(slot, &inode)?;
    }

    Ok(written_size)
}
