//! # 地址解析层
//!
//! 把文件内的逻辑块索引翻译成物理块号：
//! - 索引 `0..3` 走直接索引；
//! - 索引 `3..3 + POINTERS_PER_BLOCK` 走唯一的间接索引块；
//! - 再往后就超出了单个文件的容量。
//!
//! 写路径上缺失的块会当场分配，但解析器从不落盘：inode 的改动直接体现在调用者
//! 传入的副本上，间接索引块的改动通过 [`Resolver::take_dirty_indirect`] 交给调用者写回。

use alloc::sync::Arc;

use block_dev::BlockDevice;

use crate::free_map::FreeMap;
use crate::layout::{DiskInode, IndirectBlock, SuperBlock};
use crate::{FsError, Result};
use crate::{MAX_FILE_BLOCKS, POINTERS_PER_INODE};

/// 一次写路径解析的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub block_id: u32,
    /// 是否为本次新分配的块；新块的旧内容没有意义
    pub fresh: bool,
}

pub struct Resolver<'a> {
    super_block: &'a SuperBlock,
    block_device: &'a Arc<dyn BlockDevice>,
    /// 正在解析的 inode 槽位号，用于报告损坏
    slot: u32,
    /// 已读入内存的间接索引块及其块号
    indirect: Option<(u32, IndirectBlock)>,
    indirect_dirty: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        super_block: &'a SuperBlock,
        block_device: &'a Arc<dyn BlockDevice>,
        slot: u32,
    ) -> Self {
        Self {
            super_block,
            block_device,
            slot,
            indirect: None,
            indirect_dirty: false,
        }
    }

    /// 读路径：`Ok(None)` 表示该逻辑块没有数据
    pub fn lookup(&mut self, inode: &DiskInode, block_index: usize) -> Result<Option<u32>> {
        if block_index >= MAX_FILE_BLOCKS {
            return Ok(None);
        }

        let block_id = if block_index < POINTERS_PER_INODE {
            inode.direct[block_index]
        } else {
            if inode.indirect == 0 {
                return Ok(None);
            }
            self.indirect_block(inode.indirect)?
                .get(block_index - POINTERS_PER_INODE)
        };

        match block_id {
            0 => Ok(None),
            block_id => self.super_block.check_pointer(self.slot, block_id).map(Some),
        }
    }

    /// 写路径：缺失的数据块与间接索引块都会被分配。
    ///
    /// 失败时不会遗留任何新分配的块。
    pub fn map(
        &mut self,
        inode: &mut DiskInode,
        block_index: usize,
        free_map: &mut FreeMap,
    ) -> Result<Mapping> {
        if block_index >= MAX_FILE_BLOCKS {
            return Err(FsError::FileTooLarge);
        }

        /******************** 直接索引 ********************/
        if block_index < POINTERS_PER_INODE {
            let ptr = &mut inode.direct[block_index];
            if *ptr != 0 {
                return self.existing(*ptr);
            }
            *ptr = free_map.alloc().ok_or(FsError::NoSpace)?;
            return Ok(Mapping {
                block_id: *ptr,
                fresh: true,
            });
        }

        /******************** 间接索引 ********************/
        let index = block_index - POINTERS_PER_INODE;
        let new_indirect = inode.indirect == 0;
        if new_indirect {
            let block_id = free_map.alloc().ok_or(FsError::NoSpace)?;
            inode.indirect = block_id;
            // 新的索引块不读盘，直接视为全 0
            self.indirect = Some((block_id, IndirectBlock::empty()));
            self.indirect_dirty = true;
        }

        let ptr = self.indirect_block(inode.indirect)?.get(index);
        if ptr != 0 {
            return self.existing(ptr);
        }

        let Some(block_id) = free_map.alloc() else {
            if new_indirect {
                // 回滚：不留下空的间接索引块
                free_map.dealloc(inode.indirect);
                inode.indirect = 0;
                self.indirect = None;
                self.indirect_dirty = false;
            }
            return Err(FsError::NoSpace);
        };

        if let Some((_, indirect)) = self.indirect.as_mut() {
            indirect.set(index, block_id);
        }
        self.indirect_dirty = true;

        Ok(Mapping {
            block_id,
            fresh: true,
        })
    }

    /// 若间接索引块在写路径上被改动，取出它的块号与内容以便写回
    pub fn take_dirty_indirect(&mut self) -> Option<(u32, &IndirectBlock)> {
        if !core::mem::take(&mut self.indirect_dirty) {
            return None;
        }
        self.indirect
            .as_ref()
            .map(|(block_id, indirect)| (*block_id, indirect))
    }
}

impl Resolver<'_> {
    fn existing(&self, block_id: u32) -> Result<Mapping> {
        self.super_block
            .check_pointer(self.slot, block_id)
            .map(|block_id| Mapping {
                block_id,
                fresh: false,
            })
    }

    /// 按需读入间接索引块
    fn indirect_block(&mut self, block_id: u32) -> Result<&IndirectBlock> {
        let indirect = match self.indirect.take() {
            Some((cached, indirect)) if cached == block_id => indirect,
            _ => {
                let block_id = self.super_block.check_pointer(self.slot, block_id)?;
                self.indirect_dirty = false;
                IndirectBlock::load(self.block_device, block_id)
            }
        };

        Ok(&self.indirect.insert((block_id, indirect)).1)
    }
}
