//! # 空闲空间分配器
//!
//! 位图只存在于内存中，不落盘：每次挂载时从超级块、inode 表以及
//! 有效 inode 引用的间接索引块重建。
//!
//! 超级块与 inode 表所在块永远处于占用状态。

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use block_dev::BlockDevice;

use crate::inode_table::InodeTable;
use crate::layout::{IndirectBlock, SuperBlock};
use crate::{FsError, Result};

/// 每组 64 位，第 `i` 位为 1 表示块 `组号 * 64 + i` 已被占用
#[derive(Debug, Clone)]
pub struct FreeMap {
    groups: Vec<u64>,
    total_blocks: usize,
    free_blocks: usize,
}

impl FreeMap {
    /// 只有元数据区域被占用的位图
    pub fn new(super_block: &SuperBlock) -> Self {
        let total_blocks = super_block.total_blocks as usize;
        let mut map = Self {
            groups: vec![0; total_blocks.div_ceil(64)],
            total_blocks,
            free_blocks: total_blocks,
        };
        for block_id in 0..super_block.data_start().min(super_block.total_blocks) {
            map.set(block_id as usize);
        }
        map
    }

    /// 扫描 inode 表，标记所有被有效 inode 引用的块。
    ///
    /// 指向数据区外或已被其它文件占用的块都视为磁盘损坏。
    pub fn rebuild(super_block: &SuperBlock, block_device: &Arc<dyn BlockDevice>) -> Result<Self> {
        let mut map = Self::new(super_block);
        let table = InodeTable::new(super_block, block_device);

        for (slot, inode) in table.valid_inodes() {
            for &block_id in inode.direct.iter().filter(|&&ptr| ptr != 0) {
                map.claim(super_block, slot, block_id)?;
            }

            if inode.indirect != 0 {
                map.claim(super_block, slot, inode.indirect)?;
                for block_id in IndirectBlock::load(block_device, inode.indirect).used() {
                    map.claim(super_block, slot, block_id)?;
                }
            }
        }

        log::debug!(
            "free map rebuilt: {}/{} blocks free",
            map.free_blocks,
            map.total_blocks
        );
        Ok(map)
    }

    /// 分配编号最小的空闲块。
    /// 若空间用尽，则返回空。
    pub fn alloc(&mut self) -> Option<u32> {
        let (group_index, ingroup_index) = self
            .groups
            .iter()
            .enumerate()
            .find_map(|(group_index, &bits)| {
                (bits != u64::MAX).then_some((group_index, bits.trailing_ones() as usize))
            })?;

        let block_id = group_index * 64 + ingroup_index;
        // 最后一组的高位不对应任何块
        if block_id >= self.total_blocks {
            return None;
        }

        self.set(block_id);
        log::debug!("alloc block {block_id}");
        Some(block_id as u32)
    }

    /// 释放一个由 [`FreeMap::alloc`] 分配或挂载时登记过的块
    pub fn dealloc(&mut self, block_id: u32) {
        let block_id = block_id as usize;
        let (group_index, ingroup_index) = (block_id / 64, block_id % 64);

        // 编号一定得有对应的位
        assert_ne!(
            self.groups[group_index] & (1 << ingroup_index),
            0,
            "double free of block {block_id}"
        );

        self.groups[group_index] &= !(1 << ingroup_index);
        self.free_blocks += 1;
        log::debug!("free block {block_id}");
    }

    /// 越界的块号视为非空闲
    pub fn is_free(&self, block_id: u32) -> bool {
        let block_id = block_id as usize;
        block_id < self.total_blocks && self.groups[block_id / 64] & (1 << (block_id % 64)) == 0
    }

    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.free_blocks
    }

    #[inline]
    pub fn total_blocks(&self) -> usize {
        self.total_blocks
    }
}

impl FreeMap {
    fn set(&mut self, block_id: usize) {
        self.groups[block_id / 64] |= 1 << (block_id % 64);
        self.free_blocks -= 1;
    }

    /// 挂载时登记 inode 引用的块
    fn claim(&mut self, super_block: &SuperBlock, slot: u32, block_id: u32) -> Result<()> {
        super_block.check_pointer(slot, block_id).inspect_err(|_| {
            log::warn!("inode {slot} points at block {block_id} outside the data area")
        })?;
        if !self.is_free(block_id) {
            log::warn!("inode {slot} points at block {block_id} which is already in use");
            return Err(FsError::BlockCrossLinked {
                slot,
                block: block_id,
            });
        }

        self.set(block_id as usize);
        Ok(())
    }
}
