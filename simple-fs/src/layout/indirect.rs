use alloc::sync::Arc;

use block_dev::BlockDevice;

use super::{get_u32, put_u32};
use crate::{DataBlock, BLOCK_SIZE, POINTERS_PER_BLOCK};

/// 间接索引块：整个块连续存储**块编号**，每个编号都指向一个**数据块**
#[derive(Clone, PartialEq, Eq)]
pub struct IndirectBlock([u32; POINTERS_PER_BLOCK]);

impl IndirectBlock {
    /// 全部编号为 0 的新索引块
    #[inline]
    pub const fn empty() -> Self {
        Self([0; POINTERS_PER_BLOCK])
    }

    pub fn load(block_device: &Arc<dyn BlockDevice>, block_id: u32) -> Self {
        let mut block: DataBlock = [0; BLOCK_SIZE];
        block_device.read_block(block_id as usize, &mut block);
        Self::decode(&block)
    }

    pub fn store(&self, block_device: &Arc<dyn BlockDevice>, block_id: u32) {
        let mut block: DataBlock = [0; BLOCK_SIZE];
        self.encode(&mut block);
        block_device.write_block(block_id as usize, &block);
    }

    pub fn decode(block: &DataBlock) -> Self {
        let mut pointers = [0; POINTERS_PER_BLOCK];
        for (i, ptr) in pointers.iter_mut().enumerate() {
            *ptr = get_u32(block, 4 * i);
        }
        Self(pointers)
    }

    pub fn encode(&self, block: &mut DataBlock) {
        for (i, &ptr) in self.0.iter().enumerate() {
            put_u32(block, 4 * i, ptr);
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> u32 {
        self.0[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, block_id: u32) {
        self.0[index] = block_id;
    }

    /// 所有非零编号
    pub fn used(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied().filter(|&ptr| ptr != 0)
    }
}

impl core::fmt::Debug for IndirectBlock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.used()).finish()
    }
}
