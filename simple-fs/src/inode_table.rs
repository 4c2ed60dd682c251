//! # inode 表
//!
//! 每次访问都直接读写块设备，不做缓存。

use alloc::sync::Arc;
use alloc::vec::Vec;

use block_dev::BlockDevice;

use crate::free_map::FreeMap;
use crate::layout::{DiskInode, IndirectBlock, SuperBlock};
use crate::{DataBlock, FsError, Result};
use crate::{BLOCK_SIZE, INODES_PER_BLOCK};

pub struct InodeTable<'a> {
    super_block: &'a SuperBlock,
    block_device: &'a Arc<dyn BlockDevice>,
}

impl<'a> InodeTable<'a> {
    #[inline]
    pub fn new(super_block: &'a SuperBlock, block_device: &'a Arc<dyn BlockDevice>) -> Self {
        Self {
            super_block,
            block_device,
        }
    }

    #[inline]
    pub fn super_block(&self) -> &'a SuperBlock {
        self.super_block
    }

    #[inline]
    pub fn block_device(&self) -> &'a Arc<dyn BlockDevice> {
        self.block_device
    }

    /// 读取槽位上的记录，无论是否有效
    pub fn load(&self, slot: u32) -> Result<DiskInode> {
        let (block_id, index) = self.pos(slot)?;
        let mut block: DataBlock = [0; BLOCK_SIZE];
        self.block_device.read_block(block_id, &mut block);
        Ok(DiskInode::decode(&block, index))
    }

    /// 读取有效的 inode
    pub fn get(&self, slot: u32) -> Result<DiskInode> {
        let inode = self.load(slot)?;
        if inode.valid {
            Ok(inode)
        } else {
            Err(FsError::InvalidInode(slot))
        }
    }

    /// 写回一条记录，同块的其它记录保持不变
    pub fn store(&self, slot: u32, inode: &DiskInode) -> Result<()> {
        let (block_id, index) = self.pos(slot)?;
        let mut block: DataBlock = [0; BLOCK_SIZE];
        self.block_device.read_block(block_id, &mut block);
        inode.encode(&mut block, index);
        self.block_device.write_block(block_id, &block);
        Ok(())
    }

    /// 按槽位号顺序寻找第一个无效 inode，初始化为空文件并返回其槽位号
    pub fn create(&self, created_at: i64) -> Result<u32> {
        let mut block: DataBlock = [0; BLOCK_SIZE];

        for block_index in 0..self.super_block.inode_blocks as usize {
            let block_id = 1 + block_index;
            self.block_device.read_block(block_id, &mut block);

            let Some(index) =
                (0..INODES_PER_BLOCK).find(|&index| !DiskInode::decode(&block, index).valid)
            else {
                continue;
            };

            let mut inode = DiskInode::default();
            inode.init(created_at);
            inode.encode(&mut block, index);
            self.block_device.write_block(block_id, &block);

            let slot = (block_index * INODES_PER_BLOCK + index + 1) as u32;
            log::debug!("create inode {slot}");
            return Ok(slot);
        }

        Err(FsError::InodeTableFull)
    }

    /// 删除文件：释放它引用的全部块（含间接索引块本身），并把记录清零。
    ///
    /// 任何指针越界时不做修改，直接报错。
    pub fn delete(&self, slot: u32, free_map: &mut FreeMap) -> Result<()> {
        let mut inode = self.get(slot)?;

        let mut blocks: Vec<u32> = inode.direct.iter().copied().filter(|&ptr| ptr != 0).collect();
        if inode.indirect != 0 {
            let indirect = self.super_block.check_pointer(slot, inode.indirect)?;
            blocks.push(indirect);
            blocks.extend(IndirectBlock::load(self.block_device, indirect).used());
        }
        for &block_id in &blocks {
            self.super_block.check_pointer(slot, block_id)?;
        }

        inode.clear();
        self.store(slot, &inode)?;
        for block_id in blocks {
            free_map.dealloc(block_id);
        }

        log::debug!("delete inode {slot}");
        Ok(())
    }

    /// 按槽位号顺序遍历所有有效 inode，每个 inode 块只读一次
    pub fn valid_inodes(&self) -> impl Iterator<Item = (u32, DiskInode)> + use<'a> {
        let block_device = self.block_device;
        let inodes = self.super_block.inodes as usize;

        (0..self.super_block.inode_blocks as usize).flat_map(move |block_index| {
            let mut block: DataBlock = [0; BLOCK_SIZE];
            block_device.read_block(1 + block_index, &mut block);

            (0..INODES_PER_BLOCK).filter_map(move |index| {
                let slot = block_index * INODES_PER_BLOCK + index + 1;
                let inode = DiskInode::decode(&block, index);
                (slot <= inodes && inode.valid).then_some((slot as u32, inode))
            })
        })
    }
}

impl InodeTable<'_> {
    fn pos(&self, slot: u32) -> Result<(usize, usize)> {
        self.super_block
            .inode_pos(slot)
            .ok_or(FsError::InvalidInode(slot))
    }
}
