use super::{get_u32, put_u32};
use crate::{DataBlock, FsError, Result};
use crate::{INODES_PER_BLOCK, MAGIC};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录 inode 表的大小
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub total_blocks: u32,
    /// inode 表占据块数
    pub inode_blocks: u32,
    /// inode 总数
    pub inodes: u32,
}

impl SuperBlock {
    /// 按设备块数规划出新卷的超级块。
    /// inode 总数超出 32 位时拒绝。
    pub fn new(total_blocks: u32) -> Result<Self> {
        let inode_blocks = Self::inode_blocks_for(total_blocks);
        let inodes = Self::inodes_for(inode_blocks)
            .ok_or(FsError::DeviceTooLarge(total_blocks as usize))?;
        Ok(Self {
            magic: MAGIC,
            total_blocks,
            inode_blocks,
            inodes,
        })
    }

    /// inode 表占总块数的 10%，向上取整
    #[inline]
    pub fn inode_blocks_for(total_blocks: u32) -> u32 {
        total_blocks.div_ceil(10)
    }

    #[inline]
    fn inodes_for(inode_blocks: u32) -> Option<u32> {
        inode_blocks.checked_mul(INODES_PER_BLOCK as u32)
    }

    pub fn decode(block: &DataBlock) -> Self {
        Self {
            magic: get_u32(block, 0),
            total_blocks: get_u32(block, 4),
            inode_blocks: get_u32(block, 8),
            inodes: get_u32(block, 12),
        }
    }

    pub fn encode(&self, block: &mut DataBlock) {
        put_u32(block, 0, self.magic);
        put_u32(block, 4, self.total_blocks);
        put_u32(block, 8, self.inode_blocks);
        put_u32(block, 12, self.inodes);
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 挂载前的校验，`device_blocks` 是设备实际的块数
    pub fn validate(&self, device_blocks: usize) -> Result<()> {
        if !self.is_valid() {
            return Err(FsError::BadMagic(self.magic));
        }
        if self.total_blocks as usize != device_blocks {
            return Err(FsError::BlockCountMismatch {
                recorded: self.total_blocks,
                device: device_blocks,
            });
        }

        let expected = Self::inode_blocks_for(self.total_blocks);
        if self.inode_blocks != expected {
            return Err(FsError::InodeBlocksMismatch {
                recorded: self.inode_blocks,
                expected,
            });
        }
        if self.data_start() > self.total_blocks {
            return Err(FsError::DeviceTooSmall(device_blocks));
        }

        let expected =
            Self::inodes_for(self.inode_blocks).ok_or(FsError::DeviceTooLarge(device_blocks))?;
        if self.inodes != expected {
            return Err(FsError::InodeCountMismatch {
                recorded: self.inodes,
                expected,
            });
        }

        Ok(())
    }

    /// 首个数据块的块号
    #[inline]
    pub fn data_start(&self) -> u32 {
        1 + self.inode_blocks
    }

    /// 块号是否落在数据块区域
    #[inline]
    pub fn is_data_block(&self, block_id: u32) -> bool {
        (self.data_start()..self.total_blocks).contains(&block_id)
    }

    /// 校验 `slot` 号 inode 里的块指针
    pub fn check_pointer(&self, slot: u32, block_id: u32) -> Result<u32> {
        if self.is_data_block(block_id) {
            Ok(block_id)
        } else {
            Err(FsError::BlockOutOfRange {
                slot,
                block: block_id,
            })
        }
    }

    /// 通过槽位号获取 inode 在磁盘上的位置：**块ID**以及**块内序号**。
    /// 槽位号从 1 开始编号。
    pub fn inode_pos(&self, slot: u32) -> Option<(usize, usize)> {
        if slot == 0 || slot > self.inodes {
            return None;
        }

        let index = (slot - 1) as usize;
        Some((1 + index / INODES_PER_BLOCK, index % INODES_PER_BLOCK))
    }
}
