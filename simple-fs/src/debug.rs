//! 调试输出：超级块概况与每个有效 inode 的元数据、指针

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use block_dev::BlockDevice;

use crate::inode_table::InodeTable;
use crate::layout::{IndirectBlock, SuperBlock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugReport {
    pub super_block: SuperBlock,
    pub inodes: Vec<InodeReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeReport {
    pub slot: u32,
    pub size: u32,
    pub created_at: i64,
    /// 非零的直接索引
    pub direct: Vec<u32>,
    pub indirect: Option<u32>,
    /// 间接索引块里的非零编号；索引块越界时为空
    pub indirect_data: Vec<u32>,
}

impl DebugReport {
    pub(crate) fn collect(super_block: SuperBlock, block_device: &Arc<dyn BlockDevice>) -> Self {
        let inodes = InodeTable::new(&super_block, block_device)
            .valid_inodes()
            .map(|(slot, inode)| {
                let indirect = (inode.indirect != 0).then_some(inode.indirect);
                let indirect_data = indirect
                    .filter(|&block_id| super_block.is_data_block(block_id))
                    .map(|block_id| IndirectBlock::load(block_device, block_id).used().collect())
                    .unwrap_or_default();

                InodeReport {
                    slot,
                    size: inode.size,
                    created_at: inode.created_at,
                    direct: inode.direct.iter().copied().filter(|&ptr| ptr != 0).collect(),
                    indirect,
                    indirect_data,
                }
            })
            .collect();

        Self {
            super_block,
            inodes,
        }
    }
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sb = &self.super_block;
        writeln!(f, "superblock:")?;
        writeln!(f, "    magic number is valid")?;
        writeln!(f, "    {} blocks", sb.total_blocks)?;
        writeln!(f, "    {} inode blocks", sb.inode_blocks)?;
        write!(f, "    {} inodes", sb.inodes)?;

        for inode in &self.inodes {
            writeln!(f)?;
            write!(f, "{inode}")?;
        }
        Ok(())
    }
}

impl fmt::Display for InodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "inode {}:", self.slot)?;
        writeln!(f, "    size: {} bytes", self.size)?;
        write!(f, "    created: {} (unix seconds)", self.created_at)?;
        if !self.direct.is_empty() {
            write!(f, "\n    direct blocks:")?;
            for block_id in &self.direct {
                write!(f, " {block_id}")?;
            }
        }
        if let Some(indirect) = self.indirect {
            write!(f, "\n    indirect block: {indirect}")?;
            write!(f, "\n    indirect data blocks:")?;
            for block_id in &self.indirect_data {
                write!(f, " {block_id}")?;
            }
        }
        Ok(())
    }
}
