//! inode 记录
//!
//! 每条记录 32 字节，一个 inode 块连续存放 [`INODES_PER_BLOCK`](crate::INODES_PER_BLOCK) 条：
//!
//! | 偏移 | 字段 | 类型 |
//! |---|---|---|
//! | 0 | valid | u32 |
//! | 4 | size | u32 |
//! | 8 | created_at | i64 |
//! | 16 | direct | [u32; 3] |
//! | 28 | indirect | u32 |
//!
//! 块编号 0 表示“未使用”，因为 0 号块永远是超级块。

use super::{get_i64, get_u32, put_i64, put_u32};
use crate::{DataBlock, POINTERS_PER_INODE};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiskInode {
    pub valid: bool,
    /// 文件字节数
    pub size: u32,
    /// 创建时间（Unix 秒）
    pub created_at: i64,
    /// 直接索引
    pub direct: [u32; POINTERS_PER_INODE],
    /// 指向一个间接索引块
    pub indirect: u32,
}

impl DiskInode {
    pub const SIZE: usize = 32;

    /// 把一条无效记录初始化为空文件
    #[inline]
    pub fn init(&mut self, created_at: i64) {
        *self = Self {
            valid: true,
            created_at,
            ..Default::default()
        }
    }

    /// 回到无效状态：所有指针与大小清零
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// 解码块内第 `index` 条记录
    pub fn decode(block: &DataBlock, index: usize) -> Self {
        let record = &block[Self::range(index)];
        let mut direct = [0; POINTERS_PER_INODE];
        for (i, ptr) in direct.iter_mut().enumerate() {
            *ptr = get_u32(record, 16 + 4 * i);
        }

        Self {
            valid: get_u32(record, 0) != 0,
            size: get_u32(record, 4),
            created_at: get_i64(record, 8),
            direct,
            indirect: get_u32(record, 28),
        }
    }

    /// 编码进块内第 `index` 条记录，块内其余记录保持不变
    pub fn encode(&self, block: &mut DataBlock, index: usize) {
        let record = &mut block[Self::range(index)];
        put_u32(record, 0, self.valid as u32);
        put_u32(record, 4, self.size);
        put_i64(record, 8, self.created_at);
        for (i, &ptr) in self.direct.iter().enumerate() {
            put_u32(record, 16 + 4 * i, ptr);
        }
        put_u32(record, 28, self.indirect);
    }

    #[inline]
    fn range(index: usize) -> core::ops::Range<usize> {
        let start = index * Self::SIZE;
        start..start + Self::SIZE
    }
}
