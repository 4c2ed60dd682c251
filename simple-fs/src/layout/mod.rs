//! # 磁盘数据结构层
//!
//! simple-fs 的磁盘布局：
//! 超级块 | inode 表 | 数据块区域
//!
//! inode 表占据总块数的十分之一（向上取整）；数据块区域里的数据块与间接索引块
//! 在磁盘上没有区别，只有被 inode 引用时才有意义。
//!
//! 所有结构都以小端序编码进整块缓冲区，读出时再解码，不在原地重新解释内存。

mod super_block;
pub use super_block::SuperBlock;

mod inode;
pub use inode::DiskInode;

mod indirect;
pub use indirect::IndirectBlock;

/// 从缓冲区的 `offset` 处取出定长字段
#[inline]
fn field<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut raw = [0; N];
    raw.copy_from_slice(&bytes[offset..offset + N]);
    raw
}

#[inline]
fn get_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(field(bytes, offset))
}

#[inline]
fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn get_i64(bytes: &[u8], offset: usize) -> i64 {
    i64::from_le_bytes(field(bytes, offset))
}

#[inline]
fn put_i64(bytes: &mut [u8], offset: usize, value: i64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}
