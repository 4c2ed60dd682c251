//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 块大小由文件系统与驱动双方约定，驱动只负责按块号搬运整块数据。

#![no_std]

extern crate alloc;

mod ram_disk;

pub use ram_disk::RamDisk;

/// 块设备驱动特质
///
/// 读写越界的块号属于调用者的逻辑错误，驱动可以直接 panic。
pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);
    /// 设备的总块数
    fn num_blocks(&self) -> usize;
}
