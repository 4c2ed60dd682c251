#![no_std]

extern crate alloc;

/* simple-fs 的整体架构，自上而下 */

// 卷层：格式化、挂载以及面向使用者的全部文件操作
mod volume;
pub use volume::{Clock, SharedVolume, Volume};

// 读写引擎：按字节区间读写文件
mod rw;

// 地址解析层：逻辑块索引 -> 物理块号
mod resolver;

// inode 表：inode 的创建、删除与读写
mod inode_table;

// 空闲空间分配器：挂载时重建的内存位图
mod free_map;

// 调试输出
mod debug;
pub use debug::{DebugReport, InodeReport};

// 磁盘数据结构层：表示磁盘文件系统的数据结构
pub mod layout;

mod error;
pub use error::{FsError, Result};

pub use block_dev::BlockDevice;

/// 格式签名
pub const MAGIC: u32 = 0x3034_1003;
pub const BLOCK_SIZE: usize = 4096;
/// 每个 inode 块容纳的 inode 个数
pub const INODES_PER_BLOCK: usize = 128;
/// 每个 inode 的直接索引个数
pub const POINTERS_PER_INODE: usize = 3;
/// 间接索引块的编号容量
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;
/// 单个文件最多占用的数据块数
pub const MAX_FILE_BLOCKS: usize = POINTERS_PER_INODE + POINTERS_PER_BLOCK;
/// 单个文件的最大字节数
pub const MAX_FILE_SIZE: usize = MAX_FILE_BLOCKS * BLOCK_SIZE;

/// 一整块的原始字节
pub type DataBlock = [u8; BLOCK_SIZE];
