#![allow(dead_code)]

use std::sync::Arc;

use block_dev::{BlockDevice, RamDisk};
use simple_fs::{Volume, BLOCK_SIZE};

pub const NOW: i64 = 1_700_000_000;

pub fn clock() -> i64 {
    NOW
}

pub fn ram_disk(blocks: usize) -> Arc<dyn BlockDevice> {
    Arc::new(RamDisk::new(BLOCK_SIZE, blocks))
}

/// 格式化并挂载好的卷
pub fn mounted(blocks: usize) -> Volume {
    let mut volume = Volume::new(ram_disk(blocks), clock);
    volume.format().unwrap();
    volume.mount().unwrap();
    volume
}

/// 可辨认的测试数据，相邻块的内容互不相同
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
