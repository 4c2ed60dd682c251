use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::BlockDevice;

/// 内存上的块设备，内容随进程消失
#[derive(Debug)]
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
    block_size: usize,
    num_blocks: usize,
}

impl RamDisk {
    pub fn new(block_size: usize, num_blocks: usize) -> Self {
        Self {
            data: Mutex::new(vec![0; block_size * num_blocks]),
            block_size,
            num_blocks,
        }
    }

    /// 块在整个存储区中的字节范围
    fn range(&self, block_id: usize) -> core::ops::Range<usize> {
        assert!(
            block_id < self.num_blocks,
            "block {block_id} out of range (device has {} blocks)",
            self.num_blocks
        );
        let start = block_id * self.block_size;
        start..start + self.block_size
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        assert_eq!(buf.len(), self.block_size, "not a complete block!");
        let range = self.range(block_id);
        buf.copy_from_slice(&self.data.lock()[range]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        assert_eq!(buf.len(), self.block_size, "not a complete block!");
        let range = self.range(block_id);
        self.data.lock()[range].copy_from_slice(buf);
    }

    #[inline]
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }
}
