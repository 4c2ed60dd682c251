//! # 卷层
//!
//! [`Volume`] 持有块设备、挂载状态以及空闲空间位图，所有文件操作都经过它。
//! 格式化前后、挂载前后的状态都显式地记在卷上，而非全局变量。

use alloc::sync::Arc;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::debug::DebugReport;
use crate::free_map::FreeMap;
use crate::inode_table::InodeTable;
use crate::layout::SuperBlock;
use crate::rw;
use crate::{DataBlock, FsError, Result, BLOCK_SIZE};

/// 时钟：返回当前 Unix 时间（秒），用于记录 inode 的创建时间
pub type Clock = fn() -> i64;

/// 多线程共享的卷，所有操作都在同一把锁内完成
pub type SharedVolume = Arc<Mutex<Volume>>;

pub struct Volume {
    block_device: Arc<dyn BlockDevice>,
    clock: Clock,
    /// 挂载后才存在
    mounted: Option<Mounted>,
}

/// 挂载期间的内存状态
#[derive(Debug)]
struct Mounted {
    super_block: SuperBlock,
    free_map: FreeMap,
}

impl Volume {
    pub fn new(block_device: Arc<dyn BlockDevice>, clock: Clock) -> Self {
        Self {
            block_device,
            clock,
            mounted: None,
        }
    }

    #[inline]
    pub fn into_shared(self) -> SharedVolume {
        Arc::new(Mutex::new(self))
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    #[inline]
    pub fn block_device(&self) -> &Arc<dyn BlockDevice> {
        &self.block_device
    }

    /// 格式化：清空除 0 号块外的所有块并写入超级块，原有数据全部丢失。
    /// 卷已挂载时拒绝执行。
    pub fn format(&mut self) -> Result<()> {
        if self.is_mounted() {
            return Err(FsError::AlreadyMounted);
        }

        let device_blocks = self.block_device.num_blocks();
        let total_blocks =
            u32::try_from(device_blocks).map_err(|_| FsError::DeviceTooLarge(device_blocks))?;
        let super_block = SuperBlock::new(total_blocks)?;
        if super_block.data_start() > total_blocks {
            return Err(FsError::DeviceTooSmall(device_blocks));
        }

        let mut block: DataBlock = [0; BLOCK_SIZE];
        for block_id in 1..device_blocks {
            self.block_device.write_block(block_id, &block);
        }
        super_block.encode(&mut block);
        self.block_device.write_block(0, &block);

        log::info!(
            "format: {} blocks, {} inode blocks, {} inodes",
            super_block.total_blocks,
            super_block.inode_blocks,
            super_block.inodes
        );
        Ok(())
    }

    /// 挂载：校验超级块并重建空闲空间位图。失败时卷保持未挂载。
    pub fn mount(&mut self) -> Result<()> {
        if self.is_mounted() {
            return Err(FsError::AlreadyMounted);
        }

        let super_block = self.read_super_block();
        let free_map = super_block
            .validate(self.block_device.num_blocks())
            .and_then(|()| FreeMap::rebuild(&super_block, &self.block_device))
            .inspect_err(|err| log::warn!("mount refused: {err}"))?;

        log::info!(
            "mount: {} inodes, {}/{} blocks free",
            super_block.inodes,
            free_map.free_blocks(),
            free_map.total_blocks()
        );
        self.mounted = Some(Mounted {
            super_block,
            free_map,
        });
        Ok(())
    }

    /// 卸载：丢弃内存中的位图
    pub fn unmount(&mut self) -> Result<()> {
        self.mounted.take().ok_or(FsError::NotMounted)?;
        log::info!("unmount");
        Ok(())
    }

    /// 打印用的卷信息，无需挂载
    pub fn debug(&self) -> Result<DebugReport> {
        let super_block = self.read_super_block();
        super_block.validate(self.block_device.num_blocks())?;
        Ok(DebugReport::collect(super_block, &self.block_device))
    }

    /// 创建空文件，返回槽位号
    pub fn create(&mut self) -> Result<u32> {
        let now = (self.clock)();
        self.table()?.create(now)
    }

    pub fn delete(&mut self, slot: u32) -> Result<()> {
        let Mounted {
            super_block,
            free_map,
        } = self.mounted.as_mut().ok_or(FsError::NotMounted)?;
        InodeTable::new(super_block, &self.block_device).delete(slot, free_map)
    }

    /// 文件字节数
    pub fn size(&self, slot: u32) -> Result<usize> {
        self.table()?.get(slot).map(|inode| inode.size as usize)
    }

    /// 从 `offset` 起读出至多 `buf.len()` 字节
    pub fn read(&self, slot: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        rw::read_at(&self.table()?, slot, offset, buf)
    }

    /// 从 `offset` 起写入 `buf`，返回实际写入的字节数
    pub fn write(&mut self, slot: u32, buf: &[u8], offset: usize) -> Result<usize> {
        let Mounted {
            super_block,
            free_map,
        } = self.mounted.as_mut().ok_or(FsError::NotMounted)?;
        let table = InodeTable::new(super_block, &self.block_device);
        rw::write_at(&table, free_map, slot, offset, buf)
    }

    pub fn free_blocks(&self) -> Result<usize> {
        self.mounted().map(|mounted| mounted.free_map.free_blocks())
    }

    pub fn is_block_free(&self, block_id: u32) -> Result<bool> {
        self.mounted().map(|mounted| mounted.free_map.is_free(block_id))
    }
}

impl Volume {
    fn mounted(&self) -> Result<&Mounted> {
        self.mounted.as_ref().ok_or(FsError::NotMounted)
    }

    fn table(&self) -> Result<InodeTable<'_>> {
        self.mounted()
            .map(|mounted| InodeTable::new(&mounted.super_block, &self.block_device))
    }

    fn read_super_block(&self) -> SuperBlock {
        let mut block: DataBlock = [0; BLOCK_SIZE];
        self.block_device.read_block(0, &mut block);
        SuperBlock::decode(&block)
    }
}
