mod common;

use std::sync::Arc;

use block_dev::BlockDevice;
use common::{clock, mounted, ram_disk};
use simple_fs::layout::{DiskInode, SuperBlock};
use simple_fs::{FsError, Volume, BLOCK_SIZE, INODES_PER_BLOCK};

#[test]
fn format_sizes_inode_table() {
    for (blocks, inode_blocks) in [(100, 10), (101, 11), (20, 2), (2, 1)] {
        let mut volume = Volume::new(ram_disk(blocks), clock);
        volume.format().unwrap();

        let sb = volume.debug().unwrap().super_block;
        assert_eq!(sb.total_blocks, blocks as u32);
        assert_eq!(sb.inode_blocks, inode_blocks);
        assert_eq!(sb.inodes, inode_blocks * INODES_PER_BLOCK as u32);
    }
}

#[test]
fn format_rejects_tiny_device() {
    let mut volume = Volume::new(ram_disk(1), clock);
    assert_eq!(volume.format(), Err(FsError::DeviceTooSmall(1)));
}

/// 只报告块数的设备，任何读写都说明格式化没有提前失败
struct Oversized(usize);

impl BlockDevice for Oversized {
    fn read_block(&self, block_id: usize, _buf: &mut [u8]) {
        panic!("unexpected read of block {block_id}");
    }

    fn write_block(&self, block_id: usize, _buf: &[u8]) {
        panic!("unexpected write of block {block_id}");
    }

    fn num_blocks(&self) -> usize {
        self.0
    }
}

#[test]
fn format_rejects_huge_device() {
    // inode 总数超出 u32
    let mut volume = Volume::new(Arc::new(Oversized(400_000_000)), clock);
    assert_eq!(volume.format(), Err(FsError::DeviceTooLarge(400_000_000)));

    // 块号本身超出 u32
    let blocks = u32::MAX as usize + 1;
    let mut volume = Volume::new(Arc::new(Oversized(blocks)), clock);
    assert_eq!(volume.format(), Err(FsError::DeviceTooLarge(blocks)));
}

#[test]
fn format_refused_while_mounted() {
    let mut volume = mounted(100);
    let slot = volume.create().unwrap();
    volume.write(slot, b"keep me", 0).unwrap();

    assert_eq!(volume.format(), Err(FsError::AlreadyMounted));
    assert_eq!(volume.size(slot), Ok(7));
}

#[test]
fn format_after_unmount_destroys_data() {
    let mut volume = mounted(100);
    let slot = volume.create().unwrap();
    volume.write(slot, b"gone soon", 0).unwrap();

    volume.unmount().unwrap();
    volume.format().unwrap();
    volume.mount().unwrap();

    assert_eq!(volume.size(slot), Err(FsError::InvalidInode(slot)));
    assert_eq!(volume.free_blocks(), Ok(89));

    // 旧数据块也被清零
    let mut block = [0xaa; BLOCK_SIZE];
    volume.block_device().read_block(11, &mut block);
    assert_eq!(block, [0; BLOCK_SIZE]);
}

#[test]
fn mount_twice() {
    let mut volume = mounted(100);
    assert_eq!(volume.mount(), Err(FsError::AlreadyMounted));
    assert!(volume.is_mounted());
}

#[test]
fn mount_unformatted_device() {
    let mut volume = Volume::new(ram_disk(100), clock);
    assert_eq!(volume.mount(), Err(FsError::BadMagic(0)));
    assert!(!volume.is_mounted());
    assert_eq!(volume.create(), Err(FsError::NotMounted));
    assert_eq!(volume.debug(), Err(FsError::BadMagic(0)));
}

#[test]
fn mount_rejects_size_mismatch() {
    let dev = ram_disk(100);
    let mut block = [0; BLOCK_SIZE];
    SuperBlock::new(90).unwrap().encode(&mut block);
    dev.write_block(0, &block);

    let mut volume = Volume::new(dev, clock);
    assert_eq!(
        volume.mount(),
        Err(FsError::BlockCountMismatch {
            recorded: 90,
            device: 100
        })
    );
    assert!(!volume.is_mounted());
}

#[test]
fn mount_rejects_malformed_inode_area() {
    let dev = ram_disk(100);
    let mut block = [0; BLOCK_SIZE];
    SuperBlock::new(100).unwrap().encode(&mut block);
    // inode 块数改成 12
    block[8..12].copy_from_slice(&12u32.to_le_bytes());
    dev.write_block(0, &block);

    let mut volume = Volume::new(dev.clone(), clock);
    assert_eq!(
        volume.mount(),
        Err(FsError::InodeBlocksMismatch {
            recorded: 12,
            expected: 10
        })
    );

    SuperBlock::new(100).unwrap().encode(&mut block);
    block[12..16].copy_from_slice(&1000u32.to_le_bytes());
    dev.write_block(0, &block);
    assert_eq!(
        volume.mount(),
        Err(FsError::InodeCountMismatch {
            recorded: 1000,
            expected: 1280
        })
    );
    assert!(!volume.is_mounted());
}

#[test]
fn unmount_then_mount_again() {
    let mut volume = mounted(100);
    let slot = volume.create().unwrap();
    volume.write(slot, &[1; 3 * BLOCK_SIZE], 0).unwrap();
    let free = volume.free_blocks().unwrap();

    volume.unmount().unwrap();
    assert_eq!(volume.unmount(), Err(FsError::NotMounted));
    assert_eq!(volume.size(slot), Err(FsError::NotMounted));

    volume.mount().unwrap();
    assert_eq!(volume.free_blocks(), Ok(free));
    assert_eq!(volume.size(slot), Ok(3 * BLOCK_SIZE));
}

#[test]
fn mount_detects_cross_linked_blocks() {
    let mut volume = mounted(100);
    let first = volume.create().unwrap();
    let second = volume.create().unwrap();
    volume.write(first, b"first", 0).unwrap();
    volume.unmount().unwrap();

    // 第二个文件也指向第一个文件的数据块
    let dev = volume.block_device().clone();
    let mut block = [0; BLOCK_SIZE];
    dev.read_block(1, &mut block);
    let mut inode = DiskInode::decode(&block, 1);
    inode.direct[0] = DiskInode::decode(&block, 0).direct[0];
    inode.size = 5;
    inode.encode(&mut block, 1);
    dev.write_block(1, &block);

    let err = volume.mount().unwrap_err();
    assert_eq!(
        err,
        FsError::BlockCrossLinked {
            slot: second,
            block: 11
        }
    );
    assert!(err.is_corruption());
    assert!(!volume.is_mounted());
}

#[test]
fn mount_detects_pointer_outside_device() {
    let mut volume = mounted(100);
    let slot = volume.create().unwrap();
    volume.unmount().unwrap();

    let dev = volume.block_device().clone();
    let mut block = [0; BLOCK_SIZE];
    dev.read_block(1, &mut block);
    let mut inode = DiskInode::decode(&block, 0);
    inode.indirect = 4000;
    inode.encode(&mut block, 0);
    dev.write_block(1, &block);

    assert_eq!(
        volume.mount(),
        Err(FsError::BlockOutOfRange { slot, block: 4000 })
    );
}

#[test]
fn debug_report() {
    let mut volume = mounted(100);
    let first = volume.create().unwrap();
    let second = volume.create().unwrap();
    volume.write(first, &vec![7; 4 * BLOCK_SIZE + 1], 0).unwrap();
    volume.write(second, b"hello", 0).unwrap();
    volume.delete(first).unwrap();
    let third = volume.create().unwrap();
    assert_eq!(third, first);
    volume.write(third, &vec![9; 4 * BLOCK_SIZE], 0).unwrap();

    let report = volume.debug().unwrap();
    assert_eq!(report.inodes.len(), 2);

    let inode = &report.inodes[0];
    assert_eq!(inode.slot, third);
    assert_eq!(inode.size, 4 * BLOCK_SIZE as u32);
    assert_eq!(inode.created_at, common::NOW);
    assert_eq!(inode.direct.len(), 3);
    assert!(inode.indirect.is_some());
    assert_eq!(inode.indirect_data.len(), 1);

    let text = report.to_string();
    assert!(text.starts_with("superblock:\n    magic number is valid\n    100 blocks\n"));
    assert!(text.contains("    10 inode blocks\n    1280 inodes\n"));
    assert!(text.contains("inode 2:\n    size: 5 bytes\n"));
    assert!(text.contains("    created: 1700000000 (unix seconds)\n    direct blocks: 11 12 13\n"));
    assert!(text.contains("indirect data blocks:"));
}
