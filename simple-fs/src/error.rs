use derive_more::Display;

pub type Result<T> = core::result::Result<T, FsError>;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /* 布局错误：挂载被拒绝 */
    #[display(fmt = "bad magic number {:#010x}", _0)]
    BadMagic(u32),
    #[display(fmt = "superblock records {} blocks but device has {}", recorded, device)]
    BlockCountMismatch { recorded: u32, device: usize },
    #[display(fmt = "superblock records {} inode blocks, expected {}", recorded, expected)]
    InodeBlocksMismatch { recorded: u32, expected: u32 },
    #[display(fmt = "superblock records {} inodes, expected {}", recorded, expected)]
    InodeCountMismatch { recorded: u32, expected: u32 },
    #[display(fmt = "device of {} blocks cannot hold a volume", _0)]
    DeviceTooSmall(usize),
    #[display(fmt = "device of {} blocks exceeds the 32-bit block numbers", _0)]
    DeviceTooLarge(usize),

    /* 状态错误 */
    #[display(fmt = "a volume is already mounted")]
    AlreadyMounted,
    #[display(fmt = "no volume is mounted")]
    NotMounted,

    /* 容量错误 */
    #[display(fmt = "inode table is full")]
    InodeTableFull,
    #[display(fmt = "no free data block left")]
    NoSpace,
    #[display(fmt = "file cannot grow past its indirect block")]
    FileTooLarge,

    /* 句柄错误 */
    #[display(fmt = "inode {} is not a valid file", _0)]
    InvalidInode(u32),
    #[display(fmt = "offset {} is past the end of file ({} bytes)", offset, size)]
    OffsetBeyondEnd { offset: usize, size: usize },

    /* 一致性错误：磁盘上的指针已损坏 */
    #[display(fmt = "inode {} points at block {} outside the data area", slot, block)]
    BlockOutOfRange { slot: u32, block: u32 },
    #[display(fmt = "inode {} points at block {} already owned by another file", slot, block)]
    BlockCrossLinked { slot: u32, block: u32 },
}

impl FsError {
    /// 是否为磁盘损坏导致的错误
    #[inline]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::BlockOutOfRange { .. } | Self::BlockCrossLinked { .. }
        )
    }
}
