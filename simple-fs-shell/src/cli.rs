use clap::Parser;
use std::path::PathBuf;

/// Interactive shell over a SimpleFS volume
#[derive(Parser)]
pub struct Cli {
    /// Number of blocks on the disk
    pub blocks: usize,

    /// Disk image file, created or resized to fit; an in-memory disk is used when omitted
    #[arg(long, short)]
    pub image: Option<PathBuf>,
}
