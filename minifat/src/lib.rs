//! 单文件虚拟磁盘上的迷你FAT文件系统。
//!
//! 自下而上：块设备([`block_dev`]) → 分配表([`FatTable`]) → 编解码([`codec`])
//! → 目录项([`EntryRecord`]) → 目录树([`Directory`]、[`File`])。

pub mod codec;
pub mod config;
pub mod path;
pub mod volume;

mod cluster;
mod control;
mod dir;
mod error;
mod file;
mod ops;

#[cfg(test)]
mod mem_disk;

pub use block_dev::{BLOCK_SIZE, Block, BlockDevice, BlockFile};

pub use self::{
    cluster::{ClusterError, ClusterId, FatEntry},
    control::FileSystem,
    dir::{Directory, Node},
    error::{Error, Result},
    file::File,
    volume::entry::{AttrFlag, EntryKind, EntryRecord, clean_name},
    volume::fat::FatTable,
};
