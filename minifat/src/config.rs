//! 磁盘布局常量
//!
//! 超级块(#0) | FAT区(#1 ~ #4) | 数据区(#5 ~ #1023)

pub use block_dev::BLOCK_SIZE as CLUSTER_SIZE;

/// 簇地址空间，固定为1024个簇
pub const CLUSTER_COUNT: usize = 1024;

/// 超级块所在的簇
pub const SUPER_BLOCK: usize = 0;
/// FAT区的首个簇
pub const FAT_START: usize = 1;
/// FAT区占用的簇数：1024条`i32`恰好4个簇
pub const FAT_BLOCKS: usize = 4;
/// 首个可分配给用户的簇
pub const DATA_START: usize = FAT_START + FAT_BLOCKS;

/// 目录项的字节数
pub const ENTRY_SIZE: usize = 32;

/// 新磁盘的默认盘符
pub const DEFAULT_DRIVE: char = 'C';

const _: () = assert!(FAT_BLOCKS * CLUSTER_SIZE == CLUSTER_COUNT * size_of::<i32>());
