//! # 块设备接口层
//!
//! 块设备以**块**为单位存储数据；[`BlockDevice`] 是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 虚拟磁盘只有一种驱动：[`BlockFile`]，即宿主机上的单个镜像文件。

mod block_file;

use std::io;

pub use self::block_file::BlockFile;

/// 块的字节数，同时也是簇的字节数
pub const BLOCK_SIZE: usize = 1024;

pub type Block = [u8; BLOCK_SIZE];

/// 块设备驱动特质
///
/// 所有的读写都以整块为单位，`buf`的长度必须为[`BLOCK_SIZE`]。
pub trait BlockDevice: Send + Sync {
    /// 读取`block_id`号块。超出设备末尾的部分以0填充。
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> io::Result<()>;

    /// 写入`block_id`号块，必要时以0延展设备，返回前会落盘。
    fn write_block(&self, block_id: usize, buf: &[u8]) -> io::Result<()>;

    /// 设备是否为空（零字节），用于决定格式化还是加载
    fn is_new(&self) -> io::Result<bool>;

    /// 释放底层句柄，可重复调用
    fn close(&self) -> io::Result<()>;
}
