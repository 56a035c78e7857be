use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use send_wrapper::SendWrapper;

use crate::{BLOCK_SIZE, BlockDevice};

/// 以宿主机文件为后端的块设备，块`i`位于字节偏移`i * BLOCK_SIZE`处。
///
/// 引擎是单线程的，[`SendWrapper`]只为满足[`BlockDevice`]的约束，
/// 跨线程访问会直接panic。
#[derive(Debug)]
pub struct BlockFile {
    inner: SendWrapper<RefCell<Option<File>>>,
}

impl BlockFile {
    pub fn new(fd: File) -> Self {
        Self {
            inner: SendWrapper::new(RefCell::new(Some(fd))),
        }
    }

    /// 以读写方式打开镜像，不存在时创建空文件。不会截断已有内容。
    pub fn open_or_create(path: impl AsRef<Path>) -> io::Result<Self> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self::new(fd))
    }

    fn with_file<R>(&self, f: impl FnOnce(&mut File) -> io::Result<R>) -> io::Result<R> {
        let mut file = self.inner.borrow_mut();
        match file.as_mut() {
            Some(file) => f(file),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "block file has been closed",
            )),
        }
    }
}

fn check_len(len: usize) -> io::Result<()> {
    if len == BLOCK_SIZE {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("expected a buffer of {BLOCK_SIZE} bytes, got {len}"),
        ))
    }
}

fn offset(block_id: usize) -> u64 {
    (block_id * BLOCK_SIZE) as u64
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> io::Result<()> {
        check_len(buf.len())?;
        self.with_file(|file| {
            file.seek(SeekFrom::Start(offset(block_id)))?;

            // 文件比块短时，缺失的尾部填0
            let mut filled = 0;
            while filled < buf.len() {
                match file.read(&mut buf[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
            buf[filled..].fill(0);
            Ok(())
        })
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> io::Result<()> {
        check_len(buf.len())?;
        self.with_file(|file| {
            // 越过文件末尾写入时，中间的空洞由文件系统以0填充
            file.seek(SeekFrom::Start(offset(block_id)))?;
            file.write_all(buf)?;
            file.flush()?;
            file.sync_data()
        })
    }

    fn is_new(&self) -> io::Result<bool> {
        self.with_file(|file| Ok(file.metadata()?.len() == 0))
    }

    fn close(&self) -> io::Result<()> {
        if let Some(file) = self.inner.borrow_mut().take() {
            file.sync_all()?;
        }
        Ok(())
    }
}
