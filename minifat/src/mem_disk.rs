//! 内存中的块设备，仅供单元测试使用

use std::io;
use std::sync::Mutex;

use block_dev::{BLOCK_SIZE, BlockDevice};

#[derive(Debug, Default)]
pub struct MemDisk {
    data: Mutex<Vec<u8>>,
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> io::Result<()> {
        let data = self.data.lock().unwrap();
        let start = (block_id * BLOCK_SIZE).min(data.len());
        let end = (start + BLOCK_SIZE).min(data.len());
        buf.fill(0);
        buf[..end - start].copy_from_slice(&data[start..end]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> io::Result<()> {
        let mut data = self.data.lock().unwrap();
        let start = block_id * BLOCK_SIZE;
        if data.len() < start + BLOCK_SIZE {
            data.resize(start + BLOCK_SIZE, 0);
        }
        data[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn is_new(&self) -> io::Result<bool> {
        Ok(self.data.lock().unwrap().is_empty())
    }

    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}
