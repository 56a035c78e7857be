//! 文件分配表(Mini-FAT)
//!
//! 每个簇对应一个`i32`：`0`空闲，`-1`链尾，`k > 0`下一个簇。
//! 整张表常驻内存，持久化于#1 ~ #4簇；每次结构性修改后都要[`FatTable::persist`]。

use block_dev::BlockDevice;

use crate::codec::{self, chunk};
use crate::config::{CLUSTER_COUNT, CLUSTER_SIZE, DATA_START, FAT_BLOCKS, FAT_START, SUPER_BLOCK};
use crate::{ClusterError, ClusterId, Error, FatEntry, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatTable {
    table: Box<[i32]>,
}

impl Default for FatTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FatTable {
    /// 新磁盘的分配表
    pub fn new() -> Self {
        let mut fat = Self {
            table: vec![FatEntry::FREE; CLUSTER_COUNT].into_boxed_slice(),
        };
        fat.initialize();
        fat
    }

    /// 超级块与FAT区自身的簇标记为占用，FAT区链成一条保留链，其余皆空闲。
    pub fn initialize(&mut self) {
        self.table.fill(FatEntry::FREE);
        self.table[SUPER_BLOCK] = FatEntry::EOF;
        let last = FAT_START + FAT_BLOCKS - 1;
        for i in FAT_START..last {
            self.table[i] = (i + 1) as i32;
        }
        self.table[last] = FatEntry::EOF;
    }

    pub fn load(dev: &dyn BlockDevice) -> Result<Self> {
        let mut bytes = vec![0; FAT_BLOCKS * CLUSTER_SIZE];
        for (i, buf) in bytes.chunks_exact_mut(CLUSTER_SIZE).enumerate() {
            dev.read_block(FAT_START + i, buf)?;
        }
        let table = codec::decode_i32_array(&bytes);
        debug_assert_eq!(CLUSTER_COUNT, table.len());

        let fat = Self {
            table: table.into_boxed_slice(),
        };
        if (0..DATA_START).any(|i| fat.table[i] == FatEntry::FREE) {
            return Err(Error::Corrupt(
                "reserved clusters are marked free in the allocation table".into(),
            ));
        }
        log::debug!("Allocation table loaded, {} clusters free", fat.free_count());
        Ok(fat)
    }

    pub fn persist(&self, dev: &dyn BlockDevice) -> Result<()> {
        let bytes = codec::encode_i32_array(&self.table);
        for (i, block) in chunk(&bytes).iter().enumerate() {
            dev.write_block(FAT_START + i, block)?;
        }
        log::trace!("Allocation table persisted");
        Ok(())
    }

    /// 线性扫描首个空闲簇，不会将其标记为占用。
    pub fn allocate(&self) -> Result<ClusterId> {
        self.table[DATA_START..]
            .iter()
            .position(|&raw| raw == FatEntry::FREE)
            .map(|i| ClusterId::new((DATA_START + i) as u32))
            .ok_or(Error::NoSpace)
    }

    /// 调用者须已将`id`从簇链上摘下
    pub fn free(&mut self, id: ClusterId) -> Result<()> {
        let id = id.validate()?;
        self.table[id.index()] = FatEntry::FREE;
        Ok(())
    }

    pub fn set_next(&mut self, id: ClusterId, next: FatEntry) -> Result<()> {
        let id = id.validate()?;
        if let FatEntry::Next(next) = next {
            next.validate()?;
        }
        self.table[id.index()] = next.to_raw();
        Ok(())
    }

    pub fn next(&self, id: ClusterId) -> Result<FatEntry> {
        if !id.in_range() {
            return Err(ClusterError::OutOfRange(id.into()).into());
        }
        Ok(FatEntry::from_raw(self.table[id.index()])?)
    }

    pub fn raw(&self) -> &[i32] {
        &self.table
    }

    pub fn free_count(&self) -> usize {
        self.table
            .iter()
            .filter(|&&raw| raw == FatEntry::FREE)
            .count()
    }

    pub const fn total_count(&self) -> usize {
        CLUSTER_COUNT
    }

    pub const fn cluster_size(&self) -> usize {
        CLUSTER_SIZE
    }

    /// 从`start`出发收集整条簇链。
    ///
    /// 链上不得出现保留簇、空闲簇或重复的簇。
    pub fn chain(&self, start: ClusterId) -> Result<Vec<ClusterId>> {
        let mut visited = vec![false; CLUSTER_COUNT];
        let mut chain = Vec::new();
        let mut id = start.validate()?;
        loop {
            if visited[id.index()] {
                return Err(ClusterError::Cycle(id).into());
            }
            visited[id.index()] = true;
            chain.push(id);

            match self.next(id)? {
                FatEntry::Eof => break,
                FatEntry::Free => return Err(ClusterError::Free(id).into()),
                FatEntry::Next(next) => id = next.validate()?,
            }
        }
        log::trace!("chain from {start}: {chain:?}");
        Ok(chain)
    }

    /// 释放整条簇链，返回释放的簇数
    pub fn release(&mut self, start: ClusterId) -> Result<usize> {
        let chain = self.chain(start)?;
        for &id in &chain {
            self.free(id)?;
        }
        log::debug!("Released {} clusters starting at {start}", chain.len());
        Ok(chain.len())
    }

    /// 分配`n`个簇并链接成一条新链，返回各簇编号。
    ///
    /// 空闲簇不足时直接返回[`Error::NoSpace`]，不改动任何槽位。
    pub fn allocate_chain(&mut self, n: usize) -> Result<Vec<ClusterId>> {
        if n > self.free_count() {
            return Err(Error::NoSpace);
        }

        let mut chain: Vec<ClusterId> = Vec::with_capacity(n);
        for _ in 0..n {
            let id = self.allocate()?;
            self.set_next(id, FatEntry::Eof)?;
            if let Some(&prev) = chain.last() {
                self.set_next(prev, FatEntry::Next(id))?;
            }
            chain.push(id);
        }
        log::debug!("Allocated chain {chain:?}");
        Ok(chain)
    }
}
