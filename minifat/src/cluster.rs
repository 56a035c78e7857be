use derive_more::{Display, From, Into};
use thiserror::Error;

use crate::config::{CLUSTER_COUNT, DATA_START};

/// 簇编号，即块设备上的块号
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[repr(transparent)]
pub struct ClusterId(u32);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClusterError {
    #[error("cluster {0} is outside the address space")]
    OutOfRange(u32),
    #[error("cluster {0} is reserved")]
    Reserved(ClusterId),
    #[error("cluster chain runs into free cluster {0}")]
    Free(ClusterId),
    #[error("cluster chain loops back to cluster {0}")]
    Cycle(ClusterId),
    #[error("allocation table holds invalid value {0}")]
    InvalidEntry(i32),
}

impl From<ClusterId> for usize {
    fn from(id: ClusterId) -> Self {
        id.0 as usize
    }
}

impl ClusterId {
    /// 超级块
    pub const SUPER_BLOCK: Self = Self(0);

    /// 最小的可用簇号
    pub const MIN: Self = Self(DATA_START as u32);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 超级块与FAT区所在的簇，永不分配
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::MIN.0
    }

    pub const fn in_range(self) -> bool {
        (self.0 as usize) < CLUSTER_COUNT
    }

    /// 校验此编号能否作为用户簇链的一环
    pub fn validate(self) -> Result<Self, ClusterError> {
        if !self.in_range() {
            Err(ClusterError::OutOfRange(self.0))
        } else if self.is_reserved() {
            Err(ClusterError::Reserved(self))
        } else {
            Ok(self)
        }
    }

    /// 目录项中的首簇字段，`0`表示不占有簇链
    pub fn from_first_cluster(raw: i32) -> Result<Option<Self>, ClusterError> {
        match raw {
            0 => Ok(None),
            raw if raw < 0 => Err(ClusterError::InvalidEntry(raw)),
            raw => Self(raw as u32).validate().map(Some),
        }
    }
}

/// 分配表中一个槽位的三态语义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    /// `0`
    Free,
    /// `-1`，簇链的最后一环
    Eof,
    /// `k > 0`，簇链中的下一个簇
    Next(ClusterId),
}

impl FatEntry {
    pub const FREE: i32 = 0;
    pub const EOF: i32 = -1;

    pub fn from_raw(raw: i32) -> Result<Self, ClusterError> {
        match raw {
            Self::FREE => Ok(Self::Free),
            Self::EOF => Ok(Self::Eof),
            raw if raw > 0 && (raw as usize) < CLUSTER_COUNT => {
                Ok(Self::Next(ClusterId(raw as u32)))
            }
            raw => Err(ClusterError::InvalidEntry(raw)),
        }
    }

    pub const fn to_raw(self) -> i32 {
        match self {
            Self::Free => Self::FREE,
            Self::Eof => Self::EOF,
            Self::Next(id) => id.0 as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fat_entry_semantics() {
        assert_eq!(FatEntry::Free, FatEntry::from_raw(0).unwrap());
        assert_eq!(FatEntry::Eof, FatEntry::from_raw(-1).unwrap());
        assert_eq!(
            FatEntry::Next(ClusterId::new(9)),
            FatEntry::from_raw(9).unwrap()
        );
        assert_eq!(
            Err(ClusterError::InvalidEntry(-2)),
            FatEntry::from_raw(-2)
        );
        assert_eq!(
            Err(ClusterError::InvalidEntry(1024)),
            FatEntry::from_raw(1024)
        );
        assert_eq!(42, FatEntry::Next(ClusterId::new(42)).to_raw());
    }

    #[test]
    fn first_cluster_field() {
        assert_eq!(Ok(None), ClusterId::from_first_cluster(0));
        assert_eq!(
            Ok(Some(ClusterId::new(5))),
            ClusterId::from_first_cluster(5)
        );
        assert_eq!(
            Err(ClusterError::Reserved(ClusterId::new(3))),
            ClusterId::from_first_cluster(3)
        );
        assert_eq!(
            Err(ClusterError::OutOfRange(4096)),
            ClusterId::from_first_cluster(4096)
        );
    }
}
