//! 超级块，位于#0簇
//!
//! | 签名(`\0`结尾, 16字节) | 保留(16字节) | 根目录的目录项(32字节) | 0 ... |

use block_dev::BlockDevice;

use crate::codec;
use crate::config::{CLUSTER_SIZE, ENTRY_SIZE, SUPER_BLOCK};
use crate::{EntryRecord, Error, Result};

const SIGNATURE: &str = "MINIFAT";
const SIGNATURE_FIELD: usize = 16;
const ROOT_OFFSET: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    root: EntryRecord,
}

impl SuperBlock {
    /// 盘符为`drive`的新卷，根目录名形如`C:`
    pub fn new(drive: char) -> Result<Self> {
        if !drive.is_ascii_alphabetic() {
            return Err(Error::InvalidName);
        }
        let label = format!("{}:", drive.to_ascii_uppercase());
        Ok(Self {
            root: EntryRecord::new_dir(&label)?,
        })
    }

    pub fn root(&self) -> &EntryRecord {
        &self.root
    }

    pub fn set_root(&mut self, root: EntryRecord) {
        self.root = root;
    }

    /// 根目录名的首字母
    pub fn drive(&self) -> char {
        self.root.raw_name()[0] as char
    }

    pub fn load(dev: &dyn BlockDevice) -> Result<Self> {
        let mut block = [0; CLUSTER_SIZE];
        dev.read_block(SUPER_BLOCK, &mut block)?;

        let signature = codec::decode_string(&block[..SIGNATURE_FIELD])?;
        if signature != SIGNATURE {
            return Err(Error::Corrupt(format!(
                "bad super block signature {signature:?}"
            )));
        }

        let mut raw = [0; ENTRY_SIZE];
        raw.copy_from_slice(&block[ROOT_OFFSET..ROOT_OFFSET + ENTRY_SIZE]);
        let root = codec::decode_entry(&raw)?;
        if !root.is_dir() {
            return Err(Error::Corrupt("root entry is not a directory".into()));
        }
        Ok(Self { root })
    }

    pub fn persist(&self, dev: &dyn BlockDevice) -> Result<()> {
        let mut block = [0; CLUSTER_SIZE];
        let signature = codec::encode_string(SIGNATURE);
        block[..signature.len()].copy_from_slice(&signature);
        block[ROOT_OFFSET..ROOT_OFFSET + ENTRY_SIZE].copy_from_slice(&codec::encode_entry(&self.root)?);
        dev.write_block(SUPER_BLOCK, &block)?;
        Ok(())
    }
}
