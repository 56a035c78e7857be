//! 卷的布局
//!
//! 超级块 | FAT区 | 数据区

pub mod entry;
pub mod fat;
pub mod super_block;

#[cfg(test)]
mod tests {
    use crate::codec;
    use crate::config::{CLUSTER_COUNT, CLUSTER_SIZE, ENTRY_SIZE, FAT_BLOCKS};
    use crate::volume::entry::EntryRecord;
    use crate::volume::fat::FatTable;

    #[test]
    fn volume() {
        let bytes = codec::encode_entry(&EntryRecord::TERMINATOR).unwrap();
        assert_eq!(ENTRY_SIZE, bytes.len());
        assert_eq!(
            FAT_BLOCKS * CLUSTER_SIZE,
            codec::encode_i32_array(FatTable::new().raw()).len()
        );
        assert_eq!(CLUSTER_COUNT, FatTable::new().raw().len());
    }
}
