//! 目录项：描述一个文件或目录的32字节定长记录。
//!
//! | name[11] | attr[1] | reserved[12] | first_cluster[4] | size[4] |
//!
//! 整数均为小端序。文件名为8.3格式，以空格补齐；目录名占满11字节，不切分。

use binrw::binrw;
use enumflags2::{BitFlags, bitflags};

use crate::{ClusterId, Error, Result};

pub const NAME_LEN: usize = 11;
pub const BASE_LEN: usize = 8;
pub const EXT_LEN: usize = 3;

const INVALID_CHARS: &[char] = &['/', '\\', '*', '?', '"', '<', '>', '|'];

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRecord {
    name: [u8; NAME_LEN],

    /// 唯一的类型来源：含[`AttrFlag::Directory`]即为目录。
    /// 原样保存，不认识的位在回写时不丢失。
    attr: u8,

    /// 保留，恒为0
    reserved: [u8; 12],

    /// `0`表示不占有簇链
    first_cluster: i32,

    /// 文件内容的字节数；目录恒为0
    size: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[bitflags]
#[repr(u8)]
pub enum AttrFlag {
    Directory = 0b0001_0000,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl From<BitFlags<AttrFlag>> for EntryKind {
    fn from(attr: BitFlags<AttrFlag>) -> Self {
        if attr.contains(AttrFlag::Directory) {
            Self::Directory
        } else {
            Self::File
        }
    }
}

/// 规整名称：去掉首尾空白，拒绝非法字符与超过11字节的名称。
pub fn clean_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() || name.len() > NAME_LEN || name.contains(INVALID_CHARS) {
        return Err(Error::InvalidName);
    }
    Ok(name)
}

impl EntryRecord {
    /// 所有字段皆为0，作为目录项列表的终止符
    pub const TERMINATOR: Self = Self {
        name: [0; NAME_LEN],
        attr: 0,
        reserved: [0; 12],
        first_cluster: 0,
        size: 0,
    };

    pub fn new(name: &str, kind: EntryKind) -> Result<Self> {
        let attr: BitFlags<AttrFlag> = match kind {
            EntryKind::File => BitFlags::EMPTY,
            EntryKind::Directory => AttrFlag::Directory.into(),
        };
        Ok(Self {
            name: encode_name(name, kind)?,
            attr: attr.bits(),
            ..Self::TERMINATOR
        })
    }

    pub fn new_file(name: &str) -> Result<Self> {
        Self::new(name, EntryKind::File)
    }

    pub fn new_dir(name: &str) -> Result<Self> {
        Self::new(name, EntryKind::Directory)
    }

    pub fn kind(&self) -> EntryKind {
        self.attr().into()
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == EntryKind::Directory
    }

    pub fn attr(&self) -> BitFlags<AttrFlag> {
        BitFlags::from_bits_truncate(self.attr)
    }

    /// 属性字节的原始值，包括不认识的位
    pub fn raw_attr(&self) -> u8 {
        self.attr
    }

    pub fn raw_name(&self) -> &[u8; NAME_LEN] {
        &self.name
    }

    /// 名称字段全为0的记录是终止符
    pub fn is_terminator(&self) -> bool {
        self.name.iter().all(|&b| b == 0)
    }

    /// 还原出给人看的名称：去掉补齐的空格，文件有扩展名时插回`.`
    pub fn name(&self) -> String {
        match self.kind() {
            EntryKind::Directory => trim_padding(&self.name),
            EntryKind::File => {
                let base = trim_padding(&self.name[..BASE_LEN]);
                let ext = trim_padding(&self.name[BASE_LEN..]);
                if ext.is_empty() {
                    base
                } else {
                    format!("{base}.{ext}")
                }
            }
        }
    }

    /// 按当前类型重新编码名称，其余字段不变
    pub fn rename(&mut self, name: &str) -> Result<()> {
        self.name = encode_name(name, self.kind())?;
        Ok(())
    }

    pub fn first_cluster(&self) -> Result<Option<ClusterId>> {
        Ok(ClusterId::from_first_cluster(self.first_cluster)?)
    }

    pub fn set_first_cluster(&mut self, id: Option<ClusterId>) {
        self.first_cluster = id.map_or(0, |id| u32::from(id) as i32);
    }

    pub fn size(&self) -> usize {
        self.size.max(0) as usize
    }

    pub fn resize(&mut self, size: usize) -> Result<()> {
        self.size = i32::try_from(size).map_err(|_| Error::NoSpace)?;
        Ok(())
    }
}

/// 目录名整体规整；文件名先在最后一个`.`处切开，主名与扩展名分别规整
fn encode_name(name: &str, kind: EntryKind) -> Result<[u8; NAME_LEN]> {
    let name = name.trim();
    if name == "." || name == ".." {
        return Err(Error::InvalidName);
    }

    let mut field = [b' '; NAME_LEN];
    match kind {
        EntryKind::Directory => {
            let name = clean_name(name)?;
            field[..name.len()].copy_from_slice(name.as_bytes());
        }
        EntryKind::File => {
            let (base, ext) = name.rsplit_once('.').unwrap_or((name, ""));
            let base = clean_name(base)?;
            let ext = if ext.trim().is_empty() {
                ""
            } else {
                clean_name(ext)?
            };
            if base.len() > BASE_LEN || ext.len() > EXT_LEN {
                return Err(Error::InvalidName);
            }
            field[..base.len()].copy_from_slice(base.as_bytes());
            field[BASE_LEN..BASE_LEN + ext.len()].copy_from_slice(ext.as_bytes());
        }
    }
    Ok(field)
}

fn trim_padding(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_name_rules() {
        assert_eq!("a.txt", clean_name("  a.txt\t").unwrap());
        assert_eq!("ELEVENCHARS", clean_name("ELEVENCHARS").unwrap());
        assert!(clean_name("TWELVECHARSS").is_err());
        assert!(clean_name("   ").is_err());
        for bad in ["a/b", "a\\b", "a*", "a?", "a\"", "a<", "a>", "a|"] {
            assert!(matches!(clean_name(bad), Err(Error::InvalidName)), "{bad}");
        }
    }

    #[test]
    fn file_name_is_split_at_the_last_dot() {
        let entry = EntryRecord::new_file("a.b.txt").unwrap();
        assert_eq!(b"a.b     txt", entry.raw_name());
        assert_eq!("a.b.txt", entry.name());

        let entry = EntryRecord::new_file("README").unwrap();
        assert_eq!(b"README     ", entry.raw_name());
        assert_eq!("README", entry.name());

        let entry = EntryRecord::new_file("notes.").unwrap();
        assert_eq!("notes", entry.name());
    }

    #[test]
    fn full_length_names() {
        let entry = EntryRecord::new_file("eightchr.txt").unwrap();
        assert_eq!(b"eightchrtxt", entry.raw_name());
        assert_eq!("eightchr.txt", entry.name());
        assert!(EntryRecord::new_file(" readme12.txt ").is_ok());
        assert!(EntryRecord::new_file("eightchr.t*t").is_err());
        assert!(EntryRecord::new_dir("eightchr.txt").is_err());
    }

    #[test]
    fn file_name_parts_are_bounded() {
        assert!(EntryRecord::new_file("ninechars.t").is_err());
        assert!(EntryRecord::new_file("a.text").is_err());
        assert!(EntryRecord::new_file(".txt").is_err());
        assert!(EntryRecord::new_file("eightchr.txt").is_ok());
    }

    #[test]
    fn directory_names_are_not_split() {
        let entry = EntryRecord::new_dir("LONGDIRNAME").unwrap();
        assert_eq!("LONGDIRNAME", entry.name());
        let entry = EntryRecord::new_dir("v1.2").unwrap();
        assert_eq!(b"v1.2       ", entry.raw_name());
        assert_eq!("v1.2", entry.name());
    }

    #[test]
    fn relative_names_are_rejected() {
        for kind in [EntryKind::File, EntryKind::Directory] {
            assert!(EntryRecord::new(".", kind).is_err());
            assert!(EntryRecord::new("..", kind).is_err());
        }
    }

    #[test]
    fn attribute_is_the_kind() {
        let file = EntryRecord::new_file("a.txt").unwrap();
        let dir = EntryRecord::new_dir("DOCS").unwrap();
        assert_eq!(0x00, file.attr().bits());
        assert_eq!(0x10, dir.attr().bits());
        assert_eq!(EntryKind::File, file.kind());
        assert!(dir.is_dir());
    }

    #[test]
    fn rename_keeps_kind_and_cluster() {
        let mut entry = EntryRecord::new_file("a.txt").unwrap();
        entry.set_first_cluster(Some(ClusterId::new(12)));
        entry.resize(3000).unwrap();
        entry.rename("b.md").unwrap();
        assert_eq!("b.md", entry.name());
        assert_eq!(Some(ClusterId::new(12)), entry.first_cluster().unwrap());
        assert_eq!(3000, entry.size());
    }

    #[test]
    fn terminator() {
        assert!(EntryRecord::TERMINATOR.is_terminator());
        assert!(!EntryRecord::new_dir("X").unwrap().is_terminator());
    }
}
