//! 目录树
//!
//! 每个已加载的目录是会话节点池中的一个[`DirNode`]：它持有自己的目录项、
//! 子目录项列表，以及已加载子目录的句柄；子节点只记着父节点的句柄。
//!
//! 任何改动目录簇链的操作，返回前都要让父目录替换它保存的那份目录项并落盘。

use crate::config::{CLUSTER_SIZE, ENTRY_SIZE};
use crate::path::SEPARATOR;
use crate::{EntryKind, EntryRecord, Error, File, FileSystem, Result, codec};

/// 目录句柄，指向会话节点池中的一个节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Directory(usize);

#[derive(Debug)]
pub(crate) struct DirNode {
    entry: EntryRecord,
    parent: Option<Directory>,
    children: Vec<EntryRecord>,
    /// 已加载的子目录
    subdirs: Vec<Directory>,
}

impl DirNode {
    pub(crate) fn new(entry: EntryRecord, parent: Option<Directory>) -> Self {
        Self {
            entry,
            parent,
            children: Vec::new(),
            subdirs: Vec::new(),
        }
    }

    pub(crate) fn subdirs(&self) -> &[Directory] {
        &self.subdirs
    }
}

/// 路径解析的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Directory(Directory),
    File(File),
}

impl Node {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Directory(_) => EntryKind::Directory,
            Self::File(_) => EntryKind::File,
        }
    }

    pub fn into_dir(self) -> Result<Directory> {
        match self {
            Self::Directory(dir) => Ok(dir),
            Self::File(_) => Err(Error::NotADirectory),
        }
    }

    pub fn into_file(self) -> Result<File> {
        match self {
            Self::File(file) => Ok(file),
            Self::Directory(_) => Err(Error::NotAFile),
        }
    }
}

impl Directory {
    pub(crate) const ROOT: Self = Self(0);

    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) const fn index(self) -> usize {
        self.0
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    pub fn entry(self, fs: &FileSystem) -> Result<EntryRecord> {
        Ok(fs.node(self)?.entry)
    }

    pub fn name(self, fs: &FileSystem) -> Result<String> {
        Ok(fs.node(self)?.entry.name())
    }

    pub fn parent(self, fs: &FileSystem) -> Result<Option<Directory>> {
        Ok(fs.node(self)?.parent)
    }

    /// 内存中的子目录项，按存储顺序排列
    pub fn entries(self, fs: &FileSystem) -> Result<&[EntryRecord]> {
        Ok(&fs.node(self)?.children)
    }

    pub fn is_empty(self, fs: &FileSystem) -> Result<bool> {
        Ok(fs.node(self)?.children.is_empty())
    }

    /// 本目录占用的簇数
    pub fn clusters_on_disk(self, fs: &FileSystem) -> Result<usize> {
        fs.chain_len(fs.node(self)?.entry.first_cluster()?)
    }

    /// 沿簇链读出子目录项列表；首簇为0时列表为空
    pub fn read(self, fs: &mut FileSystem) -> Result<()> {
        let first = fs.node(self)?.entry.first_cluster()?;
        let children = codec::decode_entries(&fs.read_chain(first)?)?;
        log::debug!("Read {} entries from chain {first:?}", children.len());
        fs.node_mut(self)?.children = children;
        Ok(())
    }

    /// 序列化子目录项列表并写入一条全新的簇链，旧链先行释放；
    /// 列表为空时不占簇，首簇回到0。
    /// 最后让父目录替换它保存的本目录目录项（根目录则写入超级块）。
    pub fn write(self, fs: &mut FileSystem) -> Result<()> {
        let node = fs.node(self)?;
        let old = node.entry;
        let parent = node.parent;
        let blocks = codec::chunk(&codec::encode_entries(&node.children)?);

        let first = fs.rewrite_chain(old.first_cluster()?, &blocks)?;
        let node = fs.node_mut(self)?;
        node.entry.set_first_cluster(first);
        let new = node.entry;
        log::debug!(
            "Directory {:?} rewritten into {} clusters at {first:?}",
            new.name(),
            blocks.len()
        );

        match parent {
            Some(parent) => parent.replace_child(&old, new, fs),
            None => fs.set_root_entry(new),
        }
    }

    /// 追加子目录项并写回。不检查重名，调用者应先[`Directory::search`]。
    pub fn add_child(self, entry: EntryRecord, fs: &mut FileSystem) -> Result<()> {
        fs.node_mut(self)?.children.push(entry);
        self.write(fs)
    }

    /// 移除第一个名称完全一致的子目录项并写回，返回被移除的目录项。
    ///
    /// 只动目录项本身，不释放其簇链；删除文件或目录请用
    /// [`File::delete`]或[`Directory::delete`]。
    pub fn remove_child(self, name: &str, fs: &mut FileSystem) -> Result<EntryRecord> {
        let index = self.search(name, fs)?;
        let removed = fs.node_mut(self)?.children.remove(index);
        if removed.is_dir() {
            if let Some(dir) = self.loaded_subdir(name, fs) {
                fs.node_mut(self)?.subdirs.retain(|&d| d != dir);
                fs.remove_node(dir);
            }
        }
        self.write(fs)?;
        Ok(removed)
    }

    /// 用`new`替换名为`old.name()`的子目录项并写回
    pub fn replace_child(
        self,
        old: &EntryRecord,
        new: EntryRecord,
        fs: &mut FileSystem,
    ) -> Result<()> {
        let index = self.search(&old.name(), fs)?;
        fs.node_mut(self)?.children[index] = new;
        self.write(fs)
    }

    /// 按名称精确查找（区分大小写），返回子目录项的下标
    pub fn search(self, name: &str, fs: &FileSystem) -> Result<usize> {
        fs.node(self)?
            .children
            .iter()
            .position(|entry| entry.name() == name)
            .ok_or(Error::NotFound)
    }

    /// 加入`candidate`后，新列表与其内容所需的簇数
    /// 是否不超过本目录现占的簇数加上全局空闲簇数
    pub fn can_admit(self, candidate: &EntryRecord, fs: &FileSystem) -> Result<bool> {
        let node = fs.node(self)?;
        let list_bytes = (node.children.len() + 1) * ENTRY_SIZE;
        let needed = list_bytes.div_ceil(CLUSTER_SIZE) + candidate.size().div_ceil(CLUSTER_SIZE);
        let owned = fs.chain_len(node.entry.first_cluster()?)?;
        Ok(needed <= owned + fs.free_count())
    }

    /// 释放本目录的簇链，并从父目录中移除自己的目录项。
    ///
    /// 不会递归删除子项，调用者须保证目录为空。
    pub fn delete(self, fs: &mut FileSystem) -> Result<()> {
        let node = fs.node(self)?;
        let parent = node.parent.ok_or(Error::RemoveRoot)?;
        let entry = node.entry;

        let freed = fs.release_chain(entry.first_cluster()?)?;
        log::debug!("Deleting directory {:?}, {freed} clusters freed", entry.name());
        fs.node_mut(self)?.entry.set_first_cluster(None);
        parent.remove_child(&entry.name(), fs)?;
        Ok(())
    }

    /// 根目录形如`C:\`，其余为`父目录路径\名称`
    pub fn full_path(self, fs: &FileSystem) -> Result<String> {
        let node = fs.node(self)?;
        let name = node.entry.name();
        match node.parent {
            None => Ok(format!("{name}{SEPARATOR}")),
            Some(parent) => {
                let mut path = parent.full_path(fs)?;
                if !path.ends_with(SEPARATOR) {
                    path.push(SEPARATOR);
                }
                path.push_str(&name);
                Ok(path)
            }
        }
    }

    /// 加载名为`name`的子目录；已加载过则直接返回其句柄
    pub fn open_dir(self, name: &str, fs: &mut FileSystem) -> Result<Directory> {
        let index = self.search(name, fs)?;
        let entry = fs.node(self)?.children[index];
        if !entry.is_dir() {
            return Err(Error::NotADirectory);
        }
        if let Some(dir) = self.loaded_subdir(name, fs) {
            return Ok(dir);
        }

        let dir = fs.insert_node(DirNode::new(entry, Some(self)));
        fs.node_mut(self)?.subdirs.push(dir);
        if let Err(e) = dir.read(fs) {
            fs.node_mut(self)?.subdirs.retain(|&d| d != dir);
            fs.remove_node(dir);
            return Err(e);
        }
        Ok(dir)
    }

    pub fn open_file(self, name: &str, fs: &FileSystem) -> Result<File> {
        let index = self.search(name, fs)?;
        let entry = fs.node(self)?.children[index];
        if entry.is_dir() {
            return Err(Error::NotAFile);
        }
        Ok(File::new(entry, self))
    }

    pub fn child(self, name: &str, fs: &mut FileSystem) -> Result<Node> {
        let index = self.search(name, fs)?;
        match fs.node(self)?.children[index].kind() {
            EntryKind::Directory => self.open_dir(name, fs).map(Node::Directory),
            EntryKind::File => self.open_file(name, fs).map(Node::File),
        }
    }

    /// 从本目录出发逐级解析`.`、`..`与名称，按需加载子目录。
    ///
    /// 中间一级不存在时返回[`Error::NotFound`]，是文件时返回[`Error::NotADirectory`]；
    /// 最后一级可以是文件。在根目录上取`..`视为不存在。
    pub fn resolve<'a>(
        self,
        components: impl IntoIterator<Item = &'a str>,
        fs: &mut FileSystem,
    ) -> Result<Node> {
        let mut node = Node::Directory(self);
        for cmp in components {
            let dir = node.into_dir()?;
            node = match cmp {
                "" | "." => Node::Directory(dir),
                ".." => Node::Directory(dir.parent(fs)?.ok_or(Error::NotFound)?),
                name => dir.child(name, fs)?,
            };
        }
        Ok(node)
    }

    pub(crate) fn loaded_subdir(self, name: &str, fs: &FileSystem) -> Option<Directory> {
        let node = fs.node(self).ok()?;
        node.subdirs
            .iter()
            .copied()
            .find(|&dir| fs.node(dir).is_ok_and(|sub| sub.entry.name() == name))
    }

    /// 已加载子目录的目录项随父目录中的那份一起更新
    pub(crate) fn sync_loaded_entry(
        self,
        name: &str,
        entry: EntryRecord,
        fs: &mut FileSystem,
    ) -> Result<()> {
        if let Some(dir) = self.loaded_subdir(name, fs) {
            fs.node_mut(dir)?.entry = entry;
        }
        Ok(())
    }
}
