use crate::{Directory, EntryRecord, Error, FileSystem, Result, codec};

/// 普通文件：所在目录的句柄，外加打开时目录项的一份副本。
///
/// 句柄按名称定位文件。读写与删除都以父目录中当前的目录项为准，
/// 副本只用来取名称；同名文件已不存在时返回[`Error::StaleHandle`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    entry: EntryRecord,
    parent: Directory,
}

impl File {
    pub(crate) fn new(entry: EntryRecord, parent: Directory) -> Self {
        debug_assert!(!entry.is_dir());
        Self { entry, parent }
    }

    /// 最近一次打开或写入时的目录项
    pub fn entry(&self) -> &EntryRecord {
        &self.entry
    }

    pub fn name(&self) -> String {
        self.entry.name()
    }

    pub fn size(&self) -> usize {
        self.entry.size()
    }

    pub fn parent(&self) -> Directory {
        self.parent
    }

    /// 父目录中当前的目录项，并同步到本句柄
    pub fn refresh(&mut self, fs: &FileSystem) -> Result<()> {
        self.entry = self.current(fs)?;
        Ok(())
    }

    pub fn clusters_on_disk(&self, fs: &FileSystem) -> Result<usize> {
        fs.chain_len(self.current(fs)?.first_cluster()?)
    }

    /// 读出全部内容，截断到目录项记录的大小
    pub fn read(&self, fs: &FileSystem) -> Result<Vec<u8>> {
        let entry = self.current(fs)?;
        let mut content = fs.read_chain(entry.first_cluster()?)?;
        let size = entry.size();
        if content.len() < size {
            return Err(Error::Corrupt(format!(
                "{:?} claims {size} bytes but its chain holds {}",
                entry.name(),
                content.len()
            )));
        }
        content.truncate(size);
        Ok(content)
    }

    /// 整体覆写：旧链释放，新内容写入一条按`ceil(len / 1024)`分配的新链，
    /// 随后让父目录替换它保存的目录项。
    pub fn write(&mut self, content: &[u8], fs: &mut FileSystem) -> Result<()> {
        let old = self.current(fs)?;
        let mut new = old;
        new.resize(content.len())?;

        let blocks = codec::chunk(content);
        let first = fs.rewrite_chain(old.first_cluster()?, &blocks)?;
        new.set_first_cluster(first);
        log::debug!(
            "File {:?} rewritten: {} bytes in {} clusters",
            new.name(),
            content.len(),
            blocks.len()
        );

        self.entry = new;
        self.parent.replace_child(&old, new, fs)
    }

    /// 释放簇链并从父目录中移除目录项
    pub fn delete(self, fs: &mut FileSystem) -> Result<()> {
        let entry = self.current(fs)?;
        let freed = fs.release_chain(entry.first_cluster()?)?;
        log::debug!("Deleting file {:?}, {freed} clusters freed", entry.name());
        self.parent.remove_child(&entry.name(), fs)?;
        Ok(())
    }

    fn current(&self, fs: &FileSystem) -> Result<EntryRecord> {
        let index = self
            .parent
            .search(&self.entry.name(), fs)
            .map_err(|e| match e {
                Error::NotFound => Error::StaleHandle,
                e => e,
            })?;
        let entry = self.parent.entries(fs)?[index];
        if entry.is_dir() {
            return Err(Error::NotAFile);
        }
        Ok(entry)
    }
}
