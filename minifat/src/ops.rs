//! 带检查的目录操作，只由[`Directory`]与[`File`]的原语组合而成。

use crate::{Directory, EntryRecord, Error, File, FileSystem, Result};

impl Directory {
    /// 在当前目录下创建空目录，返回已加载的子目录
    pub fn create_dir(self, name: &str, fs: &mut FileSystem) -> Result<Directory> {
        let entry = EntryRecord::new_dir(name)?;
        self.admit(&entry, fs)?;
        self.add_child(entry, fs)?;
        log::debug!("mkdir {:?}", entry.name());

        self.open_dir(&entry.name(), fs)
    }

    /// 在当前目录下创建文件并写入`content`
    pub fn create_file(self, name: &str, content: &[u8], fs: &mut FileSystem) -> Result<File> {
        let entry = EntryRecord::new_file(name)?;
        let mut sized = entry;
        sized.resize(content.len())?;
        self.admit(&sized, fs)?;

        self.add_child(entry, fs)?;
        let mut file = self.open_file(&entry.name(), fs)?;
        if !content.is_empty() {
            file.write(content, fs)?;
        }
        log::debug!("create {:?}, {} bytes", file.name(), content.len());
        Ok(file)
    }

    /// 把`source`的内容复制为本目录下的新文件`name`，`source`可以在任意目录
    pub fn copy_file(self, source: &File, name: &str, fs: &mut FileSystem) -> Result<File> {
        let content = source.read(fs)?;
        log::debug!("copy {:?} -> {name:?}", source.name());
        self.create_file(name, &content, fs)
    }

    /// 删除文件
    pub fn unlink(self, name: &str, fs: &mut FileSystem) -> Result<()> {
        self.open_file(name, fs)?.delete(fs)
    }

    /// 删除空目录
    pub fn rmdir(self, name: &str, fs: &mut FileSystem) -> Result<()> {
        let dir = self.open_dir(name, fs)?;
        if !dir.is_empty(fs)? {
            return Err(Error::DirectoryNotEmpty);
        }
        dir.delete(fs)
    }

    /// 原地改名，不移动簇链
    pub fn rename(self, old_name: &str, new_name: &str, fs: &mut FileSystem) -> Result<()> {
        let index = self.search(old_name, fs)?;
        let old = self.entries(fs)?[index];
        let mut new = old;
        new.rename(new_name)?;

        if new.name() == old.name() {
            return Ok(());
        }
        if self.search(&new.name(), fs).is_ok() {
            return Err(Error::DuplicateName);
        }

        self.sync_loaded_entry(&old.name(), new, fs)?;
        self.replace_child(&old, new, fs)?;
        log::debug!("rename {:?} -> {:?}", old.name(), new.name());
        Ok(())
    }

    fn admit(self, candidate: &EntryRecord, fs: &FileSystem) -> Result<()> {
        if self.search(&candidate.name(), fs).is_ok() {
            return Err(Error::DuplicateName);
        }
        if !self.can_admit(candidate, fs)? {
            return Err(Error::NoSpace);
        }
        Ok(())
    }
}
