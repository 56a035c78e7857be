use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use block_dev::{Block, BlockDevice, BlockFile};

use crate::config::{CLUSTER_SIZE, DEFAULT_DRIVE};
use crate::dir::{DirNode, Directory, Node};
use crate::path;
use crate::volume::super_block::SuperBlock;
use crate::{ClusterId, EntryRecord, Error, FatTable, Result};

/// 已被会话打开的镜像（规范化路径）
static OPEN_DISKS: Mutex<BTreeSet<PathBuf>> = Mutex::new(BTreeSet::new());

/// 一张镜像同一时刻只允许一个会话
#[derive(Debug)]
struct DiskLock(PathBuf);

impl DiskLock {
    fn acquire(path: &Path) -> Result<Self> {
        let path = path.canonicalize()?;
        let mut disks = OPEN_DISKS.lock().unwrap_or_else(PoisonError::into_inner);
        if !disks.insert(path.clone()) {
            return Err(Error::DiskInUse(path));
        }
        Ok(Self(path))
    }
}

impl Drop for DiskLock {
    fn drop(&mut self) {
        OPEN_DISKS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.0);
    }
}

/// 一次磁盘会话：打开时构建，关闭时销毁。
///
/// 分配表与超级块常驻内存；已加载的目录节点存放在会话内的节点池中，
/// 由[`Directory`]句柄索引。
pub struct FileSystem {
    dev: Arc<dyn BlockDevice>,
    fat: FatTable,
    sb: SuperBlock,
    nodes: Vec<Option<DirNode>>,
    lock: Option<DiskLock>,
    closed: bool,
}

impl FileSystem {
    /// 打开镜像，不存在或为空时以默认盘符格式化
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_or_create_with(path, DEFAULT_DRIVE)
    }

    /// `drive`只在格式化新盘时生效，已有的盘沿用超级块中的盘符
    pub fn open_or_create_with(path: impl AsRef<Path>, drive: char) -> Result<Self> {
        let path = path.as_ref();
        let dev = BlockFile::open_or_create(path)?;
        let lock = DiskLock::acquire(path)?;

        let mut fs = Self::open(Arc::new(dev), drive)?;
        fs.lock = Some(lock);
        log::info!("Session opened on {}", path.display());
        Ok(fs)
    }

    /// 在任意块设备上开启会话，不参与镜像的互斥登记
    pub fn open(dev: Arc<dyn BlockDevice>, drive: char) -> Result<Self> {
        let (fat, sb) = if dev.is_new()? {
            let sb = SuperBlock::new(drive)?;
            let fat = FatTable::new();
            sb.persist(&*dev)?;
            fat.persist(&*dev)?;
            log::info!("Formatted a fresh disk as {}", sb.root().name());
            (fat, sb)
        } else {
            let fat = FatTable::load(&*dev)?;
            let sb = SuperBlock::load(&*dev)?;
            log::info!(
                "Loaded disk {} with {} free clusters",
                sb.root().name(),
                fat.free_count()
            );
            (fat, sb)
        };

        let root = DirNode::new(*sb.root(), None);
        let mut fs = Self {
            dev,
            fat,
            sb,
            nodes: vec![Some(root)],
            lock: None,
            closed: false,
        };
        if let Err(e) = fs.root().read(&mut fs) {
            // 读不出根目录的盘不应被回写
            fs.closed = true;
            return Err(e);
        }
        Ok(fs)
    }

    pub fn root(&self) -> Directory {
        Directory::ROOT
    }

    /// 根目录名的首字母，例如`C`
    pub fn drive(&self) -> char {
        self.sb.drive()
    }

    pub fn fat(&self) -> &FatTable {
        &self.fat
    }

    pub fn free_count(&self) -> usize {
        self.fat.free_count()
    }

    pub fn total_count(&self) -> usize {
        self.fat.total_count()
    }

    pub fn cluster_size(&self) -> usize {
        self.fat.cluster_size()
    }

    pub fn free_bytes(&self) -> usize {
        self.free_count() * CLUSTER_SIZE
    }

    /// 解析用户路径。`X:\`或`\`开头时从根目录出发，否则从`cwd`出发；
    /// `/`与`\`等价。
    pub fn resolve_path(&mut self, cwd: Directory, path: &str) -> Result<Node> {
        let parsed = path::parse(path);
        let start = self.start_of(cwd, &parsed)?;
        start.resolve(parsed.components.iter().copied(), self)
    }

    /// 解析出路径最后一级名称所在的目录，返回该目录与名称
    pub fn resolve_parent<'p>(
        &mut self,
        cwd: Directory,
        path: &'p str,
    ) -> Result<(Directory, &'p str)> {
        let mut parsed = path::parse(path);
        let name = parsed.components.pop().ok_or(Error::InvalidName)?;
        let start = self.start_of(cwd, &parsed)?;
        let dir = start
            .resolve(parsed.components.iter().copied(), self)?
            .into_dir()?;
        Ok((dir, name))
    }

    /// 持久化分配表与超级块，并关闭块设备
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        self.dev.close()?;
        self.closed = true;
        log::info!("Session on {} closed", self.sb.root().name());
        Ok(())
    }

    fn start_of(&self, cwd: Directory, parsed: &path::ParsedPath<'_>) -> Result<Directory> {
        if let Some(drive) = parsed.drive {
            if !drive.eq_ignore_ascii_case(&self.drive()) {
                return Err(Error::NotFound);
            }
        }
        Ok(if parsed.absolute { self.root() } else { cwd })
    }

    fn flush(&self) -> Result<()> {
        self.fat.persist(&*self.dev)?;
        self.sb.persist(&*self.dev)
    }
}

/* 簇链 */
impl FileSystem {
    /// 沿簇链读出全部块并拼接；`first`为空时返回空内容
    pub(crate) fn read_chain(&self, first: Option<ClusterId>) -> Result<Vec<u8>> {
        let Some(first) = first else {
            return Ok(Vec::new());
        };
        let chain = self.fat.chain(first)?;
        let mut bytes = vec![0; chain.len() * CLUSTER_SIZE];
        for (id, buf) in chain.iter().zip(bytes.chunks_exact_mut(CLUSTER_SIZE)) {
            log::trace!("read cluster {id}");
            self.dev.read_block(id.index(), buf)?;
        }
        Ok(bytes)
    }

    pub(crate) fn chain_len(&self, first: Option<ClusterId>) -> Result<usize> {
        match first {
            Some(first) => Ok(self.fat.chain(first)?.len()),
            None => Ok(0),
        }
    }

    /// 先释放旧链，再为`blocks`分配一条全新的链并写入。
    ///
    /// 旧链长度加上空闲簇仍不够时返回[`Error::NoSpace`]，此时什么都没改。
    /// `blocks`为空时不分配，返回`None`。
    pub(crate) fn rewrite_chain(
        &mut self,
        old: Option<ClusterId>,
        blocks: &[Block],
    ) -> Result<Option<ClusterId>> {
        let owned = self.chain_len(old)?;
        if blocks.len() > owned + self.fat.free_count() {
            log::debug!(
                "Need {} clusters but only {owned} owned + {} free",
                blocks.len(),
                self.fat.free_count()
            );
            return Err(Error::NoSpace);
        }

        if let Some(old) = old {
            self.fat.release(old)?;
        }
        let chain = self.fat.allocate_chain(blocks.len())?;
        for (id, block) in chain.iter().zip(blocks) {
            log::trace!("write cluster {id}");
            self.dev.write_block(id.index(), block)?;
        }
        self.fat.persist(&*self.dev)?;

        Ok(chain.first().copied())
    }

    /// 释放整条簇链，返回释放的簇数
    pub(crate) fn release_chain(&mut self, first: Option<ClusterId>) -> Result<usize> {
        let Some(first) = first else {
            return Ok(0);
        };
        let n = self.fat.release(first)?;
        self.fat.persist(&*self.dev)?;
        Ok(n)
    }

    /// 根目录没有父目录，它的目录项保存在超级块里
    pub(crate) fn set_root_entry(&mut self, root: EntryRecord) -> Result<()> {
        self.sb.set_root(root);
        self.sb.persist(&*self.dev)
    }
}

/* 节点池 */
impl FileSystem {
    pub(crate) fn node(&self, dir: Directory) -> Result<&DirNode> {
        self.nodes
            .get(dir.index())
            .and_then(Option::as_ref)
            .ok_or(Error::StaleHandle)
    }

    pub(crate) fn node_mut(&mut self, dir: Directory) -> Result<&mut DirNode> {
        self.nodes
            .get_mut(dir.index())
            .and_then(Option::as_mut)
            .ok_or(Error::StaleHandle)
    }

    /// 槽位不复用，被删除节点的句柄永远失效
    pub(crate) fn insert_node(&mut self, node: DirNode) -> Directory {
        self.nodes.push(Some(node));
        Directory::new(self.nodes.len() - 1)
    }

    /// 移除节点及其下所有已加载的子节点
    pub(crate) fn remove_node(&mut self, dir: Directory) {
        let mut pending = vec![dir];
        while let Some(dir) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(dir.index()).and_then(Option::take) {
                pending.extend(node.subdirs());
            }
        }
    }
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("root", self.sb.root())
            .field("free_clusters", &self.fat.free_count())
            .field("loaded_dirs", &self.nodes.iter().flatten().count())
            .field("lock", &self.lock)
            .finish()
    }
}

impl Drop for FileSystem {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        log::warn!("Session dropped without close(), flushing");
        if let Err(e) = self.flush() {
            log::error!("Failed to flush the disk: {e}");
        }
        if let Err(e) = self.dev.close() {
            log::error!("Failed to close the disk: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem_disk::MemDisk;

    #[test]
    fn reopen_same_device() {
        let dev = Arc::new(MemDisk::default());
        let mut fs = FileSystem::open(dev.clone(), 'e').unwrap();
        assert_eq!('E', fs.drive());
        let root = fs.root();
        root.create_file("a.txt", b"hello", &mut fs).unwrap();
        let free = fs.free_count();
        fs.close().unwrap();

        let mut fs = FileSystem::open(dev, 'C').unwrap();
        assert_eq!('E', fs.drive());
        assert_eq!(free, fs.free_count());
        let root = fs.root();
        let file = fs.resolve_path(root, "E:/a.txt").unwrap().into_file().unwrap();
        assert_eq!(b"hello", file.read(&fs).unwrap().as_slice());
        fs.close().unwrap();
    }

    #[test]
    fn rewrite_chain_checks_space_first() {
        let mut fs = FileSystem::open(Arc::new(MemDisk::default()), 'C').unwrap();
        let blocks = vec![[1u8; CLUSTER_SIZE]; 3];
        let first = fs.rewrite_chain(None, &blocks).unwrap();
        assert_eq!(3, fs.chain_len(first).unwrap());

        let table = fs.fat().clone();
        let too_many = vec![[0u8; CLUSTER_SIZE]; fs.free_count() + 4];
        assert!(matches!(fs.rewrite_chain(first, &too_many), Err(Error::NoSpace)));
        assert_eq!(&table, fs.fat());

        let fits = vec![[2u8; CLUSTER_SIZE]; fs.free_count() + 3];
        let first = fs.rewrite_chain(first, &fits).unwrap();
        assert_eq!(0, fs.free_count());
        assert!(fs.read_chain(first).unwrap().iter().all(|&b| b == 2));
        fs.close().unwrap();
    }

    #[test]
    fn stale_handles() {
        let mut fs = FileSystem::open(Arc::new(MemDisk::default()), 'C').unwrap();
        assert!(matches!(fs.node(Directory::new(7)), Err(Error::StaleHandle)));
        fs.close().unwrap();
    }
}
