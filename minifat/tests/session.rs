mod common;

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};

use common::TempDisk;
use minifat::config::{CLUSTER_COUNT, CLUSTER_SIZE, DATA_START};
use minifat::{Error, FileSystem};

#[test]
fn fresh_disk_is_formatted() {
    let disk = TempDisk::new("fresh");
    let fs = disk.open();
    assert_eq!('C', fs.drive());
    assert_eq!("C:\\", fs.root().full_path(&fs).unwrap());
    assert_eq!(CLUSTER_COUNT - DATA_START, fs.free_count());
    assert_eq!(CLUSTER_COUNT, fs.total_count());
    assert_eq!(CLUSTER_SIZE, fs.cluster_size());
    assert_eq!(fs.free_count() * CLUSTER_SIZE, fs.free_bytes());
    assert!(fs.root().is_empty(&fs).unwrap());
    fs.close().unwrap();

    let len = std::fs::metadata(disk.path()).unwrap().len();
    assert_eq!((DATA_START * CLUSTER_SIZE) as u64, len);
}

#[test]
fn content_survives_reopen() {
    let disk = TempDisk::new("reopen");
    {
        let mut fs = disk.open();
        let docs = fs.root().create_dir("DOCS", &mut fs).unwrap();
        docs.create_file("a.txt", b"hello", &mut fs).unwrap();
        fs.close().unwrap();
    }

    let mut fs = disk.open();
    let root = fs.root();
    let file = root
        .resolve(["DOCS", "a.txt"], &mut fs)
        .unwrap()
        .into_file()
        .unwrap();
    assert_eq!(b"hello", file.read(&fs).unwrap().as_slice());
    assert_eq!(5, file.size());
    fs.close().unwrap();
}

#[test]
fn one_session_per_image() {
    let disk = TempDisk::new("registry");
    let fs = disk.open();
    assert!(matches!(
        FileSystem::open_or_create(disk.path()),
        Err(Error::DiskInUse(_))
    ));
    fs.close().unwrap();

    let fs = disk.open();
    fs.close().unwrap();
}

#[test]
fn dropped_session_is_flushed() {
    let disk = TempDisk::new("drop");
    {
        let mut fs = disk.open();
        fs.root().create_file("note.txt", b"kept", &mut fs).unwrap();
    }

    let mut fs = disk.open();
    let root = fs.root();
    let file = fs.resolve_path(root, "note.txt").unwrap().into_file().unwrap();
    assert_eq!(b"kept", file.read(&fs).unwrap().as_slice());
    fs.close().unwrap();
}

#[test]
fn drive_letter_is_kept() {
    let disk = TempDisk::new("drive");
    {
        let mut fs = FileSystem::open_or_create_with(disk.path(), 'd').unwrap();
        fs.root().create_dir("DOCS", &mut fs).unwrap();
        fs.close().unwrap();
    }

    // 已有的盘沿用超级块中的盘符
    let mut fs = FileSystem::open_or_create_with(disk.path(), 'C').unwrap();
    let root = fs.root();
    assert_eq!('D', fs.drive());
    assert_eq!("D:\\", root.full_path(&fs).unwrap());

    let docs = fs.resolve_path(root, "d:\\DOCS").unwrap().into_dir().unwrap();
    assert_eq!("D:\\DOCS", docs.full_path(&fs).unwrap());
    assert!(matches!(
        fs.resolve_path(root, "C:\\DOCS"),
        Err(Error::NotFound)
    ));
    fs.close().unwrap();
}

#[test]
fn bad_signature_is_corrupt() {
    let disk = TempDisk::new("signature");
    disk.open().close().unwrap();

    let mut img = OpenOptions::new().write(true).open(disk.path()).unwrap();
    img.seek(SeekFrom::Start(0)).unwrap();
    img.write_all(b"BADSIGN\0").unwrap();
    drop(img);

    assert!(matches!(
        FileSystem::open_or_create(disk.path()),
        Err(Error::Corrupt(_))
    ));
}

#[test]
fn blank_allocation_table_is_corrupt() {
    let disk = TempDisk::new("blank");
    std::fs::write(disk.path(), vec![0; DATA_START * CLUSTER_SIZE]).unwrap();

    assert!(matches!(
        FileSystem::open_or_create(disk.path()),
        Err(Error::Corrupt(_))
    ));

    // 打开失败的会话不占用镜像
    std::fs::remove_file(disk.path()).unwrap();
    disk.open().close().unwrap();
}
