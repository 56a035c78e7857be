mod cli;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use clap::Parser;
use minifat::{Directory, EntryKind, EntryRecord, Error, FileSystem, path};
use typed_bytesize::ByteSizeIec;

use self::cli::{Cli, Command};

fn main() -> minifat::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut fs = FileSystem::open_or_create(&cli.disk)?;
    let root = fs.root();

    match cli.command {
        Command::Info => info(&fs),
        Command::Ls { path } => {
            let dir = fs.resolve_path(root, &path)?.into_dir()?;
            ls(dir, &fs)?;
        }
        Command::Cat { path } => {
            let file = fs.resolve_path(root, &path)?.into_file()?;
            io::stdout().write_all(&file.read(&fs)?)?;
        }
        Command::Mkdir { path } => {
            let (parent, name) = fs.resolve_parent(root, &path)?;
            let dir = parent.create_dir(name, &mut fs)?;
            println!("{}", dir.full_path(&fs)?);
        }
        Command::Cp { from, to } => {
            let source = fs.resolve_path(root, &from)?.into_file()?;
            let (dest, name) = fs.resolve_parent(root, &to)?;
            let copy = dest.copy_file(&source, name, &mut fs)?;
            println!("{} bytes copied", copy.size());
        }
        Command::Export { path, out } => {
            let file = fs.resolve_path(root, &path)?.into_file()?;
            fs::write(&out, file.read(&fs)?)?;
            log::info!("exported {path:?} to {}", out.display());
        }
        Command::Pack { source, into } => {
            let dir = fs.resolve_path(root, &into)?.into_dir()?;
            pack(&source, dir, &mut fs)?;
        }
    }

    fs.close()
}

fn info(fs: &FileSystem) {
    let used = fs.total_count() - fs.free_count();
    println!("drive={}:", fs.drive());
    println!(
        "clusters={} used={used} free={}",
        fs.total_count(),
        fs.free_count()
    );
    println!(
        "capacity={} free={}",
        ByteSizeIec((fs.total_count() * fs.cluster_size()) as u64),
        ByteSizeIec(fs.free_bytes() as u64)
    );
}

fn ls(dir: Directory, fs: &FileSystem) -> minifat::Result<()> {
    println!("{}", path::normalize(&dir.full_path(fs)?));
    for entry in dir.entries(fs)? {
        match entry.kind() {
            EntryKind::Directory => println!("{:>10}  {}", "<DIR>", entry.name()),
            EntryKind::File => println!("{:>10}  {}", entry.size(), entry.name()),
        }
    }
    Ok(())
}

/// 导入`source`下的普通文件，已存在的同名文件被覆盖
fn pack(source: &Path, dir: Directory, fs: &mut FileSystem) -> minifat::Result<()> {
    for host in fs::read_dir(source)? {
        let host = host?;
        if !host.file_type()?.is_file() {
            continue;
        }
        let Some(name) = host.file_name().to_str().map(str::to_owned) else {
            log::warn!("Skipping non UTF-8 name {:?}", host.file_name());
            continue;
        };
        let name = match EntryRecord::new_file(&name) {
            Ok(entry) => entry.name(),
            Err(e) => {
                log::warn!("Skipping {name:?}: {e}");
                continue;
            }
        };

        let data = fs::read(host.path())?;
        match dir.open_file(&name, fs) {
            Ok(mut file) => file.write(&data, fs)?,
            Err(Error::NotFound) => {
                dir.create_file(&name, &data, fs)?;
            }
            Err(e) => return Err(e),
        }
        log::info!("packed {name:?}, {} bytes", data.len());
    }

    println!(
        "{} free of {}",
        ByteSizeIec(fs.free_bytes() as u64),
        ByteSizeIec((fs.total_count() * fs.cluster_size()) as u64)
    );
    Ok(())
}
