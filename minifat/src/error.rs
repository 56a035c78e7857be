use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ClusterError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no free cluster left on the disk")]
    NoSpace,
    #[error("entry not found")]
    NotFound,
    #[error("not a directory")]
    NotADirectory,
    #[error("not a file")]
    NotAFile,
    #[error("invalid entry name")]
    InvalidName,
    #[error("an entry with this name already exists")]
    DuplicateName,
    #[error("directory is not empty")]
    DirectoryNotEmpty,
    #[error("the root directory cannot be removed")]
    RemoveRoot,
    #[error("directory handle refers to a removed node")]
    StaleHandle,
    #[error("disk image {0:?} is already opened by another session")]
    DiskInUse(PathBuf),
    #[error("corrupted disk: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error("codec error: {0}")]
    Codec(#[from] binrw::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
