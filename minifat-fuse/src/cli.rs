use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Disk image, created and formatted if absent
    #[arg(long, short, default_value = "disk.img")]
    pub disk: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the drive label and capacity
    Info,

    /// List a directory
    Ls {
        #[arg(default_value = "\\")]
        path: String,
    },

    /// Print a file to stdout
    Cat { path: String },

    /// Create a directory
    Mkdir { path: String },

    /// Copy a file inside the disk
    Cp { from: String, to: String },

    /// Write a file out to the host
    Export { path: String, out: PathBuf },

    /// Import every regular file of a host directory
    Pack {
        /// Host source directory
        #[arg(long, short)]
        source: PathBuf,

        /// Target directory on the disk
        #[arg(long, short, default_value = "\\")]
        into: String,
    },
}
