use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "nemo CLI: Virtools/Nemo binary scene codec", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a file and save it back out, byte-compatibly.
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Compress both Header1 and the data section (file_write_mode
        /// bits 1 and 2) on write.
        #[arg(long)]
        compress: bool,

        /// Abort on a missing plugin dependency or a recovered manager
        /// hook failure instead of logging and continuing.
        #[arg(long)]
        strict: bool,
    },

    /// Load a file read-only and print its header fields, object/manager
    /// counts, and finish-load resolution statistics.
    Inspect { input: PathBuf },
}
