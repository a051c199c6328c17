pub mod handlers;

use clap::Parser;
use nemo_core::error::Result;

use crate::presentation::cli::{Cli, Commands};

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Convert {
            input,
            output,
            compress,
            strict,
        } => handlers::handle_convert(input, output, compress, strict),
        Commands::Inspect { input } => handlers::handle_inspect(input),
    }
}
