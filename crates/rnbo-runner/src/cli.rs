use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "rnbo-runner", about = "RNBO-style patcher control plane")]
pub struct Cli {
    /// Preload a compiled patcher library at startup.
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Suppress status logging.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}
