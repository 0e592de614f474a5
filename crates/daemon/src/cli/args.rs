pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "custody")]
#[command(about = "Threshold secret custody node", version)]
pub struct Args {
    /// API of the daemon to talk to (defaults to the configured api_port on localhost)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the custody config directory (defaults to ~/.custody)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
