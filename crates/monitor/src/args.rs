use clap::Parser;
use std::path::PathBuf;

/// Driver drowsiness monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (TOML); `drowsiness.toml` is used when present
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON-lines landmark trace to replay
    #[arg(short, long)]
    pub trace: PathBuf,

    /// Pace frames at the camera rate instead of replaying as fast as possible
    #[arg(long, default_value_t = false)]
    pub realtime: bool,
}
