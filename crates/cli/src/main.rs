use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tiercache::{Cache, CacheConfig};
use tiercache_utils::XdgPaths;

mod commands;

use commands::{Commands, Outcome};

#[derive(Parser)]
#[command(name = "tiercache")]
#[command(about = "Inspect and manipulate a tiercache directory", long_about = None)]
#[command(version)]
struct Cli {
    /// Cache directory (defaults to $XDG_CACHE_HOME/tiercache)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let directive = match cli.verbose {
        0 => "warn",
        1 => "tiercache=debug",
        _ => "tiercache=trace",
    };
    tiercache_utils::logging::init(directive)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let root = cli.root.unwrap_or_else(XdgPaths::cache_dir);
    tracing::debug!(root = %root.display(), "opening cache");
    let cache = Cache::open(root, CacheConfig::default())?;

    match cli.command.execute(&cache)? {
        Outcome::Done => Ok(ExitCode::SUCCESS),
        Outcome::Missing => Ok(ExitCode::FAILURE),
    }
}
