use anyhow::Context;
use clap::Subcommand;
use serde_json::Value;
use std::time::Duration;
use tiercache::{Cache, EntryOptions};

/// How a command finished, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// `get` found nothing and had no default to print
    Missing,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the value stored under a key as JSON
    Get {
        key: String,
        /// JSON printed when the key is absent
        #[arg(long)]
        default: Option<String>,
    },
    /// Store a value; input that is not valid JSON is stored as a string
    Set {
        key: String,
        value: String,
        /// Time to live in seconds (defaults to the configured TTL)
        #[arg(long)]
        ttl: Option<f64>,
        /// Keys whose invalidation also removes this entry
        #[arg(long = "depends-on", num_args = 1..)]
        depends_on: Vec<String>,
    },
    /// Remove a single entry without touching its dependents
    Remove { key: String },
    /// Remove an entry and everything that depends on it
    Invalidate { key: String },
    /// Remove every entry, dependency record and access pattern
    Clear,
    /// Evict from disk until the size limit holds
    Sweep,
    /// Show cache statistics
    Stats {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

impl Commands {
    pub fn execute(self, cache: &Cache) -> anyhow::Result<Outcome> {
        match self {
            Commands::Get { key, default } => {
                let value = match cache.try_get::<Value>(&key) {
                    Some(value) => value,
                    None => match default {
                        Some(raw) => serde_json::from_str(&raw)
                            .with_context(|| format!("--default is not valid JSON: {raw}"))?,
                        None => {
                            tracing::warn!(key, "not found");
                            return Ok(Outcome::Missing);
                        }
                    },
                };
                println!("{}", serde_json::to_string_pretty(&value)?);
                Ok(Outcome::Done)
            }
            Commands::Set {
                key,
                value,
                ttl,
                depends_on,
            } => {
                let mut options = EntryOptions::new().dependencies(depends_on);
                if let Some(secs) = ttl {
                    let ttl = Duration::try_from_secs_f64(secs)
                        .with_context(|| format!("invalid --ttl: {secs}"))?;
                    options = options.ttl(ttl);
                }
                cache.set_with(&key, parse_value(value), options)?;
                tracing::info!(key, "stored");
                Ok(Outcome::Done)
            }
            Commands::Remove { key } => {
                cache.remove(&key);
                Ok(Outcome::Done)
            }
            Commands::Invalidate { key } => {
                let removed = cache.invalidate(&key);
                println!("{removed}");
                Ok(Outcome::Done)
            }
            Commands::Clear => {
                cache.clear();
                tracing::info!("cache cleared");
                Ok(Outcome::Done)
            }
            Commands::Sweep => {
                match cache.sweep() {
                    Some(report) => println!(
                        "evicted {} ({} dependents), freed {} bytes, {} bytes remain",
                        report.evicted,
                        report.invalidated,
                        report.freed_bytes,
                        report.remaining_bytes
                    ),
                    None => println!("sweep skipped"),
                }
                Ok(Outcome::Done)
            }
            Commands::Stats { json } => {
                let stats = cache.get_stats();
                let disk_bytes = if cache.config().cache_type.uses_disk() {
                    Some(cache.disk_usage()?)
                } else {
                    None
                };
                if json {
                    let mut out = serde_json::to_value(stats)?;
                    if let Some(object) = out.as_object_mut() {
                        object.insert("disk_bytes".to_string(), disk_bytes.into());
                        object.insert("hit_rate".to_string(), stats.hit_rate().into());
                    }
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    println!("{stats}");
                    if let Some(bytes) = disk_bytes {
                        println!("disk bytes:       {bytes}");
                    }
                }
                Ok(Outcome::Done)
            }
            Commands::Config => {
                println!("# source: {:?}", cache.config_source());
                println!("{}", serde_json::to_string_pretty(cache.config())?);
                Ok(Outcome::Done)
            }
        }
    }
}

fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}
