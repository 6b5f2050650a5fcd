//! CareerGuard CLI - Operator tooling for the career platform's guard layer

use std::path::{Path, PathBuf};

use anyhow::Context;
use careerguard_core::{
    ttl_from_secs, validate_negotiation_input, validate_scan_input, GuardConfig, LocalCache,
    NegotiationInput, SafetyGuard, ScanInput, TempFileRecord, TemporaryFileStorage, Validation,
};
use chrono::Duration;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "careerguard")]
#[command(about = "CareerGuard - Safety, rate limiting and TTL storage for AI requests")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config/careerguard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the sanitized form of a text
    Sanitize {
        /// Text to sanitize
        text: String,
    },
    /// Report sensitive data and placeholder markers in a text
    Inspect {
        /// Text to inspect
        text: String,
    },
    /// Validate a job posting form (JSON file)
    ValidateScan {
        /// Path to the form JSON
        file: PathBuf,
    },
    /// Validate a salary negotiation form (JSON file)
    ValidateNegotiation {
        /// Path to the form JSON
        file: PathBuf,
    },
    /// Inspect and edit the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Manage temporary files
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },
    /// Check configuration validity
    Check,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Store a JSON value
    Set {
        key: String,
        /// JSON value; bare words are stored as strings
        value: String,
        /// Lifetime in seconds (defaults to the configured TTL)
        #[arg(long)]
        ttl: Option<i64>,
    },
    /// Print a value
    Get { key: String },
    /// List keys in the namespace
    Keys,
    /// Remove one key
    Remove { key: String },
    /// Remove every key in the namespace
    Clear,
    /// Remove expired entries
    Purge,
}

#[derive(Subcommand)]
enum FilesAction {
    /// Check that a file survives a store and read-back, then delete the copy
    Store {
        /// Source file
        path: PathBuf,
        /// Lifetime in seconds (defaults to the configured TTL)
        #[arg(long)]
        ttl: Option<i64>,
    },
    /// Delete files left in the storage directory by earlier processes
    Cleanup {
        /// Minimum age in seconds, by modification time
        #[arg(long, default_value_t = 3_600)]
        older_than: i64,
    },
}

#[derive(Serialize)]
struct Inspection<'a> {
    sensitive: Vec<&'static str>,
    output_valid: bool,
    placeholder: Option<&'a str>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = GuardConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Some(Commands::Sanitize { text }) => {
            let guard = SafetyGuard::with_config(config.safety);
            println!("{}", guard.sanitize_input(&text));
        }
        Some(Commands::Inspect { text }) => {
            let guard = SafetyGuard::with_config(config.safety);
            let report = Inspection {
                sensitive: guard
                    .detect_sensitive(&text)
                    .iter()
                    .map(|k| k.label())
                    .collect(),
                output_valid: guard.validate_output(&text),
                placeholder: guard.find_placeholder(&text),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(Commands::ValidateScan { file }) => {
            let input: ScanInput = read_json(&file)?;
            report_validation(validate_scan_input(&input).into())?;
        }
        Some(Commands::ValidateNegotiation { file }) => {
            let input: NegotiationInput = read_json(&file)?;
            report_validation(validate_negotiation_input(&input).into())?;
        }
        Some(Commands::Cache { action }) => run_cache(&config, action)?,
        Some(Commands::Files { action }) => run_files(&config, action).await?,
        Some(Commands::Check) => {
            config.validate()?;
            info!("Configuration OK: {}", cli.config.display());
            print!("{}", config.to_toml()?);
        }
        None => {
            println!(
                "CareerGuard v{} - Use --help for commands",
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn report_validation(validation: Validation) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&validation)?);
    if !validation.success {
        std::process::exit(1);
    }
    Ok(())
}

fn open_cache(config: &GuardConfig) -> anyhow::Result<LocalCache> {
    // A throwaway store would forget everything between invocations
    let path = config
        .cache
        .path
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("careerguard").join("cache"));
    let cache = LocalCache::open(&path, &config.cache.namespace)
        .with_context(|| format!("opening cache at {}", path.display()))?
        .with_default_ttl(config.cache.default_ttl()?);
    Ok(cache)
}

fn run_cache(config: &GuardConfig, action: CacheAction) -> anyhow::Result<()> {
    let cache = open_cache(config)?;

    match action {
        CacheAction::Set { key, value, ttl } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            let stored = match ttl {
                Some(secs) => cache.set(&key, &value, ttl_from_secs(secs, "--ttl")?),
                None => cache.set_default(&key, &value),
            };
            if !stored {
                anyhow::bail!("failed to store '{}'", key);
            }
        }
        CacheAction::Get { key } => match cache.get::<serde_json::Value>(&key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => {
                eprintln!("'{}' not found or expired", key);
                std::process::exit(1);
            }
        },
        CacheAction::Keys => {
            for key in cache.get_keys() {
                println!("{}", key);
            }
        }
        CacheAction::Remove { key } => {
            if !cache.remove(&key) {
                eprintln!("'{}' not found", key);
            }
        }
        CacheAction::Clear => {
            info!("Cleared {} entries", cache.clear());
        }
        CacheAction::Purge => {
            info!("Purged {} expired entries", cache.purge_expired());
        }
    }

    cache.flush()?;
    Ok(())
}

async fn run_files(config: &GuardConfig, action: FilesAction) -> anyhow::Result<()> {
    let storage = match &config.files.root {
        Some(root) => TemporaryFileStorage::with_root(root),
        None => TemporaryFileStorage::new(&config.files.namespace),
    };

    match action {
        FilesAction::Store { path, ttl } => {
            let ttl = match ttl {
                Some(secs) => ttl_from_secs(secs, "--ttl")?,
                None => config.files.default_ttl()?,
            };
            let record = store_roundtrip(&storage, &path, ttl).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        FilesAction::Cleanup { older_than } => {
            let older_than = ttl_from_secs(older_than, "--older-than")?;
            let removed = storage.purge_untracked(older_than).await?;
            info!("Removed {} files from {}", removed, storage.root().display());
        }
    }

    Ok(())
}

/// Stores `path`, reads it back, and deletes the stored copy.
///
/// Tracking ends with the process, so a copy left behind would be orphaned.
async fn store_roundtrip(
    storage: &TemporaryFileStorage,
    path: &Path,
    ttl: Duration,
) -> anyhow::Result<TempFileRecord> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let record = storage.store_file(&data, filename, ttl).await?;
    let readback = storage.get_file(&record.filepath).await;
    let deleted = storage.delete_file(&record.filepath).await;

    let stored = readback?;
    anyhow::ensure!(deleted, "could not delete {}", record.filepath.display());
    anyhow::ensure!(stored.data == data, "stored bytes differ from source");
    Ok(record)
}
