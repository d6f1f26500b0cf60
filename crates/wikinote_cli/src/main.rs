//! WikiNote cache maintenance CLI
//!
//! Host-facing surface over the cache registry: clearing, listing and
//! inspecting the cache files the WikiNote extension leaves on disk.

mod cli;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wikinote_cache::{CacheConfig, CacheRegistry, VALIDATION_KEY};

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = CacheConfig::default();
    if let Some(root) = cli.root {
        config.root = root;
    }

    match cli.command {
        Commands::Clear { name, all } => {
            let mut registry = CacheRegistry::new(config);
            if all {
                registry.clear_all().into_diagnostic()?;
                info!(
                    "Cleared all caches under {}",
                    registry.config().root.display()
                );
            } else if let Some(name) = name {
                registry.clear(&name).into_diagnostic()?;
                info!("Cleared cache {name}");
            }
        }
        Commands::List => list_caches(&config.root)?,
        Commands::Show { name } => show_cache(&config.root, &name)?,
    }

    Ok(())
}

/// Lists cache files under the root with their entry counts.
fn list_caches(root: &Path) -> Result<()> {
    let mut names = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            {
                names.push((stem.to_string(), path.clone()));
            }
        }
    }
    names.sort();

    if names.is_empty() {
        println!("No caches found under {}", root.display());
        return Ok(());
    }

    for (name, path) in names {
        match read_entries(&path) {
            Ok(entries) => println!("{name}\t{} entries", entries.len()),
            Err(_) => println!("{name}\t(corrupted)"),
        }
    }
    Ok(())
}

/// Prints the caller-defined contents of one cache as pretty JSON.
fn show_cache(root: &Path, name: &str) -> Result<()> {
    let path = root.join(format!("{name}.json"));
    if !path.exists() {
        return Err(miette!("No cache named {name} under {}", root.display()));
    }

    let entries = read_entries(&path)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&Value::Object(entries)).into_diagnostic()?
    );
    Ok(())
}

/// Reads a cache file, dropping the internal validation stamp.
fn read_entries(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path).into_diagnostic()?;
    let mut entries: Map<String, Value> = serde_json::from_str(&content).into_diagnostic()?;
    entries.remove(VALIDATION_KEY);
    Ok(entries)
}
