// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.
mod args;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use alai::alpm::{Alpm, Library};
use alai::config::PacmanConfig;
use alai::graph::Resolution;
use alai::query::Query;
use alai::report::{
    summarize_generations, summarize_package, summarize_resolution, validate_lookups,
    validate_resolution, write_json, write_pretty, Lookup,
};
use args::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let config = create_config(&args)?;
    let library = Alpm::load().with_context(|| "Failed to load libalpm")?;
    let query = Query::new(&library, &config);

    if args.graph || args.affected_by.is_some() {
        run_graph(&query, &args)
    } else {
        run_lookups(&query, &args)
    }
}

/// Look up every requested package on its own.
///
/// # Errors
/// Returns an error if output fails or any lookup failed.
fn run_lookups<L: Library>(query: &Query<'_, L>, args: &Args) -> Result<()> {
    let lookups: Vec<Lookup> = args
        .packages
        .iter()
        .map(|name| Lookup::new(name.as_str(), query.find_package(name)))
        .collect();

    if args.json {
        write_json(&lookups, std::io::stdout().lock())?;
    } else {
        for lookup in &lookups {
            if let Ok(package) = &lookup.result {
                summarize_package(&lookup.requested, package);
            }
        }
    }
    validate_lookups(&lookups)
}

/// Resolve the dependency closure of the requested packages, then print it or the
/// generations affected by `--affected-by`.
///
/// # Errors
/// Returns an error if a lookup fails, output fails, or a requested package is missing.
fn run_graph<L: Library>(query: &Query<'_, L>, args: &Args) -> Result<()> {
    let resolution = Resolution::resolve(query, &args.packages)
        .with_context(|| "Failed to resolve dependencies")?;

    match &args.affected_by {
        Some(origin) => {
            let generations = resolution.dependents().generations(origin);
            if args.json {
                write_pretty(&generations, std::io::stdout().lock())?;
            } else {
                summarize_generations(origin, &generations);
            }
        }
        None if args.json => write_pretty(&resolution, std::io::stdout().lock())?,
        None => summarize_resolution(&resolution),
    }
    validate_resolution(&resolution)
}

/// Install the stderr log subscriber.
///
/// # Errors
/// Returns an error if the filter directive cannot be parsed.
fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("Invalid log filter: {filter}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

/// Build the lookup configuration from an optional pacman.conf and the path overrides.
///
/// A new root moves a database path that was derived from the old one; `--db-path` and a
/// configured `DBPath` stay put.
///
/// # Errors
/// Returns an error if the configuration file cannot be read or parsed.
fn create_config(args: &Args) -> Result<PacmanConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => PacmanConfig::default(),
    };
    if let Some(root_dir) = &args.root_dir {
        config.set_root_dir(root_dir.clone());
    }
    if let Some(db_path) = &args.db_path {
        config.db_path.clone_from(db_path);
    }
    tracing::debug!(?config, "using configuration");
    Ok(config)
}

fn read_config(path: &Path) -> Result<PacmanConfig> {
    PacmanConfig::from_file(path)
        .with_context(|| format!("Failed to read configuration: {}", path.display()))
}
