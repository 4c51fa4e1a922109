// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Rendering of lookup and dependency graph results for the command line.

mod console;
mod validate;

pub use console::{summarize_generations, summarize_package, summarize_resolution};
pub use validate::{validate_lookups, validate_resolution};

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::package::Package;
use crate::query::QueryResult;

/// The outcome of looking up one requested name.
#[derive(Debug)]
pub struct Lookup {
    pub requested: String,
    pub result: QueryResult<Package>,
}

impl Lookup {
    #[must_use]
    pub fn new(requested: impl Into<String>, result: QueryResult<Package>) -> Self {
        Self {
            requested: requested.into(),
            result,
        }
    }
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    requested: &'a str,
    #[serde(flatten)]
    package: &'a Package,
}

/// Write all found packages as a pretty JSON array.
///
/// # Errors
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(lookups: &[Lookup], writer: W) -> Result<()> {
    let entries: Vec<JsonEntry<'_>> = lookups
        .iter()
        .filter_map(|lookup| {
            lookup.result.as_ref().ok().map(|package| JsonEntry {
                requested: &lookup.requested,
                package,
            })
        })
        .collect();
    write_pretty(&entries, writer)
}

/// Write any serializable value as pretty JSON followed by a newline.
///
/// # Errors
/// Returns an error if serialization or writing fails.
pub fn write_pretty<T: Serialize + ?Sized, W: Write>(value: &T, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| "Failed to serialize output to JSON")?;
    writeln!(writer).with_context(|| "Failed to write JSON output")?;
    Ok(())
}
