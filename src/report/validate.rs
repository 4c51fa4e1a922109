// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Turns failed lookups into a single error for the exit status.

use anyhow::Result;

use super::Lookup;
use crate::graph::Resolution;

/// Validate the lookups.
///
/// # Errors
/// Returns an error if any lookup failed. Each failure is printed to stderr first.
pub fn validate_lookups(lookups: &[Lookup]) -> Result<()> {
    let mut not_found = 0;
    let mut failed = 0;
    for lookup in lookups {
        if let Err(error) = &lookup.result {
            eprintln!("ERROR: {}: {}", lookup.requested, error_chain(error));
            if error.is_not_found() {
                not_found += 1;
            } else {
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(anyhow::anyhow!(
            "Package lookups failed: {failed} failed, {not_found} not found"
        ));
    }
    if not_found > 0 {
        return Err(anyhow::anyhow!(
            "Packages not found: {not_found} of {} requested",
            lookups.len()
        ));
    }
    Ok(())
}

/// Validate a dependency closure.
///
/// Unresolved dependencies deeper in the closure are reported as warnings only.
///
/// # Errors
/// Returns an error if a requested package itself could not be resolved.
pub fn validate_resolution(resolution: &Resolution) -> Result<()> {
    let missing = resolution.missing_roots();
    for name in resolution.unresolved() {
        if !missing.contains(&name.as_str()) {
            eprintln!("WARNING: unresolved dependency: {name}");
        }
    }
    for name in &missing {
        eprintln!("ERROR: {name}: no package satisfies it");
    }
    if !missing.is_empty() {
        return Err(anyhow::anyhow!(
            "Packages not found: {} of {} requested",
            missing.len(),
            resolution.roots().len()
        ));
    }
    Ok(())
}

// Flattens the source chain so the printed line carries the library's message.
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alpm::AlpmError;
    use crate::package::Package;
    use crate::query::QueryError;

    fn found(name: &str) -> Lookup {
        Lookup::new(name, Ok(Package::new(name, "1.0-1", None, Vec::new())))
    }

    #[test]
    fn test_all_found_is_ok() {
        assert!(validate_lookups(&[found("bash"), found("git")]).is_ok());
        assert!(validate_lookups(&[]).is_ok());
    }

    #[test]
    fn test_not_found_is_an_error() {
        let lookups = [
            found("bash"),
            Lookup::new(
                "nope",
                Err(QueryError::NotFound {
                    name: "nope".to_string(),
                }),
            ),
        ];
        let error = validate_lookups(&lookups).unwrap_err();
        assert_eq!(error.to_string(), "Packages not found: 1 of 2 requested");
    }

    #[test]
    fn test_failures_take_precedence() {
        let lookups = [
            Lookup::new(
                "bash",
                Err(QueryError::Initialize(AlpmError::HandleReleased)),
            ),
            Lookup::new(
                "nope",
                Err(QueryError::NotFound {
                    name: "nope".to_string(),
                }),
            ),
        ];
        let error = validate_lookups(&lookups).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Package lookups failed: 1 failed, 1 not found"
        );
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let error = QueryError::Initialize(AlpmError::HandleReleased);
        let message = error_chain(&error);
        assert!(message.starts_with("Failed to initialize the package database: "));
        assert!(message.len() > "Failed to initialize the package database: ".len());
    }

    #[test]
    fn test_resolution_with_missing_root_is_an_error() {
        use crate::alpm::testing::FakeLibrary;
        use crate::config::PacmanConfig;
        use crate::query::Query;

        let library = FakeLibrary::new().with_package("core", "bash", "5.2.037-1", &["nope"]);
        let config = PacmanConfig::default();
        let query = Query::new(&library, &config);

        let resolution = Resolution::resolve(&query, ["bash"]).unwrap();
        assert!(validate_resolution(&resolution).is_ok());

        let resolution = Resolution::resolve(&query, ["bash", "absent"]).unwrap();
        let error = validate_resolution(&resolution).unwrap_err();
        assert_eq!(error.to_string(), "Packages not found: 1 of 2 requested");
    }
}
