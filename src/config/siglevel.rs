// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses the `SigLevel` and `Usage` values of pacman.conf.

use crate::alpm::{DbUsage, SigLevel};

/// Which signatures a `SigLevel` token applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Both,
    Package,
    Database,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Never,
    Optional,
    Required,
    TrustedOnly,
    TrustAll,
}

/// One token of a `SigLevel` value, e.g. `DatabaseOptional`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SigRule {
    scope: Scope,
    rule: Rule,
}

/// Parse a whitespace separated `SigLevel` value.
///
/// # Errors
/// Returns the first token that is not understood.
pub(crate) fn parse_sig_rules(value: &str) -> Result<Vec<SigRule>, String> {
    value
        .split_whitespace()
        .map(|token| {
            let (scope, rest) = if let Some(rest) = token.strip_prefix("Package") {
                (Scope::Package, rest)
            } else if let Some(rest) = token.strip_prefix("Database") {
                (Scope::Database, rest)
            } else {
                (Scope::Both, token)
            };
            let rule = match rest {
                "Never" => Rule::Never,
                "Optional" => Rule::Optional,
                "Required" => Rule::Required,
                "TrustedOnly" => Rule::TrustedOnly,
                "TrustAll" => Rule::TrustAll,
                _ => return Err(token.to_string()),
            };
            Ok(SigRule { scope, rule })
        })
        .collect()
}

/// Apply rules on top of an inherited level, in order.
pub(crate) fn apply_sig_rules(base: SigLevel, rules: &[SigRule]) -> SigLevel {
    let mut level = base;
    for rule in rules {
        let targets: &[(SigLevel, SigLevel, SigLevel)] = match rule.scope {
            Scope::Both => &[PACKAGE_BITS, DATABASE_BITS],
            Scope::Package => &[PACKAGE_BITS],
            Scope::Database => &[DATABASE_BITS],
        };
        for &(check, optional, trust) in targets {
            match rule.rule {
                Rule::Never => level.remove(check),
                Rule::Optional => level.insert(check | optional),
                Rule::Required => {
                    level.insert(check);
                    level.remove(optional);
                }
                Rule::TrustedOnly => level.remove(trust),
                Rule::TrustAll => level.insert(trust),
            }
        }
    }
    level
}

// (verify, optional, marginal|unknown trust) bits per scope.
const PACKAGE_BITS: (SigLevel, SigLevel, SigLevel) = (
    SigLevel::PACKAGE,
    SigLevel::PACKAGE_OPTIONAL,
    SigLevel::PACKAGE_MARGINAL_OK.union(SigLevel::PACKAGE_UNKNOWN_OK),
);
const DATABASE_BITS: (SigLevel, SigLevel, SigLevel) = (
    SigLevel::DATABASE,
    SigLevel::DATABASE_OPTIONAL,
    SigLevel::DATABASE_MARGINAL_OK.union(SigLevel::DATABASE_UNKNOWN_OK),
);

/// Parse a whitespace separated `Usage` value.
///
/// # Errors
/// Returns the first token that is not understood.
pub(crate) fn parse_usage(value: &str) -> Result<DbUsage, String> {
    value
        .split_whitespace()
        .try_fold(DbUsage::NONE, |usage, token| {
            let flag = match token {
                "Sync" => DbUsage::SYNC,
                "Search" => DbUsage::SEARCH,
                "Install" => DbUsage::INSTALL,
                "Upgrade" => DbUsage::UPGRADE,
                "All" => DbUsage::ALL,
                _ => return Err(token.to_string()),
            };
            Ok(usage | flag)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(value: &str, base: SigLevel) -> SigLevel {
        apply_sig_rules(base, &parse_sig_rules(value).unwrap())
    }

    #[test]
    fn test_required_database_optional() {
        let result = level("Required DatabaseOptional", SigLevel::NONE);
        assert_eq!(
            result,
            SigLevel::PACKAGE | SigLevel::DATABASE | SigLevel::DATABASE_OPTIONAL
        );
    }

    #[test]
    fn test_never_clears_verification() {
        assert_eq!(
            level("Never", SigLevel::default()),
            SigLevel::PACKAGE_OPTIONAL | SigLevel::DATABASE_OPTIONAL
        );
        assert_eq!(
            level("PackageNever", SigLevel::PACKAGE | SigLevel::DATABASE),
            SigLevel::DATABASE
        );
    }

    #[test]
    fn test_trust_tokens() {
        let all = level("DatabaseTrustAll", SigLevel::NONE);
        assert!(all.contains(SigLevel::DATABASE_MARGINAL_OK));
        assert!(all.contains(SigLevel::DATABASE_UNKNOWN_OK));
        assert!(!all.contains(SigLevel::PACKAGE_MARGINAL_OK));
        assert_eq!(level("TrustedOnly", all), SigLevel::NONE);
    }

    #[test]
    fn test_unknown_sig_token() {
        assert_eq!(
            parse_sig_rules("Optional Sometimes"),
            Err("Sometimes".to_string())
        );
    }

    #[test]
    fn test_usage_tokens_accumulate() {
        assert_eq!(
            parse_usage("Sync Search").unwrap(),
            DbUsage::SYNC | DbUsage::SEARCH
        );
        assert_eq!(parse_usage("All").unwrap(), DbUsage::ALL);
        assert_eq!(parse_usage("Everything"), Err("Everything".to_string()));
    }
}
