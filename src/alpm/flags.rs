// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Bit sets passed to libalpm when registering sync databases.

use serde::Serialize;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Signature verification level of a package or database (`alpm_siglevel_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SigLevel(u32);

impl SigLevel {
    pub const NONE: Self = Self(0);
    pub const PACKAGE: Self = Self(1 << 0);
    pub const PACKAGE_OPTIONAL: Self = Self(1 << 1);
    pub const PACKAGE_MARGINAL_OK: Self = Self(1 << 2);
    pub const PACKAGE_UNKNOWN_OK: Self = Self(1 << 3);
    pub const DATABASE: Self = Self(1 << 10);
    pub const DATABASE_OPTIONAL: Self = Self(1 << 11);
    pub const DATABASE_MARGINAL_OK: Self = Self(1 << 12);
    pub const DATABASE_UNKNOWN_OK: Self = Self(1 << 13);
    pub const USE_DEFAULT: Self = Self(1 << 30);

    /// Verify the database signature if present, do not fail if absent.
    pub const DATABASE_IF_PRESENT: Self = Self::DATABASE.union(Self::DATABASE_OPTIONAL);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl Default for SigLevel {
    /// pacman's built-in default: optional signatures for packages and databases.
    fn default() -> Self {
        Self::PACKAGE | Self::PACKAGE_OPTIONAL | Self::DATABASE | Self::DATABASE_OPTIONAL
    }
}

impl BitOr for SigLevel {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SigLevel {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for SigLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Operations a sync database may be used for (`alpm_db_usage_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DbUsage(u32);

impl DbUsage {
    pub const NONE: Self = Self(0);
    pub const SYNC: Self = Self(1 << 0);
    pub const SEARCH: Self = Self(1 << 1);
    pub const INSTALL: Self = Self(1 << 2);
    pub const UPGRADE: Self = Self(1 << 3);
    pub const ALL: Self = Self((1 << 4) - 1);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for DbUsage {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for DbUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DbUsage {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
