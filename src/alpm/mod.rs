// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Access to libalpm. The [`Library`] trait describes the C API surface that is consumed,
//! [`Alpm`] implements it on top of the system library and [`Handle`] owns one initialized
//! library handle for the duration of a scope.

mod error;
mod ffi;
mod flags;
mod handle;
#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

pub use error::{AlpmError, AlpmResult};
pub use ffi::Alpm;
pub use flags::{DbUsage, SigLevel};
pub use handle::{Handle, PackageRef, SyncDb};

/// The subset of the libalpm API used by this crate.
///
/// Raw values handed out by an implementation are only meaningful to the same
/// implementation and only while the handle they belong to is alive. Every method taking
/// one is therefore `unsafe`; [`Handle`] is the only safe way to drive a library.
pub trait Library {
    /// Opaque handle returned by [`Library::initialize`].
    type RawHandle: Copy;
    /// Sync database registered against a handle.
    type RawDb: Copy;
    /// Package owned by one of the handle's databases.
    type RawPackage: Copy;

    /// Create a new handle for the given root filesystem and database directory.
    ///
    /// # Errors
    /// Returns [`AlpmError::Initialize`] carrying the library's error string.
    fn initialize(&self, root: &Path, db_path: &Path) -> AlpmResult<Self::RawHandle>;

    /// Release a handle and everything registered against it.
    ///
    /// # Safety
    /// `handle` must be live and must not be used afterwards.
    unsafe fn release(&self, handle: Self::RawHandle) -> AlpmResult<()>;

    /// Register a sync database by name.
    ///
    /// # Safety
    /// `handle` must be live.
    unsafe fn register_syncdb(
        &self,
        handle: Self::RawHandle,
        name: &str,
        level: SigLevel,
    ) -> AlpmResult<Self::RawDb>;

    /// Set what a registered database may be used for.
    ///
    /// # Safety
    /// `handle` must be live and `db` must be registered against it.
    unsafe fn set_db_usage(
        &self,
        handle: Self::RawHandle,
        db: Self::RawDb,
        usage: DbUsage,
    ) -> AlpmResult<()>;

    /// Find a package satisfying `depstring` among all sync databases of the handle.
    ///
    /// # Safety
    /// `handle` must be live.
    unsafe fn find_dbs_satisfier(
        &self,
        handle: Self::RawHandle,
        depstring: &str,
    ) -> AlpmResult<Option<Self::RawPackage>>;

    /// # Safety
    /// `package` must belong to a live handle.
    unsafe fn package_name(&self, package: Self::RawPackage) -> AlpmResult<String>;

    /// # Safety
    /// `package` must belong to a live handle.
    unsafe fn package_version(&self, package: Self::RawPackage) -> AlpmResult<String>;

    /// Name of the database the package was found in, if any.
    ///
    /// # Safety
    /// `package` must belong to a live handle.
    unsafe fn package_db_name(&self, package: Self::RawPackage) -> Option<String>;

    /// Direct dependencies rendered as dependency-specification strings, in library order.
    ///
    /// # Safety
    /// `package` must belong to a live handle.
    unsafe fn package_depends(&self, package: Self::RawPackage) -> AlpmResult<Vec<String>>;
}
