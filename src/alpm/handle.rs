// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Scoped ownership of one libalpm handle, plus borrowed views of the databases and
//! packages that live inside it.

use std::fmt;
use std::path::Path;
use tracing::{debug, error, warn};

use super::{AlpmError, AlpmResult, DbUsage, Library, SigLevel};
use crate::package::Package;

/// Exclusive owner of an initialized library handle.
///
/// The handle is released exactly once: by [`Handle::release`] or when the value is dropped,
/// whichever comes first. [`Handle::take`] moves the resource into a new owner and leaves
/// this one inert.
pub struct Handle<'l, L: Library> {
    library: &'l L,
    raw: Option<L::RawHandle>,
}

impl<'l, L: Library> Handle<'l, L> {
    /// Initialize a handle for the given root filesystem and database directory.
    ///
    /// # Errors
    /// Returns [`AlpmError::Initialize`] if the library refuses to create a handle (bad
    /// paths, lock held, insufficient permissions).
    pub fn initialize(library: &'l L, root: &Path, db_path: &Path) -> AlpmResult<Self> {
        debug!(root = %root.display(), db_path = %db_path.display(), "initializing alpm");
        match library.initialize(root, db_path) {
            Ok(raw) => Ok(Self {
                library,
                raw: Some(raw),
            }),
            Err(e) => {
                error!("failed to initialize alpm: {e}");
                Err(e)
            }
        }
    }

    /// Whether this wrapper no longer owns a handle.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.raw.is_none()
    }

    /// Move the owned handle into a new wrapper, leaving `self` inert.
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            library: self.library,
            raw: self.raw.take(),
        }
    }

    /// The raw library handle, for calls this wrapper does not cover.
    ///
    /// The returned value must neither be released nor kept beyond the lifetime of `self`.
    #[must_use]
    pub fn as_raw(&self) -> Option<L::RawHandle> {
        self.raw
    }

    /// Release the handle now. Does nothing on an inert wrapper.
    ///
    /// # Errors
    /// Returns an error if the library reports a failure while releasing. The wrapper is
    /// inert afterwards either way.
    pub fn release(&mut self) -> AlpmResult<()> {
        let Some(raw) = self.raw.take() else {
            return Ok(());
        };
        debug!("releasing alpm handle");
        // SAFETY: `raw` was live and is no longer reachable through `self`.
        unsafe { self.library.release(raw) }
    }

    fn live(&self) -> AlpmResult<L::RawHandle> {
        self.raw.ok_or(AlpmError::HandleReleased)
    }

    /// Register a sync database by name.
    ///
    /// # Errors
    /// Returns an error if the handle is inert or the library rejects the database.
    pub fn register_syncdb(&self, name: &str, level: SigLevel) -> AlpmResult<SyncDb<'_, L>> {
        let handle = self.live()?;
        debug!(db = name, %level, "registering sync database");
        // SAFETY: `handle` is live for as long as `self` is borrowed.
        let raw = unsafe { self.library.register_syncdb(handle, name, level)? };
        Ok(SyncDb {
            handle: self,
            raw,
            name: name.to_string(),
        })
    }

    /// Find a package satisfying a name or `name<op>version` constraint among all
    /// registered sync databases. Provider resolution is done by the library.
    ///
    /// # Errors
    /// Returns an error if the handle is inert or the lookup string is not representable.
    pub fn find_satisfier(&self, depstring: &str) -> AlpmResult<Option<PackageRef<'_, L>>> {
        let handle = self.live()?;
        // SAFETY: `handle` is live for as long as `self` is borrowed.
        let raw = unsafe { self.library.find_dbs_satisfier(handle, depstring)? };
        Ok(raw.map(|raw| PackageRef { handle: self, raw }))
    }
}

impl<L: Library> Drop for Handle<'_, L> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("{e}");
        }
    }
}

impl<L: Library> fmt::Debug for Handle<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("inert", &self.is_inert())
            .finish()
    }
}

/// A sync database registered against a [`Handle`]. Cannot outlive the handle.
pub struct SyncDb<'h, L: Library> {
    handle: &'h Handle<'h, L>,
    raw: L::RawDb,
    name: String,
}

impl<L: Library> SyncDb<'_, L> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Restrict what the database may be used for.
    ///
    /// # Errors
    /// Returns an error if the library rejects the usage mask.
    pub fn set_usage(&self, usage: DbUsage) -> AlpmResult<()> {
        let handle = self.handle.live()?;
        // SAFETY: the database was registered against `handle`, which is borrowed and live.
        unsafe { self.handle.library.set_db_usage(handle, self.raw, usage) }
    }
}

/// A package inside one of a [`Handle`]'s databases. Cannot outlive the handle; use
/// [`PackageRef::to_package`] to keep the data.
pub struct PackageRef<'h, L: Library> {
    handle: &'h Handle<'h, L>,
    raw: L::RawPackage,
}

// SAFETY (all methods): a `PackageRef` is only created from a live handle and keeps it
// borrowed, so the handle cannot be released while the package is reachable.
impl<L: Library> PackageRef<'_, L> {
    /// # Errors
    /// Returns an error if the library has no name for the package.
    pub fn name(&self) -> AlpmResult<String> {
        unsafe { self.handle.library.package_name(self.raw) }
    }

    /// # Errors
    /// Returns an error if the library has no version for the package.
    pub fn version(&self) -> AlpmResult<String> {
        unsafe { self.handle.library.package_version(self.raw) }
    }

    #[must_use]
    pub fn repository(&self) -> Option<String> {
        unsafe { self.handle.library.package_db_name(self.raw) }
    }

    /// Direct dependencies rendered as dependency-specification strings.
    ///
    /// # Errors
    /// Returns an error if a dependency cannot be rendered.
    pub fn depends(&self) -> AlpmResult<Vec<String>> {
        unsafe { self.handle.library.package_depends(self.raw) }
    }

    /// Copy everything into an owned [`Package`].
    ///
    /// # Errors
    /// Returns an error if any field cannot be read.
    pub fn to_package(&self) -> AlpmResult<Package> {
        Ok(Package::new(
            self.name()?,
            self.version()?,
            self.repository(),
            self.depends()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alpm::testing::FakeLibrary;

    fn initialize(library: &FakeLibrary) -> Handle<'_, FakeLibrary> {
        Handle::initialize(library, Path::new("/"), Path::new("/var/lib/pacman/")).unwrap()
    }

    #[test_log::test]
    fn test_initialize_failure_holds_nothing() {
        let library = FakeLibrary::new().failing_initialize("unable to lock database");
        let result = Handle::initialize(&library, Path::new("/"), Path::new("/nonexistent"));

        match result {
            Err(AlpmError::Initialize { message, db_path, .. }) => {
                assert_eq!(message, "unable to lock database");
                assert_eq!(db_path, Path::new("/nonexistent"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(library.live_handles(), 0);
        assert!(library.released().is_empty());
    }

    #[test]
    fn test_drop_releases_exactly_once() {
        let library = FakeLibrary::new();
        {
            let handle = initialize(&library);
            assert!(!handle.is_inert());
            assert_eq!(library.live_handles(), 1);
        }
        assert_eq!(library.released(), [1]);
        assert_eq!(library.live_handles(), 0);
    }

    #[test]
    fn test_explicit_release_is_idempotent() {
        let library = FakeLibrary::new();
        let mut handle = initialize(&library);
        handle.release().unwrap();
        handle.release().unwrap();
        assert!(handle.is_inert());
        drop(handle);
        assert_eq!(library.released(), [1]);
    }

    #[test]
    fn test_take_leaves_source_inert() {
        let library = FakeLibrary::new();
        let mut source = initialize(&library);
        let raw = source.as_raw();

        let mut target = source.take();
        assert!(source.is_inert());
        assert_eq!(source.as_raw(), None);
        assert_eq!(target.as_raw(), raw);

        // Releasing the moved-from wrapper must not touch the resource now owned by target.
        source.release().unwrap();
        drop(source);
        assert!(library.released().is_empty());

        target.release().unwrap();
        assert_eq!(library.released(), [1]);
    }

    #[test]
    fn test_take_into_existing_owner_releases_previous_resource() {
        let library = FakeLibrary::new();
        let mut first = initialize(&library);
        let mut second = initialize(&library);
        assert!(!second.is_inert());

        // Assigning over `second` drops its old handle.
        second = first.take();
        assert_eq!(library.released(), [2]);

        drop(first);
        drop(second);
        assert_eq!(library.released(), [2, 1]);
    }

    #[test]
    fn test_inert_handle_rejects_operations() {
        let library = FakeLibrary::new();
        let mut handle = initialize(&library);
        handle.release().unwrap();

        assert!(matches!(
            handle.register_syncdb("core", SigLevel::DATABASE_IF_PRESENT),
            Err(AlpmError::HandleReleased)
        ));
        assert!(matches!(
            handle.find_satisfier("bash"),
            Err(AlpmError::HandleReleased)
        ));
    }

    #[test]
    fn test_register_and_set_usage() {
        let library = FakeLibrary::new();
        let handle = initialize(&library);

        let db = handle
            .register_syncdb("core", SigLevel::DATABASE_IF_PRESENT)
            .unwrap();
        db.set_usage(DbUsage::ALL).unwrap();
        assert_eq!(db.name(), "core");

        let registrations = library.registrations();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0].level, SigLevel::DATABASE_IF_PRESENT);
        assert_eq!(registrations[0].usage, DbUsage::ALL);
    }

    #[test]
    fn test_package_outlives_handle_after_copy() {
        let library =
            FakeLibrary::new().with_package("extra", "git", "2.47.0-1", &["curl", "perl"]);
        let package = {
            let handle = initialize(&library);
            handle
                .register_syncdb("extra", SigLevel::DATABASE_IF_PRESENT)
                .unwrap();
            let found = handle.find_satisfier("git").unwrap().unwrap();
            found.to_package().unwrap()
        };

        assert_eq!(library.live_handles(), 0);
        assert_eq!(package.name(), "git");
        assert_eq!(package.repository(), Some("extra"));
        assert_eq!(package.depends(), ["curl", "perl"]);
    }
}
