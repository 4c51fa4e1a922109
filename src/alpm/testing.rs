// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! In-memory [`Library`] used by unit tests. Records every call so tests can check handle
//! lifecycles and registrations.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::path::Path;

use super::{AlpmError, AlpmResult, DbUsage, Library, SigLevel};
use crate::package::{Comparison, Constraint, Dependency};

/// Segment-wise version comparison, numeric where both segments are numbers. A shorter
/// version equal to the other's prefix compares equal, so `2.47.0` matches `2.47.0-1`.
fn compare_versions(left: &str, right: &str) -> Ordering {
    let separators = ['.', '-', ':'];
    left.split(separators)
        .zip(right.split(separators))
        .map(|(l, r)| match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            _ => l.cmp(r),
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn satisfies(version: &str, constraint: Option<&Constraint>) -> bool {
    let Some(constraint) = constraint else {
        return true;
    };
    let ordering = compare_versions(version, &constraint.version);
    match constraint.comparison {
        Comparison::Eq => ordering.is_eq(),
        Comparison::Lt => ordering.is_lt(),
        Comparison::Le => ordering.is_le(),
        Comparison::Gt => ordering.is_gt(),
        Comparison::Ge => ordering.is_ge(),
    }
}

#[derive(Debug, Clone)]
struct FakePackage {
    name: String,
    version: String,
    provides: Vec<String>,
    depends: Vec<String>,
}

#[derive(Debug, Clone)]
struct FakeRepository {
    name: String,
    packages: Vec<FakePackage>,
}

/// A sync database registration performed against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Registration {
    pub(crate) handle: usize,
    pub(crate) name: String,
    pub(crate) level: SigLevel,
    pub(crate) usage: DbUsage,
}

#[derive(Default)]
pub(crate) struct FakeLibrary {
    repositories: Vec<FakeRepository>,
    initialize_error: Option<String>,
    unregistrable: Vec<String>,
    next_handle: Cell<usize>,
    live: RefCell<Vec<usize>>,
    released: RefCell<Vec<usize>>,
    registrations: RefCell<Vec<Registration>>,
}

impl FakeLibrary {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a package to the named repository, creating the repository on first use.
    pub(crate) fn with_package(
        self,
        repository: &str,
        name: &str,
        version: &str,
        depends: &[&str],
    ) -> Self {
        self.with_provider(repository, name, version, &[], depends)
    }

    pub(crate) fn with_provider(
        mut self,
        repository: &str,
        name: &str,
        version: &str,
        provides: &[&str],
        depends: &[&str],
    ) -> Self {
        let package = FakePackage {
            name: name.to_string(),
            version: version.to_string(),
            provides: provides.iter().map(ToString::to_string).collect(),
            depends: depends.iter().map(ToString::to_string).collect(),
        };
        match self.repositories.iter_mut().find(|r| r.name == repository) {
            Some(existing) => existing.packages.push(package),
            None => self.repositories.push(FakeRepository {
                name: repository.to_string(),
                packages: vec![package],
            }),
        }
        self
    }

    pub(crate) fn failing_initialize(mut self, message: &str) -> Self {
        self.initialize_error = Some(message.to_string());
        self
    }

    pub(crate) fn failing_registration(mut self, repository: &str) -> Self {
        self.unregistrable.push(repository.to_string());
        self
    }

    /// Handles released so far, in release order.
    pub(crate) fn released(&self) -> Vec<usize> {
        self.released.borrow().clone()
    }

    pub(crate) fn live_handles(&self) -> usize {
        self.live.borrow().len()
    }

    pub(crate) fn registrations(&self) -> Vec<Registration> {
        self.registrations.borrow().clone()
    }

    fn assert_live(&self, handle: usize) {
        assert!(
            self.live.borrow().contains(&handle),
            "handle {handle} used after release"
        );
    }

    fn package(&self, (repository, index): (usize, usize)) -> &FakePackage {
        &self.repositories[repository].packages[index]
    }
}

impl Library for FakeLibrary {
    type RawHandle = usize;
    type RawDb = usize;
    type RawPackage = (usize, usize);

    fn initialize(&self, root: &Path, db_path: &Path) -> AlpmResult<usize> {
        if let Some(message) = &self.initialize_error {
            return Err(AlpmError::Initialize {
                root: root.to_path_buf(),
                db_path: db_path.to_path_buf(),
                code: 10,
                message: message.clone(),
            });
        }
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        self.live.borrow_mut().push(handle);
        Ok(handle)
    }

    unsafe fn release(&self, handle: usize) -> AlpmResult<()> {
        self.assert_live(handle);
        self.live.borrow_mut().retain(|h| *h != handle);
        self.released.borrow_mut().push(handle);
        Ok(())
    }

    unsafe fn register_syncdb(
        &self,
        handle: usize,
        name: &str,
        level: SigLevel,
    ) -> AlpmResult<usize> {
        self.assert_live(handle);
        if self.unregistrable.iter().any(|r| r == name) {
            return Err(AlpmError::RegisterSyncDb {
                name: name.to_string(),
                code: 14,
                message: "database already registered".to_string(),
            });
        }
        let mut registrations = self.registrations.borrow_mut();
        registrations.push(Registration {
            handle,
            name: name.to_string(),
            level,
            usage: DbUsage::NONE,
        });
        Ok(registrations.len() - 1)
    }

    unsafe fn set_db_usage(&self, handle: usize, db: usize, usage: DbUsage) -> AlpmResult<()> {
        self.assert_live(handle);
        self.registrations.borrow_mut()[db].usage = usage;
        Ok(())
    }

    unsafe fn find_dbs_satisfier(
        &self,
        handle: usize,
        depstring: &str,
    ) -> AlpmResult<Option<(usize, usize)>> {
        self.assert_live(handle);
        let Ok(dependency) = depstring.parse::<Dependency>() else {
            return Ok(None);
        };
        let searched: Vec<usize> = self
            .registrations
            .borrow()
            .iter()
            .filter(|r| r.handle == handle)
            .filter_map(|r| self.repositories.iter().position(|repo| repo.name == r.name))
            .collect();

        // Literal names take precedence over providers, across all databases. Provides are
        // unversioned here, so they only satisfy unconstrained lookups.
        let find = |matches: &dyn Fn(&FakePackage) -> bool| {
            searched.iter().find_map(|&repository| {
                self.repositories[repository]
                    .packages
                    .iter()
                    .position(matches)
                    .map(|index| (repository, index))
            })
        };
        let constraint = dependency.constraint();
        Ok(find(&|p: &FakePackage| {
            p.name == dependency.name() && satisfies(&p.version, constraint)
        })
        .or_else(|| {
            find(&|p: &FakePackage| {
                constraint.is_none() && p.provides.iter().any(|name| name == dependency.name())
            })
        }))
    }

    unsafe fn package_name(&self, package: (usize, usize)) -> AlpmResult<String> {
        Ok(self.package(package).name.clone())
    }

    unsafe fn package_version(&self, package: (usize, usize)) -> AlpmResult<String> {
        Ok(self.package(package).version.clone())
    }

    unsafe fn package_db_name(&self, (repository, _): (usize, usize)) -> Option<String> {
        Some(self.repositories[repository].name.clone())
    }

    unsafe fn package_depends(&self, package: (usize, usize)) -> AlpmResult<Vec<String>> {
        Ok(self.package(package).depends.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("2.47.0-1", "2.47.0"), Ordering::Equal);
        assert_eq!(compare_versions("2.10", "2.9"), Ordering::Greater);
        assert_eq!(compare_versions("1:1.0", "2:1.0"), Ordering::Less);
    }

    #[test]
    fn test_satisfies_constraints() {
        let constraint = |spec: &str| spec.parse::<Dependency>().unwrap().constraint().cloned();
        assert!(satisfies("2.47.0-1", constraint("git>=2.0").as_ref()));
        assert!(!satisfies("2.47.0-1", constraint("git>=99").as_ref()));
        assert!(satisfies("2.47.0-1", constraint("git=2.47.0").as_ref()));
        assert!(!satisfies("2.47.0-1", constraint("git<2.47").as_ref()));
        assert!(satisfies("2.47.0-1", None));
    }
}
