// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Implements [`Library`] on top of the system libalpm, resolved at runtime.

use libc::{c_char, c_int, c_void};
use std::ffi::{CStr, CString};
use std::marker::{PhantomData, PhantomPinned};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr::NonNull;
use tracing::debug;

use super::{AlpmError, AlpmResult, DbUsage, Library, SigLevel};

/// Shared objects tried in order by [`Alpm::load`].
const LIBRARY_CANDIDATES: [&str; 4] = [
    "libalpm.so.15",
    "libalpm.so.14",
    "libalpm.so.13",
    "libalpm.so",
];

// Opaque library types. Only ever handled behind pointers.
#[repr(C)]
pub struct AlpmHandle {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

#[repr(C)]
pub struct AlpmDb {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

#[repr(C)]
pub struct AlpmPkg {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

#[repr(C)]
struct AlpmDepend {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// `alpm_list_t`: the library's doubly linked list.
#[repr(C)]
struct AlpmList {
    data: *mut c_void,
    #[allow(dead_code)]
    prev: *mut AlpmList,
    next: *mut AlpmList,
}

type InitializeFn =
    unsafe extern "C" fn(*const c_char, *const c_char, *mut c_int) -> *mut AlpmHandle;
type ReleaseFn = unsafe extern "C" fn(*mut AlpmHandle) -> c_int;
type ErrnoFn = unsafe extern "C" fn(*mut AlpmHandle) -> c_int;
type StrerrorFn = unsafe extern "C" fn(c_int) -> *const c_char;
type RegisterSyncdbFn = unsafe extern "C" fn(*mut AlpmHandle, *const c_char, c_int) -> *mut AlpmDb;
type DbSetUsageFn = unsafe extern "C" fn(*mut AlpmDb, c_int) -> c_int;
type DbGetNameFn = unsafe extern "C" fn(*const AlpmDb) -> *const c_char;
type GetSyncdbsFn = unsafe extern "C" fn(*mut AlpmHandle) -> *mut AlpmList;
type FindDbsSatisfierFn =
    unsafe extern "C" fn(*mut AlpmHandle, *mut AlpmList, *const c_char) -> *mut AlpmPkg;
type PkgGetStringFn = unsafe extern "C" fn(*mut AlpmPkg) -> *const c_char;
type PkgGetDbFn = unsafe extern "C" fn(*mut AlpmPkg) -> *mut AlpmDb;
type PkgGetDependsFn = unsafe extern "C" fn(*mut AlpmPkg) -> *mut AlpmList;
type DepComputeStringFn = unsafe extern "C" fn(*const AlpmDepend) -> *mut c_char;

/// Function pointers resolved from the shared object.
struct Symbols {
    initialize: InitializeFn,
    release: ReleaseFn,
    errno: ErrnoFn,
    strerror: StrerrorFn,
    register_syncdb: RegisterSyncdbFn,
    db_set_usage: DbSetUsageFn,
    db_get_name: DbGetNameFn,
    get_syncdbs: GetSyncdbsFn,
    find_dbs_satisfier: FindDbsSatisfierFn,
    pkg_get_name: PkgGetStringFn,
    pkg_get_version: PkgGetStringFn,
    pkg_get_db: PkgGetDbFn,
    pkg_get_depends: PkgGetDependsFn,
    dep_compute_string: DepComputeStringFn,
}

impl Symbols {
    fn resolve(library: &libloading::Library) -> AlpmResult<Self> {
        // SAFETY: every type below matches the prototype declared in alpm.h.
        unsafe {
            Ok(Self {
                initialize: symbol(library, "alpm_initialize")?,
                release: symbol(library, "alpm_release")?,
                errno: symbol(library, "alpm_errno")?,
                strerror: symbol(library, "alpm_strerror")?,
                register_syncdb: symbol(library, "alpm_register_syncdb")?,
                db_set_usage: symbol(library, "alpm_db_set_usage")?,
                db_get_name: symbol(library, "alpm_db_get_name")?,
                get_syncdbs: symbol(library, "alpm_get_syncdbs")?,
                find_dbs_satisfier: symbol(library, "alpm_find_dbs_satisfier")?,
                pkg_get_name: symbol(library, "alpm_pkg_get_name")?,
                pkg_get_version: symbol(library, "alpm_pkg_get_version")?,
                pkg_get_db: symbol(library, "alpm_pkg_get_db")?,
                pkg_get_depends: symbol(library, "alpm_pkg_get_depends")?,
                dep_compute_string: symbol(library, "alpm_dep_compute_string")?,
            })
        }
    }
}

/// Look up a function symbol.
///
/// # Safety
/// `T` must be the exact function pointer type of the symbol.
unsafe fn symbol<T: Copy>(library: &libloading::Library, name: &'static str) -> AlpmResult<T> {
    library
        .get::<T>(name.as_bytes())
        .map(|symbol| *symbol)
        .map_err(|source| AlpmError::MissingSymbol {
            symbol: name,
            source,
        })
}

fn c_string(value: &str) -> AlpmResult<CString> {
    CString::new(value).map_err(|source| AlpmError::InteriorNul {
        value: value.to_string(),
        source,
    })
}

fn c_path(path: &Path) -> AlpmResult<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|source| AlpmError::InteriorNul {
        value: path.to_string_lossy().to_string(),
        source,
    })
}

/// Copy a library-owned string.
///
/// # Safety
/// `ptr` must be null or point to a nul-terminated string.
unsafe fn owned_string(ptr: *const c_char) -> Option<String> {
    (!ptr.is_null()).then(|| CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

/// The system libalpm.
///
/// Symbols are resolved once when the library is loaded; the shared object stays mapped for
/// as long as this value lives, so handles must be dropped before it.
pub struct Alpm {
    symbols: Symbols,
    _library: libloading::Library,
}

impl Alpm {
    /// Load the first libalpm found on the system.
    ///
    /// # Errors
    /// Returns an error if no candidate could be loaded or a required symbol is missing.
    pub fn load() -> AlpmResult<Self> {
        // SAFETY: libalpm has no initialization routines with preconditions.
        let mut opened = unsafe { libloading::Library::new(LIBRARY_CANDIDATES[0]) };
        for candidate in &LIBRARY_CANDIDATES[1..] {
            if opened.is_ok() {
                break;
            }
            // SAFETY: as above.
            opened = unsafe { libloading::Library::new(candidate) };
        }
        let library = opened.map_err(|source| AlpmError::LibraryUnavailable {
            candidates: LIBRARY_CANDIDATES.join(", "),
            source,
        })?;
        Self::from_library(library)
    }

    /// Load libalpm from a specific shared object.
    ///
    /// # Errors
    /// Returns an error if the file cannot be loaded or a required symbol is missing.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AlpmResult<Self> {
        // SAFETY: the caller points us at a libalpm build.
        let library = unsafe { libloading::Library::new(path.as_ref()) }.map_err(|source| {
            AlpmError::LibraryUnavailable {
                candidates: path.as_ref().display().to_string(),
                source,
            }
        })?;
        Self::from_library(library)
    }

    fn from_library(library: libloading::Library) -> AlpmResult<Self> {
        let symbols = Symbols::resolve(&library)?;
        debug!("resolved libalpm symbols");
        Ok(Self {
            symbols,
            _library: library,
        })
    }

    fn strerror(&self, code: c_int) -> String {
        // SAFETY: alpm_strerror accepts any value and returns a static string.
        unsafe { owned_string((self.symbols.strerror)(code)) }
            .unwrap_or_else(|| format!("unknown error {code}"))
    }

    /// Error code and message last recorded on the handle.
    ///
    /// # Safety
    /// `handle` must be live.
    unsafe fn last_error(&self, handle: NonNull<AlpmHandle>) -> (i32, String) {
        let code = (self.symbols.errno)(handle.as_ptr());
        (code, self.strerror(code))
    }

    /// # Safety
    /// `db` must be registered against a live handle.
    unsafe fn db_name(&self, db: NonNull<AlpmDb>) -> Option<String> {
        owned_string((self.symbols.db_get_name)(db.as_ptr()))
    }
}

impl Library for Alpm {
    type RawHandle = NonNull<AlpmHandle>;
    type RawDb = NonNull<AlpmDb>;
    type RawPackage = NonNull<AlpmPkg>;

    fn initialize(&self, root: &Path, db_path: &Path) -> AlpmResult<Self::RawHandle> {
        let root_c = c_path(root)?;
        let db_path_c = c_path(db_path)?;
        let mut code: c_int = 0;
        // SAFETY: both strings outlive the call and `code` is a valid out pointer.
        let handle =
            unsafe { (self.symbols.initialize)(root_c.as_ptr(), db_path_c.as_ptr(), &mut code) };
        NonNull::new(handle).ok_or_else(|| AlpmError::Initialize {
            root: root.to_path_buf(),
            db_path: db_path.to_path_buf(),
            code,
            message: self.strerror(code),
        })
    }

    unsafe fn release(&self, handle: Self::RawHandle) -> AlpmResult<()> {
        // The handle is gone after this call, so its errno cannot be queried.
        match (self.symbols.release)(handle.as_ptr()) {
            0 => Ok(()),
            code => Err(AlpmError::Release {
                code,
                message: "alpm_release reported a failure".to_string(),
            }),
        }
    }

    unsafe fn register_syncdb(
        &self,
        handle: Self::RawHandle,
        name: &str,
        level: SigLevel,
    ) -> AlpmResult<Self::RawDb> {
        let name_c = c_string(name)?;
        let level = level.bits() as c_int;
        let db = (self.symbols.register_syncdb)(handle.as_ptr(), name_c.as_ptr(), level);
        NonNull::new(db).ok_or_else(|| {
            let (code, message) = self.last_error(handle);
            AlpmError::RegisterSyncDb {
                name: name.to_string(),
                code,
                message,
            }
        })
    }

    unsafe fn set_db_usage(
        &self,
        handle: Self::RawHandle,
        db: Self::RawDb,
        usage: DbUsage,
    ) -> AlpmResult<()> {
        if (self.symbols.db_set_usage)(db.as_ptr(), usage.bits() as c_int) == 0 {
            return Ok(());
        }
        let (code, message) = self.last_error(handle);
        Err(AlpmError::SetDbUsage {
            name: self.db_name(db).unwrap_or_default(),
            code,
            message,
        })
    }

    unsafe fn find_dbs_satisfier(
        &self,
        handle: Self::RawHandle,
        depstring: &str,
    ) -> AlpmResult<Option<Self::RawPackage>> {
        let depstring_c = c_string(depstring)?;
        let dbs = (self.symbols.get_syncdbs)(handle.as_ptr());
        if dbs.is_null() {
            debug!(depstring, "no sync databases registered");
            return Ok(None);
        }
        let package =
            (self.symbols.find_dbs_satisfier)(handle.as_ptr(), dbs, depstring_c.as_ptr());
        if package.is_null() {
            // Not found and failures both come back as null; keep the reason for debugging.
            let (code, message) = self.last_error(handle);
            debug!(depstring, code, %message, "no satisfier");
        }
        Ok(NonNull::new(package))
    }

    unsafe fn package_name(&self, package: Self::RawPackage) -> AlpmResult<String> {
        owned_string((self.symbols.pkg_get_name)(package.as_ptr()))
            .ok_or(AlpmError::NullString { what: "package name" })
    }

    unsafe fn package_version(&self, package: Self::RawPackage) -> AlpmResult<String> {
        owned_string((self.symbols.pkg_get_version)(package.as_ptr()))
            .ok_or(AlpmError::NullString {
                what: "package version",
            })
    }

    unsafe fn package_db_name(&self, package: Self::RawPackage) -> Option<String> {
        NonNull::new((self.symbols.pkg_get_db)(package.as_ptr())).and_then(|db| self.db_name(db))
    }

    unsafe fn package_depends(&self, package: Self::RawPackage) -> AlpmResult<Vec<String>> {
        let mut depends = Vec::new();
        let mut node = (self.symbols.pkg_get_depends)(package.as_ptr());
        while let Some(item) = NonNull::new(node) {
            let item = item.as_ref();
            let rendered = (self.symbols.dep_compute_string)(item.data.cast::<AlpmDepend>());
            if rendered.is_null() {
                return Err(AlpmError::NullString {
                    what: "dependency string",
                });
            }
            depends.push(CStr::from_ptr(rendered).to_string_lossy().into_owned());
            // alpm_dep_compute_string hands ownership of a malloc'd buffer to the caller.
            libc::free(rendered.cast::<c_void>());
            node = item.next;
        }
        Ok(depends)
    }
}
