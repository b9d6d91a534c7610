//! Locating and loading the native engines

use crate::error::{Error, Result};
use infozip_sys::{LoadError, UnzipLibrary, ZipLibrary};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) trait NativeLibrary: Sized {
    fn default_path() -> OsString;

    /// # Safety
    /// See [`ZipLibrary::open`].
    unsafe fn open(path: &OsStr) -> std::result::Result<Self, LoadError>;
}

impl NativeLibrary for ZipLibrary {
    fn default_path() -> OsString {
        ZipLibrary::default_path()
    }

    unsafe fn open(path: &OsStr) -> std::result::Result<Self, LoadError> {
        unsafe { ZipLibrary::open(path) }
    }
}

impl NativeLibrary for UnzipLibrary {
    fn default_path() -> OsString {
        UnzipLibrary::default_path()
    }

    unsafe fn open(path: &OsStr) -> std::result::Result<Self, LoadError> {
        unsafe { UnzipLibrary::open(path) }
    }
}

/// Where a façade gets its engine from
#[derive(Debug)]
pub(crate) enum LibrarySource<L> {
    /// Environment override, else the platform file name
    Default,
    /// Explicit path
    Path(PathBuf),
    /// Already loaded or constructed
    Loaded(Arc<L>),
}

impl<L> Clone for LibrarySource<L> {
    fn clone(&self) -> Self {
        match self {
            LibrarySource::Default => LibrarySource::Default,
            LibrarySource::Path(path) => LibrarySource::Path(path.clone()),
            LibrarySource::Loaded(library) => LibrarySource::Loaded(Arc::clone(library)),
        }
    }
}

impl<L: NativeLibrary> LibrarySource<L> {
    /// Load the engine for one operation
    pub(crate) fn resolve(&self) -> Result<Arc<L>> {
        let path = match self {
            LibrarySource::Loaded(library) => return Ok(Arc::clone(library)),
            LibrarySource::Path(path) => path.clone().into_os_string(),
            LibrarySource::Default => L::default_path(),
        };

        debug!(library = ?path, "loading engine");
        // SAFETY: the Info-ZIP engines have no load-time preconditions beyond exporting
        // the entry points resolved by `open`.
        match unsafe { L::open(&path) } {
            Ok(library) => Ok(Arc::new(library)),
            Err(e) => {
                warn!(library = ?path, "engine unavailable: {}", e);
                Err(Error::LibraryUnavailable {
                    library: path.to_string_lossy().into_owned(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
