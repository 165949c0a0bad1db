//! Operating-system loader primitives.
//!
//! [`LibraryLoader`] is the seam between [`DsmLib`](crate::dsm::DsmLib) and
//! the OS: load a library by name, resolve the entry symbol, release the
//! handle. [`SystemLoader`] is the production implementation on top of
//! `libloading`.

use libloading::Library;

use crate::abi::DsmEntry;

/// Load, resolve and unload primitives of a dynamic loader.
pub trait LibraryLoader {
    /// Token for one loaded library. Dropping it without calling
    /// [`unload`](Self::unload) is allowed but skips loader bookkeeping.
    type Handle;

    /// Load the library known as `name`, or `None` if the loader fails.
    fn load(&self, name: &str) -> Option<Self::Handle>;

    /// Look up `symbol` in a loaded library.
    fn resolve(&self, handle: &Self::Handle, symbol: &str) -> Option<DsmEntry>;

    /// Release a library. Failures are not reported.
    fn unload(&self, handle: Self::Handle);
}

/// Loader backed by the platform's dynamic linker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoader;

impl LibraryLoader for SystemLoader {
    type Handle = Library;

    fn load(&self, name: &str) -> Option<Library> {
        // Loading runs the library's initialisers; the DSM is a trusted
        // system component.
        match unsafe { os::open(name) } {
            Ok(library) => Some(library),
            Err(e) => {
                tracing::debug!("Failed to load {}: {}", name, e);
                None
            }
        }
    }

    fn resolve(&self, library: &Library, symbol: &str) -> Option<DsmEntry> {
        match unsafe { library.get::<DsmEntry>(symbol.as_bytes()) } {
            Ok(entry) => Some(*entry),
            Err(e) => {
                tracing::debug!("Symbol {} not found: {}", symbol, e);
                None
            }
        }
    }

    fn unload(&self, library: Library) {
        if let Err(e) = library.close() {
            tracing::warn!("Failed to unload Data Source Manager: {}", e);
        }
    }
}

#[cfg(unix)]
mod os {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_LAZY, RTLD_LOCAL};
    use libloading::{Error, Library};

    pub(super) unsafe fn open(name: &str) -> Result<Library, Error> {
        UnixLibrary::open(Some(name), RTLD_LAZY | RTLD_LOCAL).map(Library::from)
    }
}

#[cfg(windows)]
mod os {
    use libloading::{Error, Library};

    pub(super) unsafe fn open(name: &str) -> Result<Library, Error> {
        Library::new(name)
    }
}
