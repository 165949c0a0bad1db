//! Ownership of the loaded Data Source Manager.
//!
//! [`DsmLib`] holds at most one library handle. It is move-only: moving the
//! binding moves the handle, [`DsmLib::take`] moves it out and leaves the
//! source empty, and dropping the binding unloads whatever it still holds.
//!
//! Calling [`DsmLib::load`] on a binding that is already loaded is a no-op
//! that reports success. To switch libraries, [`unload`](DsmLib::unload)
//! first.

use std::fmt::{self, Debug, Formatter};

use crate::abi::{DsmEntry, DSM_ENTRY_SYMBOL};
use crate::config::DsmConfig;
use crate::error::{DsmError, Result};
use crate::loader::{LibraryLoader, SystemLoader};
use crate::platform::{SearchPolicy, PLATFORM_LABEL};

/// Lifecycle state of a [`DsmLib`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsmState {
    Unloaded,
    Loaded,
}

/// Binding to one loaded DSM library.
///
/// No internal locking: mutating calls take `&mut self`, so concurrent use
/// of one instance has to be serialized by the owner.
pub struct DsmLib<L: LibraryLoader = SystemLoader> {
    loader: L,
    policy: SearchPolicy,
    handle: Option<L::Handle>,
    loaded_name: Option<String>,
}

impl DsmLib<SystemLoader> {
    /// Binding that uses the system loader and the platform search names.
    pub fn new() -> Self {
        Self::with_loader(SystemLoader)
    }

    /// Binding that uses the system loader and the configured search names.
    pub fn from_config(config: &DsmConfig) -> Self {
        Self::with_policy(SystemLoader, config.search_policy())
    }
}

impl<L: LibraryLoader + Default> Default for DsmLib<L> {
    fn default() -> Self {
        Self::with_loader(L::default())
    }
}

impl<L: LibraryLoader> DsmLib<L> {
    pub fn with_loader(loader: L) -> Self {
        Self::with_policy(loader, SearchPolicy::platform())
    }

    pub fn with_policy(loader: L, policy: SearchPolicy) -> Self {
        Self {
            loader,
            policy,
            handle: None,
            loaded_name: None,
        }
    }

    /// Whether a library is currently held.
    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    pub fn state(&self) -> DsmState {
        if self.is_loaded() {
            DsmState::Loaded
        } else {
            DsmState::Unloaded
        }
    }

    /// Name the current library was loaded under.
    pub fn loaded_name(&self) -> Option<&str> {
        self.loaded_name.as_deref()
    }

    pub fn search_policy(&self) -> &SearchPolicy {
        &self.policy
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Load the DSM. Returns `true` iff a library is held afterwards.
    pub fn load(&mut self, prefer_legacy: bool) -> bool {
        match self.try_load(prefer_legacy) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("{}", e);
                false
            }
        }
    }

    /// Load the DSM, reporting every name that was tried on failure.
    pub fn try_load(&mut self, prefer_legacy: bool) -> Result<()> {
        if self.handle.is_some() {
            tracing::debug!(
                "Data Source Manager already loaded from {}",
                self.loaded_name.as_deref().unwrap_or("<unknown>")
            );
            return Ok(());
        }

        let candidates = self.policy.candidates(prefer_legacy);
        for name in &candidates {
            if let Some(handle) = self.loader.load(name) {
                tracing::info!("Loaded Data Source Manager: {} ({})", name, PLATFORM_LABEL);
                self.handle = Some(handle);
                self.loaded_name = Some(name.to_string());
                return Ok(());
            }
            tracing::debug!("Data Source Manager not available as {}", name);
        }

        tracing::debug!(
            "No Data Source Manager found for {} after {} candidate(s)",
            PLATFORM_LABEL,
            candidates.len()
        );
        Err(DsmError::LoadFailed {
            attempted: candidates.iter().map(|name| name.to_string()).collect(),
        })
    }

    /// Release the library if one is held.
    pub fn unload(&mut self) {
        if let Some(handle) = self.handle.take() {
            let name = self.loaded_name.take();
            self.loader.unload(handle);
            tracing::debug!(
                "Unloaded Data Source Manager {}",
                name.as_deref().unwrap_or("<unknown>")
            );
        }
    }

    /// Look up `DSM_Entry` in the loaded library.
    ///
    /// The pointer is only valid while this binding keeps the library loaded.
    pub fn resolve(&self) -> Option<DsmEntry> {
        self.try_resolve().ok()
    }

    pub fn try_resolve(&self) -> Result<DsmEntry> {
        let handle = self.handle.as_ref().ok_or(DsmError::NotLoaded)?;
        self.loader
            .resolve(handle, DSM_ENTRY_SYMBOL)
            .ok_or_else(|| DsmError::SymbolNotFound {
                symbol: DSM_ENTRY_SYMBOL,
                library: self.loaded_name.clone().unwrap_or_default(),
            })
    }

    /// Move the held library into a new binding, leaving `self` empty.
    pub fn take(&mut self) -> Self
    where
        L: Clone,
    {
        Self {
            loader: self.loader.clone(),
            policy: self.policy.clone(),
            handle: self.handle.take(),
            loaded_name: self.loaded_name.take(),
        }
    }
}

impl<L: LibraryLoader> Drop for DsmLib<L> {
    fn drop(&mut self) {
        self.unload();
    }
}

impl<L: LibraryLoader> From<&DsmLib<L>> for bool {
    fn from(lib: &DsmLib<L>) -> bool {
        lib.is_loaded()
    }
}

impl<L: LibraryLoader> Debug for DsmLib<L> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DsmLib")
            .field("state", &self.state())
            .field("loaded_name", &self.loaded_name)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counts {
        loads: Vec<String>,
        resolves: usize,
        unloads: Vec<u32>,
        next: u32,
    }

    /// Loader that succeeds only for `available` and counts every call.
    #[derive(Clone)]
    struct CountingLoader {
        available: &'static str,
        counts: Rc<RefCell<Counts>>,
    }

    impl CountingLoader {
        fn new(available: &'static str) -> Self {
            Self {
                available,
                counts: Rc::default(),
            }
        }
    }

    impl LibraryLoader for CountingLoader {
        type Handle = u32;

        fn load(&self, name: &str) -> Option<u32> {
            let mut counts = self.counts.borrow_mut();
            counts.loads.push(name.to_string());
            if name == self.available {
                counts.next += 1;
                Some(counts.next)
            } else {
                None
            }
        }

        fn resolve(&self, _handle: &u32, _symbol: &str) -> Option<DsmEntry> {
            self.counts.borrow_mut().resolves += 1;
            None
        }

        fn unload(&self, handle: u32) {
            self.counts.borrow_mut().unloads.push(handle);
        }
    }

    #[test]
    fn test_new_binding_is_unloaded() {
        let lib = DsmLib::with_loader(CountingLoader::new("dsm"));
        assert!(!lib.is_loaded());
        assert_eq!(lib.state(), DsmState::Unloaded);
        assert!(!bool::from(&lib));
        assert!(lib.loaded_name().is_none());
    }

    #[test]
    fn test_load_and_unload() {
        let loader = CountingLoader::new("dsm");
        let mut lib = DsmLib::with_policy(loader.clone(), SearchPolicy::single("dsm"));

        assert!(lib.load(false));
        assert_eq!(lib.state(), DsmState::Loaded);
        assert_eq!(lib.loaded_name(), Some("dsm"));

        lib.unload();
        lib.unload();
        assert!(!lib.is_loaded());
        assert_eq!(loader.counts.borrow().unloads, vec![1]);
    }

    #[test]
    fn test_load_when_loaded_is_noop() {
        let loader = CountingLoader::new("dsm");
        let mut lib = DsmLib::with_policy(loader.clone(), SearchPolicy::single("dsm"));

        assert!(lib.load(false));
        assert!(lib.load(true));
        assert_eq!(loader.counts.borrow().loads.len(), 1);
        assert_eq!(lib.loader().counts.borrow().loads, vec!["dsm".to_string()]);
    }

    #[test]
    fn test_failed_load_leaves_binding_empty() {
        let loader = CountingLoader::new("elsewhere");
        let mut lib = DsmLib::with_policy(loader.clone(), SearchPolicy::single("dsm"));

        assert!(!lib.load(false));
        assert!(!lib.is_loaded());
        assert!(lib.resolve().is_none());
        assert_eq!(
            lib.try_load(false),
            Err(DsmError::LoadFailed {
                attempted: vec!["dsm".to_string()]
            })
        );
    }

    #[test]
    fn test_resolve_unloaded_skips_loader() {
        let loader = CountingLoader::new("dsm");
        let lib = DsmLib::with_policy(loader.clone(), SearchPolicy::single("dsm"));

        assert!(lib.resolve().is_none());
        assert_eq!(lib.try_resolve().unwrap_err(), DsmError::NotLoaded);
        assert_eq!(loader.counts.borrow().resolves, 0);
    }

    #[test]
    fn test_missing_symbol() {
        let loader = CountingLoader::new("dsm");
        let mut lib = DsmLib::with_policy(loader.clone(), SearchPolicy::single("dsm"));
        lib.load(false);

        assert_eq!(
            lib.try_resolve().unwrap_err(),
            DsmError::SymbolNotFound {
                symbol: "DSM_Entry",
                library: "dsm".to_string(),
            }
        );
        assert_eq!(loader.counts.borrow().resolves, 1);
    }

    #[test]
    fn test_drop_unloads_once() {
        let loader = CountingLoader::new("dsm");
        {
            let mut lib = DsmLib::with_policy(loader.clone(), SearchPolicy::single("dsm"));
            lib.load(false);
        }
        assert_eq!(loader.counts.borrow().unloads, vec![1]);
    }

    #[test]
    fn test_take_transfers_handle() {
        let loader = CountingLoader::new("dsm");
        let mut source = DsmLib::with_policy(loader.clone(), SearchPolicy::single("dsm"));
        source.load(false);

        let target = source.take();
        assert!(target.is_loaded());
        assert!(!source.is_loaded());

        drop(source);
        assert!(loader.counts.borrow().unloads.is_empty());

        drop(target);
        assert_eq!(loader.counts.borrow().unloads, vec![1]);
    }
}
