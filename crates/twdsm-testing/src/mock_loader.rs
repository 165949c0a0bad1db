//! In-memory stand-in for the OS dynamic loader.
//!
//! [`MockLoader`] knows a set of library names, hands out numbered handles
//! for them and logs every call so tests can check ordering and counts.
//! Clones share the same state.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::Arc;

use parking_lot::Mutex;
use twdsm_core::abi::{Dat, DataGroup, DsmEntry, Identity, Msg, ReturnCode};
use twdsm_core::loader::LibraryLoader;

/// One call made through the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderCall {
    Load { name: String, handle: Option<u64> },
    Resolve { handle: u64, symbol: String },
    Unload { handle: u64 },
}

/// Handle issued by [`MockLoader`]. Not `Clone`, like a real library handle.
#[derive(Debug, PartialEq, Eq)]
pub struct MockHandle(u64);

impl MockHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Entry function returned for libraries registered with an entry point.
pub unsafe extern "system" fn mock_dsm_entry(
    _origin: *mut Identity,
    _dest: *mut Identity,
    _dg: DataGroup,
    _dat: Dat,
    _msg: Msg,
    _data: *mut c_void,
) -> ReturnCode {
    ReturnCode::SUCCESS
}

#[derive(Debug, Default)]
struct State {
    /// Library name -> exports the entry symbol
    libraries: HashMap<String, bool>,
    /// Handle id -> library name
    live: HashMap<u64, String>,
    next_handle: u64,
    calls: Vec<LoaderCall>,
}

/// Loader that serves libraries from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct MockLoader {
    state: Arc<Mutex<State>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` loadable, exporting `DSM_Entry`.
    pub fn with_library(self, name: &str) -> Self {
        self.state.lock().libraries.insert(name.to_string(), true);
        self
    }

    /// Make `name` loadable without any entry symbol.
    pub fn with_library_without_entry(self, name: &str) -> Self {
        self.state.lock().libraries.insert(name.to_string(), false);
        self
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<LoaderCall> {
        self.state.lock().calls.clone()
    }

    /// Names passed to `load`, in order.
    pub fn load_attempts(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                LoaderCall::Load { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Handle ids issued so far, in order.
    pub fn issued_handles(&self) -> Vec<u64> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                LoaderCall::Load { handle, .. } => *handle,
                _ => None,
            })
            .collect()
    }

    pub fn resolve_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, LoaderCall::Resolve { .. }))
            .count()
    }

    /// Number of times `handle` was unloaded.
    pub fn unload_count(&self, handle: u64) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, LoaderCall::Unload { handle: h } if *h == handle))
            .count()
    }

    pub fn total_unloads(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, LoaderCall::Unload { .. }))
            .count()
    }

    /// Handles issued and not yet unloaded.
    pub fn live_handles(&self) -> usize {
        self.state.lock().live.len()
    }
}

impl LibraryLoader for MockLoader {
    type Handle = MockHandle;

    fn load(&self, name: &str) -> Option<MockHandle> {
        let mut state = self.state.lock();
        let handle = if state.libraries.contains_key(name) {
            state.next_handle += 1;
            let id = state.next_handle;
            state.live.insert(id, name.to_string());
            Some(id)
        } else {
            None
        };

        state.calls.push(LoaderCall::Load {
            name: name.to_string(),
            handle,
        });
        handle.map(MockHandle)
    }

    fn resolve(&self, handle: &MockHandle, symbol: &str) -> Option<DsmEntry> {
        let mut state = self.state.lock();
        state.calls.push(LoaderCall::Resolve {
            handle: handle.0,
            symbol: symbol.to_string(),
        });

        let exports_entry = state
            .live
            .get(&handle.0)
            .and_then(|name| state.libraries.get(name))
            .copied()
            .unwrap_or(false);

        if exports_entry && symbol == twdsm_core::abi::DSM_ENTRY_SYMBOL {
            Some(mock_dsm_entry as DsmEntry)
        } else {
            None
        }
    }

    fn unload(&self, handle: MockHandle) {
        let mut state = self.state.lock();
        state.live.remove(&handle.0);
        state.calls.push(LoaderCall::Unload { handle: handle.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_library_fails() {
        let loader = MockLoader::new();
        assert!(loader.load("missing").is_none());
        assert_eq!(loader.load_attempts(), vec!["missing".to_string()]);
        assert!(loader.issued_handles().is_empty());
    }

    #[test]
    fn test_handles_are_unique() {
        let loader = MockLoader::new().with_library("dsm");
        let a = loader.load("dsm").unwrap();
        let b = loader.load("dsm").unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(loader.live_handles(), 2);

        loader.unload(a);
        assert_eq!(loader.live_handles(), 1);
        assert_eq!(loader.total_unloads(), 1);
    }

    #[test]
    fn test_resolve_respects_exports() {
        let loader = MockLoader::new()
            .with_library("dsm")
            .with_library_without_entry("other");

        let dsm = loader.load("dsm").unwrap();
        let other = loader.load("other").unwrap();
        assert!(loader.resolve(&dsm, "DSM_Entry").is_some());
        assert!(loader.resolve(&dsm, "dsm_entry").is_none());
        assert!(loader.resolve(&other, "DSM_Entry").is_none());
        assert_eq!(loader.resolve_count(), 3);
    }
}
