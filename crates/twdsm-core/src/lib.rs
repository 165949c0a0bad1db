//! Runtime binding for the TWAIN Data Source Manager.
//!
//! This crate loads the platform DSM shared library, resolves its
//! `DSM_Entry` function and defines the fixed-layout records exchanged with
//! it. Protocol semantics built on top of the entry function live elsewhere.

pub mod abi;
pub mod config;
pub mod dsm;
pub mod error;
pub mod loader;
pub mod platform;

pub use abi::{
    CallBack, CallBack2, CallBackFunc, CallbackConstant, Dat, DataGroup, DsmEntry, EntryPoint,
    Identity, MemoryCallbacks, Msg, ReturnCode, DSM_ENTRY_SYMBOL,
};
pub use config::DsmConfig;
pub use dsm::{DsmLib, DsmState};
pub use error::{DsmError, Result};
pub use loader::{LibraryLoader, SystemLoader};
pub use platform::SearchPolicy;

/// Re-exports commonly used types.
pub mod prelude {
    // Binding
    pub use crate::dsm::{DsmLib, DsmState};
    pub use crate::loader::{LibraryLoader, SystemLoader};
    pub use crate::platform::SearchPolicy;

    // ABI descriptors
    pub use crate::abi::{
        CallBack, CallBack2, Dat, DataGroup, DsmEntry, EntryPoint, Identity, Msg, ReturnCode,
    };

    // Configuration
    pub use crate::config::{env_vars, DsmConfig};

    // Error handling
    pub use crate::error::{DsmError, Result};
}
