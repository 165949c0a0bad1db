//! Testing utilities for twdsm
//!
//! This crate provides:
//! - A mock loader that records every load, resolve and unload call
//! - A tracing subscriber helper for tests

pub mod mock_loader;

pub use mock_loader::{mock_dsm_entry, LoaderCall, MockHandle, MockLoader};

/// Install a compact tracing subscriber for tests. Safe to call repeatedly.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("twdsm_core=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .compact()
        .try_init();
}
