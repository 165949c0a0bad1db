//! Error type for the DSM binding.

/// Errors raised while binding to the Data Source Manager.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DsmError {
    /// No library could be loaded under any candidate name.
    #[error("Data Source Manager not found (tried: {})", .attempted.join(", "))]
    LoadFailed { attempted: Vec<String> },

    /// An operation needed a loaded library.
    #[error("Data Source Manager is not loaded")]
    NotLoaded,

    /// The library loaded but does not export the entry symbol.
    #[error("Symbol {symbol} not found in {library}")]
    SymbolNotFound {
        symbol: &'static str,
        library: String,
    },

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, DsmError>;

impl From<toml::de::Error> for DsmError {
    fn from(e: toml::de::Error) -> Self {
        DsmError::Config(e.to_string())
    }
}
