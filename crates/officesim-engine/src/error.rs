//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can stop the engine during
//! startup or shutdown. Failures inside the frame loop never reach it;
//! they are isolated and logged where they happen.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: officesim_core::ConfigError,
    },

    /// The office could not be built from the configuration.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: officesim_core::SetupError,
    },

    /// Loading or writing the save failed.
    #[error("persistence error: {source}")]
    Persistence {
        /// The underlying persistence error.
        #[from]
        source: officesim_core::PersistenceError,
    },
}
