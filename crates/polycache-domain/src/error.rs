//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for polycache
#[derive(Error, Debug)]
pub enum Error {
    /// Key rejected by the normalizer (empty or reduced to nothing)
    #[error("Invalid cache key: {message}")]
    InvalidKey {
        /// Description of why the key was rejected
        message: String,
    },

    /// Value the target backend cannot store
    #[error("Invalid cache value: {message}")]
    InvalidValue {
        /// Description of why the value was rejected
        message: String,
    },

    /// Engine could not be constructed (backend unreachable, directory
    /// unwritable, unsupported configuration). Terminal: no engine instance
    /// exists after this error.
    #[error("Engine initialization failed: {message}")]
    Initialization {
        /// Description of the initialization failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation not implementable with the required semantics by this
    /// backend. Raised loudly so callers relying on atomicity fail fast.
    #[error("Unsupported operation: {message}")]
    Unsupported {
        /// Description of the unsupported operation
        message: String,
    },

    /// Stored payload failed to decode. Read paths report the entry as a
    /// miss instead of surfacing this.
    #[error("Corrupt cache entry: {message}")]
    CorruptEntry {
        /// Description of the decode failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transient backend failure on a single call (network, connection,
    /// storage). Never retried at this layer.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O operation error (with context)
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

// Key and value rejection constructors
impl Error {
    /// Create an invalid key error
    pub fn invalid_key<S: Into<String>>(message: S) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value<S: Into<String>>(message: S) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }
}

// Initialization error constructors
impl Error {
    /// Create an initialization error
    pub fn initialization<S: Into<String>>(message: S) -> Self {
        Self::Initialization {
            message: message.into(),
            source: None,
        }
    }

    /// Create an initialization error with source
    pub fn initialization_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Initialization {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Per-call failure constructors
impl Error {
    /// Create an unsupported operation error
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create a corrupt entry error
    pub fn corrupt<S: Into<String>>(message: S) -> Self {
        Self::CorruptEntry {
            message: message.into(),
            source: None,
        }
    }

    /// Create a corrupt entry error with source
    pub fn corrupt_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::CorruptEntry {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a backend error
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend error with source
    pub fn backend_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// I/O error constructors
impl Error {
    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl Error {
    /// True when a read path should report this error as a plain miss
    /// rather than propagate it.
    pub fn is_corrupt_entry(&self) -> bool {
        matches!(self, Self::CorruptEntry { .. })
    }
}
