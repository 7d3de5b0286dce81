use std::path::PathBuf;

/// Result alias for the conversion core.
pub type Result<T> = std::result::Result<T, ConversionError>;

/// Failures raised while converting one original.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The encoder could not open, encode, or write a target.
    #[error("encoding {} failed: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: webpforge_encode::Error,
    },

    /// The encoder reported success but the artifact is unusable.
    #[error("invalid artifact {}: {reason}", path.display())]
    Validation { path: PathBuf, reason: String },

    /// The metadata backend failed.
    #[error("metadata lookup failed: {0}")]
    Metadata(#[from] webpforge_common::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    pub fn encode(path: impl Into<PathBuf>, source: webpforge_encode::Error) -> Self {
        Self::Encode {
            path: path.into(),
            source,
        }
    }

    pub fn validation(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the fallback protocol handles this error for a single target.
    ///
    /// Metadata and filesystem errors are not: they abort the current file.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Encode { .. } | Self::Validation { .. })
    }
}
