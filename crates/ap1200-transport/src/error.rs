use std::path::PathBuf;

/// Errors that can occur in radio transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind a station socket on the medium.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The medium directory could not be opened or scanned.
    #[error("failed to open medium {path}: {source}")]
    Medium {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred while transmitting or receiving.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The other side of the transport has gone away.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
