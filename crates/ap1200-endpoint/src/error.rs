use crate::config::HeaderFormat;

/// Errors that can occur in endpoint operations.
///
/// Malformed frames are never errors here; they decode to the empty packet.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] ap1200_transport::TransportError),

    /// Packet assembly error.
    #[error("frame error: {0}")]
    Frame(#[from] ap1200_frame::FrameError),

    /// Grouping was requested on an endpoint whose header format has no GROUP flag.
    #[error("grouping is not available with the {0} header format")]
    GroupingUnsupported(HeaderFormat),
}

pub type Result<T> = std::result::Result<T, EndpointError>;
