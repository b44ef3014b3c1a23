/// Errors that can occur while decoding or assembling packets.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer ends before the header or the declared payload does.
    #[error("truncated frame ({available} bytes, need {needed})")]
    Truncated { needed: usize, available: usize },

    /// The declared payload length exceeds the protocol maximum.
    #[error("payload length {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// An address field holds bytes that are not ASCII.
    #[error("{field} address is not ASCII")]
    InvalidAddress { field: &'static str },

    /// A group payload has no room for another member packet.
    #[error("group is full ({used} of {max} payload bytes used, member needs {needed})")]
    GroupFull {
        used: usize,
        needed: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
