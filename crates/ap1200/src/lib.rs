//! Lightweight addressed packet protocol for half-duplex radio links.
//!
//! ap1200 gives every datagram a fixed 20-byte addressing header, a
//! length-delimited payload of up to 1024 bytes and a flag byte, and delivers
//! datagrams to endpoints filtered by destination address and port.
//!
//! # Crate Structure
//!
//! - [`transport`] - Radio transport trait, integrity tracking, loopback and datagram media
//! - [`frame`] - Wire format, addresses, flags, packets and grouping
//! - [`endpoint`] - Addressable filtering endpoint (behind `endpoint` feature)

/// Re-export transport types.
pub mod transport {
    pub use ap1200_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ap1200_frame::*;
}

/// Re-export endpoint types (requires `endpoint` feature).
#[cfg(feature = "endpoint")]
pub mod endpoint {
    pub use ap1200_endpoint::*;
}
