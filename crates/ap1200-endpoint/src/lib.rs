//! Addressable AP1200 network endpoint.
//!
//! An endpoint is bound to one local address and port. It stamps outgoing
//! packets, transmits them fire-and-forget, and runs the blocking receive
//! loop that drops everything not addressed to it.

pub mod config;
pub mod endpoint;
pub mod error;

pub use config::{EndpointConfig, HeaderFormat};
pub use endpoint::NetworkEndpoint;
pub use error::{EndpointError, Result};
