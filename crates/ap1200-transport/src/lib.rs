//! Half-duplex radio transport abstraction.
//!
//! This is the lowest layer of ap1200. A transport moves raw frames over the
//! air and reports how many bit errors the modem corrected or detected for
//! each reception. It knows nothing about packet framing.
//!
//! Provided here:
//! - [`RadioTransport`], the trait every modem or simulation implements
//! - [`IntegrityTracker`], which turns bit-error counts into a 0-1 score
//! - [`LoopbackRadio`], an in-memory station pair for tests and demos
//! - [`DatagramRadio`], a shared-medium simulation over Unix datagram sockets

pub mod error;
pub mod integrity;
pub mod loopback;
pub mod traits;

#[cfg(unix)]
pub mod datagram;

pub use error::{Result, TransportError};
pub use integrity::{IntegrityTracker, MIN_MEASURED_LEN};
pub use loopback::LoopbackRadio;
pub use traits::{RadioTransport, Reception};

#[cfg(unix)]
pub use datagram::DatagramRadio;
