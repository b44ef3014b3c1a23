use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// One reception from the air: the raw bytes plus the modem's bit-error count.
///
/// Empty `data` means nothing arrived before the timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reception {
    /// Raw received bytes, unframed.
    pub data: Bytes,
    /// Bit errors the modem counted while receiving `data`.
    pub bit_errors: usize,
}

impl Reception {
    /// Create a reception.
    pub fn new(data: impl Into<Bytes>, bit_errors: usize) -> Self {
        Self {
            data: data.into(),
            bit_errors,
        }
    }

    /// A reception that carries nothing (timeout or no signal).
    pub fn empty() -> Self {
        Self::default()
    }

    /// True if nothing was received.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes received.
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// A half-duplex raw byte transport such as a radio modem.
///
/// Implementations are single-consumer: callers must not transmit and
/// receive concurrently on the same transport.
pub trait RadioTransport {
    /// Transmit one raw frame. Fire-and-forget: no acknowledgement.
    fn transmit(&mut self, frame: &[u8]) -> Result<()>;

    /// Block until a transmission is caught or `timeout` elapses.
    ///
    /// `None` blocks indefinitely. A timeout is not an error: it yields
    /// [`Reception::empty`].
    fn receive(&mut self, timeout: Option<Duration>) -> Result<Reception>;
}

impl<T: RadioTransport + ?Sized> RadioTransport for &mut T {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        (**self).transmit(frame)
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Reception> {
        (**self).receive(timeout)
    }
}

impl<T: RadioTransport + ?Sized> RadioTransport for Box<T> {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        (**self).transmit(frame)
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Reception> {
        (**self).receive(timeout)
    }
}
