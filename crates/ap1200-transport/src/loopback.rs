use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use bytes::Bytes;
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{RadioTransport, Reception};

/// An in-memory station connected to exactly one other station.
///
/// Frames transmitted by one side are received, in order, by the other.
/// Each reception reports the bit-error count configured on the receiving
/// station, which lets tests drive integrity tracking.
#[derive(Debug)]
pub struct LoopbackRadio {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
    bit_errors: usize,
}

impl LoopbackRadio {
    /// Create two stations that hear each other.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        (
            Self {
                tx: a_tx,
                rx: a_rx,
                bit_errors: 0,
            },
            Self {
                tx: b_tx,
                rx: b_rx,
                bit_errors: 0,
            },
        )
    }

    /// Report `bit_errors` on every subsequent reception at this station.
    pub fn set_bit_errors(&mut self, bit_errors: usize) {
        self.bit_errors = bit_errors;
    }

    /// Bit errors currently reported per reception.
    pub fn bit_errors(&self) -> usize {
        self.bit_errors
    }
}

impl RadioTransport for LoopbackRadio {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        trace!(len = frame.len(), "loopback transmit");
        self.tx
            .send(Bytes::copy_from_slice(frame))
            .map_err(|_| TransportError::Shutdown)
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Reception> {
        let data = match timeout {
            None => self.rx.recv().map_err(|_| TransportError::Shutdown)?,
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(data) => data,
                Err(RecvTimeoutError::Timeout) => return Ok(Reception::empty()),
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Shutdown),
            },
        };
        trace!(len = data.len(), "loopback receive");
        Ok(Reception::new(data, self.bit_errors))
    }
}
