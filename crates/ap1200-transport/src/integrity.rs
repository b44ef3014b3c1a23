use tracing::{trace, warn};

/// Receptions must be longer than this many bytes to update integrity.
///
/// Anything shorter is a noise burst, not a frame worth measuring.
pub const MIN_MEASURED_LEN: usize = 12;

/// Tracks the integrity of the most recent reception.
///
/// Integrity approximates the fraction of error-free bytes:
/// `1 - bit_errors / received_len`, clamped to `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrityTracker {
    integrity: f64,
}

impl IntegrityTracker {
    /// Create a tracker. Integrity starts at 1.0 before anything is received.
    pub fn new() -> Self {
        Self { integrity: 1.0 }
    }

    /// Record one reception.
    ///
    /// Receptions of [`MIN_MEASURED_LEN`] bytes or fewer leave the previous
    /// value untouched.
    pub fn record(&mut self, received: &[u8], bit_errors: usize) {
        let len = received.len();
        if len <= MIN_MEASURED_LEN {
            trace!(len, bit_errors, "reception too short to measure integrity");
            return;
        }

        let ratio = 1.0 - bit_errors as f64 / len as f64;
        if ratio < 0.0 {
            warn!(len, bit_errors, "bit errors exceed received length; clamping integrity to 0");
        }
        self.integrity = ratio.clamp(0.0, 1.0);
        trace!(len, bit_errors, integrity = self.integrity, "integrity updated");
    }

    /// Integrity of the most recent measured reception.
    pub fn integrity(&self) -> f64 {
        self.integrity
    }
}

impl Default for IntegrityTracker {
    fn default() -> Self {
        Self::new()
    }
}
