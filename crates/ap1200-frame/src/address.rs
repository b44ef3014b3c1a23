use std::fmt;

/// Width of an address field on the wire.
pub const ADDRESS_LEN: usize = 8;

/// An 8-byte station identifier (callsign), space padded on the wire.
///
/// Construction never fails: longer identifiers are truncated and non-ASCII
/// characters are replaced with `?`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// All-blank address, as found in an empty packet.
    pub const BLANK: Address = Address([b' '; ADDRESS_LEN]);

    /// Build an address from a textual identifier.
    pub fn new(id: &str) -> Self {
        let mut raw = [b' '; ADDRESS_LEN];
        for (slot, ch) in raw.iter_mut().zip(id.chars()) {
            *slot = if ch.is_ascii() { ch as u8 } else { b'?' };
        }
        Self(raw)
    }

    /// Wrap raw wire bytes without validation.
    pub fn from_wire(raw: [u8; ADDRESS_LEN]) -> Self {
        Self(raw)
    }

    /// This address with every non-ASCII byte replaced by `?`, the same
    /// substitution [`Address::new`] applies.
    pub fn ascii_lossy(self) -> Self {
        let mut raw = self.0;
        for byte in raw.iter_mut().filter(|byte| !byte.is_ascii()) {
            *byte = b'?';
        }
        Self(raw)
    }

    /// Raw wire bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// True if every byte is ASCII.
    pub fn is_ascii(&self) -> bool {
        self.0.is_ascii()
    }

    /// True if the address is all spaces.
    pub fn is_blank(&self) -> bool {
        self.0 == Self::BLANK.0
    }

    /// The identifier with trailing spaces removed.
    pub fn to_trimmed(&self) -> String {
        String::from_utf8_lossy(&self.0).trim_end().to_string()
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::BLANK
    }
}

impl From<&str> for Address {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_trimmed())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:?})", String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_ids() {
        assert_eq!(Address::new("BOB").as_bytes(), b"BOB     ");
    }

    #[test]
    fn truncates_long_ids() {
        let addr = Address::new("KD9XYZ-12");
        assert_eq!(addr.as_bytes(), b"KD9XYZ-1");
        assert_eq!(addr.to_trimmed(), "KD9XYZ-1");
    }

    #[test]
    fn replaces_non_ascii() {
        let addr = Address::new("NÖDE");
        assert_eq!(addr.as_bytes(), b"N?DE    ");
        assert!(addr.is_ascii());
    }

    #[test]
    fn lossy_wire_address_matches_new() {
        let raw = *b"N\xD6DE    ";
        let addr = Address::from_wire(raw);
        assert!(!addr.is_ascii());
        assert_eq!(addr.ascii_lossy(), Address::new("NÖDE"));
    }

    #[test]
    fn blank_and_empty_are_equal() {
        assert_eq!(Address::new(""), Address::BLANK);
        assert!(Address::default().is_blank());
        assert_eq!(Address::BLANK.to_trimmed(), "");
    }

    #[test]
    fn padded_and_unpadded_compare_equal() {
        assert_eq!(Address::new("NODE1"), Address::new("NODE1   "));
        assert_ne!(Address::new("NODE1"), Address::new("NODE2"));
    }

    #[test]
    fn display_is_trimmed() {
        assert_eq!(Address::new("ALICE").to_string(), "ALICE");
    }
}
