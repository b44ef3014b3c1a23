//! The structured flag byte.
//!
//! Bit index 0 is the most significant bit. Only GROUP changes how the
//! packet layer behaves; the remaining flags declare features whose payload
//! conventions belong to the application.

use std::fmt;

/// One named bit of the flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Payload is a concatenation of encoded packets.
    Group,
    /// Payload carries a checksum.
    Checksum,
    /// Payload carries a signature.
    Signature,
    /// Payload carries a key.
    Key,
    /// Payload uses a declared encoding.
    Encoding,
    /// Payload uses declared formatting.
    Formatting,
    /// Payload is encrypted.
    Encryption,
    /// Payload starts with a sub-header.
    Subheader,
}

impl Flag {
    /// All flags in bit order.
    pub const ALL: [Flag; 8] = [
        Flag::Group,
        Flag::Checksum,
        Flag::Signature,
        Flag::Key,
        Flag::Encoding,
        Flag::Formatting,
        Flag::Encryption,
        Flag::Subheader,
    ];

    /// Bit index, 0 being the most significant bit.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Mask for this flag within the flag byte.
    pub fn mask(self) -> u8 {
        0x80 >> self.index()
    }

    /// Upper-case protocol name.
    pub fn name(self) -> &'static str {
        match self {
            Flag::Group => "GROUP",
            Flag::Checksum => "CHECKSUM",
            Flag::Signature => "SIGNATURE",
            Flag::Key => "KEY",
            Flag::Encoding => "ENCODING",
            Flag::Formatting => "FORMATTING",
            Flag::Encryption => "ENCRYPTION",
            Flag::Subheader => "SUBHEADER",
        }
    }

    /// Look up a flag by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Flag> {
        Flag::ALL
            .into_iter()
            .find(|flag| flag.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The flag byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    /// No flags set.
    pub const NONE: Flags = Flags(0);

    /// Wrap a raw flag byte.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Parse the 8-character bit string form, e.g. `"10000000"`.
    ///
    /// Returns `None` unless the input is exactly eight `0`/`1` characters.
    pub fn from_bit_str(text: &str) -> Option<Self> {
        if text.len() != 8 || !text.bytes().all(|b| b == b'0' || b == b'1') {
            return None;
        }
        u8::from_str_radix(text, 2).ok().map(Self)
    }

    /// Raw flag byte.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Read one flag.
    pub fn get(self, flag: Flag) -> bool {
        self.0 & flag.mask() != 0
    }

    /// Set or clear one flag, leaving the other seven bits alone.
    pub fn set(&mut self, flag: Flag, value: bool) {
        if value {
            self.0 |= flag.mask();
        } else {
            self.0 &= !flag.mask();
        }
    }

    /// Builder-style [`Flags::set`].
    pub fn with(mut self, flag: Flag, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    /// Flags currently set, in bit order.
    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |flag| self.get(*flag))
    }
}

impl From<u8> for Flags {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}
