use std::fmt;

/// Which flavor of the header an endpoint speaks.
///
/// Both share the same 20-byte layout; they differ in how the flag byte is
/// read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderFormat {
    /// Eight named flags; GROUP packets carry nested packets.
    #[default]
    Structured,
    /// One opaque flag byte, passed through untouched. No grouping.
    Legacy,
}

impl HeaderFormat {
    /// True if this format gives the GROUP flag its meaning.
    pub fn supports_grouping(self) -> bool {
        matches!(self, HeaderFormat::Structured)
    }
}

impl fmt::Display for HeaderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderFormat::Structured => f.write_str("structured"),
            HeaderFormat::Legacy => f.write_str("legacy"),
        }
    }
}

/// Controls endpoint behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Header flavor used to interpret the flag byte.
    pub format: HeaderFormat,
    /// When true, `receive_any` keeps listening past frames that fail to
    /// decode instead of returning the empty packet. The filtered `receive`
    /// always drops them.
    pub discard_malformed: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            format: HeaderFormat::Structured,
            discard_malformed: false,
        }
    }
}
