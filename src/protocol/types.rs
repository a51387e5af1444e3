//! Framewire command identifiers and packet ids

use std::fmt;

/// Length of a packet identifier on the wire
pub const PACKET_ID_LEN: usize = 8;

/// One-byte command discriminant leading every message body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandId {
    /// Connection request (reserved, no body codec)
    Conn = 0x01,
    /// Submit a payload
    Submit = 0x02,

    /// Connection response (reserved, no body codec)
    ConnAck = 0x81,
    /// Result of a submit
    SubmitAck = 0x82,
}

impl CommandId {
    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Conn),
            0x02 => Some(Self::Submit),
            0x81 => Some(Self::ConnAck),
            0x82 => Some(Self::SubmitAck),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if this command is a response (high bit set)
    #[must_use]
    pub const fn is_response(self) -> bool {
        self.as_u8() & 0x80 != 0
    }

    /// Check if this command is one of the reserved stubs
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(self, Self::Conn | Self::ConnAck)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Conn => "Conn",
            Self::Submit => "Submit",
            Self::ConnAck => "ConnAck",
            Self::SubmitAck => "SubmitAck",
        };
        write!(f, "{name}")
    }
}

/// Fixed-width 8-byte packet identifier
///
/// Longer inputs are truncated to 8 bytes, shorter inputs are right-padded
/// with `0x00`. The padding is trimmed again when the id is displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacketId([u8; PACKET_ID_LEN]);

impl PacketId {
    /// Build an id from raw wire bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; PACKET_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an id from an arbitrary byte slice, truncating or padding to 8 bytes
    #[must_use]
    pub fn from_slice(value: &[u8]) -> Self {
        let mut bytes = [0u8; PACKET_ID_LEN];
        let len = value.len().min(PACKET_ID_LEN);
        bytes[..len].copy_from_slice(&value[..len]);
        Self(bytes)
    }

    /// Render a sequence number as an 8-digit zero-padded decimal id
    ///
    /// Sequence numbers above `99_999_999` keep their last eight digits.
    #[must_use]
    pub fn from_sequence(seq: u64) -> Self {
        let rendered = format!("{:08}", seq % 100_000_000);
        Self::from_slice(rendered.as_bytes())
    }

    /// Raw wire bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PACKET_ID_LEN] {
        &self.0
    }

    /// Bytes with trailing NUL padding removed
    #[must_use]
    pub fn trimmed(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |idx| idx + 1);
        &self.0[..end]
    }
}

impl From<&str> for PacketId {
    fn from(value: &str) -> Self {
        Self::from_slice(value.as_bytes())
    }
}

impl From<[u8; PACKET_ID_LEN]> for PacketId {
    fn from(value: [u8; PACKET_ID_LEN]) -> Self {
        Self(value)
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.trimmed()))
    }
}
