//! Framewire packet variants and their body codecs

use super::{CommandId, Error, PACKET_ID_LEN, PacketId, Result, SUBMIT_ACK_BODY, SUBMIT_MIN_BODY};

/// Submit request: an id followed by an opaque payload
///
/// Wire body: `id (8) || payload (N)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Submit {
    /// Packet identifier
    pub id: PacketId,
    /// Opaque payload, the remainder of the body
    pub payload: Vec<u8>,
}

impl Submit {
    /// Create a new submit
    pub fn new(id: impl Into<PacketId>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }

    /// Decode a body into a freshly allocated submit
    pub fn decode_body(body: &[u8]) -> Result<Self> {
        let mut submit = Self::default();
        submit.decode_into(body)?;
        Ok(submit)
    }

    /// Decode a body in place, reusing the payload allocation
    ///
    /// On error `self` is left untouched.
    pub fn decode_into(&mut self, body: &[u8]) -> Result<()> {
        if body.len() < SUBMIT_MIN_BODY {
            return Err(Error::TruncatedBody {
                command: CommandId::Submit,
                needed: SUBMIT_MIN_BODY,
                got: body.len(),
            });
        }

        let (id, payload) = body.split_at(PACKET_ID_LEN);
        self.id = PacketId::from_slice(id);
        self.payload.clear();
        self.payload.extend_from_slice(payload);
        Ok(())
    }

    /// Append the wire body to `out`
    pub fn encode_body(&self, out: &mut Vec<u8>) {
        out.reserve(self.body_len());
        out.extend_from_slice(self.id.as_bytes());
        out.extend_from_slice(&self.payload);
    }

    /// Size of the wire body
    #[must_use]
    pub fn body_len(&self) -> usize {
        PACKET_ID_LEN + self.payload.len()
    }

    /// Clear every field, keeping the payload allocation
    pub fn reset(&mut self) {
        self.id = PacketId::default();
        self.payload.clear();
    }
}

/// Submit acknowledgement: an id and a one-byte status
///
/// Wire body: `id (8) || result (1)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmitAck {
    /// Id of the acknowledged submit
    pub id: PacketId,
    /// Caller-defined status code
    pub result: u8,
}

impl SubmitAck {
    /// Create a new acknowledgement
    pub fn new(id: impl Into<PacketId>, result: u8) -> Self {
        Self {
            id: id.into(),
            result,
        }
    }

    /// Decode a body; bytes past the result are ignored
    pub fn decode_body(body: &[u8]) -> Result<Self> {
        if body.len() < SUBMIT_ACK_BODY {
            return Err(Error::TruncatedBody {
                command: CommandId::SubmitAck,
                needed: SUBMIT_ACK_BODY,
                got: body.len(),
            });
        }

        Ok(Self {
            id: PacketId::from_slice(&body[..PACKET_ID_LEN]),
            result: body[PACKET_ID_LEN],
        })
    }

    /// Append the wire body to `out`
    pub fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.id.as_bytes());
        out.push(self.result);
    }
}

/// Every message shape the protocol knows, keyed by [`CommandId`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Packet {
    /// Reserved connection request; decodes inertly, cannot be encoded
    Conn,
    /// Submit request
    Submit(Submit),
    /// Reserved connection response; decodes inertly, cannot be encoded
    ConnAck,
    /// Submit acknowledgement
    SubmitAck(SubmitAck),
}

impl Packet {
    /// Command byte for this variant
    #[must_use]
    pub const fn command(&self) -> CommandId {
        match self {
            Self::Conn => CommandId::Conn,
            Self::Submit(_) => CommandId::Submit,
            Self::ConnAck => CommandId::ConnAck,
            Self::SubmitAck(_) => CommandId::SubmitAck,
        }
    }

    /// Borrow the submit, if this is one
    #[must_use]
    pub const fn as_submit(&self) -> Option<&Submit> {
        match self {
            Self::Submit(submit) => Some(submit),
            _ => None,
        }
    }

    /// Borrow the acknowledgement, if this is one
    #[must_use]
    pub const fn as_submit_ack(&self) -> Option<&SubmitAck> {
        match self {
            Self::SubmitAck(ack) => Some(ack),
            _ => None,
        }
    }
}

impl From<Submit> for Packet {
    fn from(value: Submit) -> Self {
        Self::Submit(value)
    }
}

impl From<SubmitAck> for Packet {
    fn from(value: SubmitAck) -> Self {
        Self::SubmitAck(value)
    }
}
