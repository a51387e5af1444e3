//! Command-byte dispatch between message bodies and typed packets

use tracing::trace;

use super::metrics::{Metrics, MessageDirection};
use super::{COMMAND_SIZE, CommandId, Error, Packet, Result, SubmitAck, SubmitPool};

/// Maps message bodies to [`Packet`] variants and back
///
/// # Format
///
/// ```text
/// [COMMAND (1 byte)] [VARIANT BODY (variable)]
/// ```
///
/// Every packet kind is registered here, in the two `match` blocks below.
/// `Submit` values on the decode path come from the registry's
/// [`SubmitPool`]; hand them back with [`PacketRegistry::release`] once
/// consumed.
#[derive(Clone, Debug, Default)]
pub struct PacketRegistry {
    pool: SubmitPool,
}

impl PacketRegistry {
    /// Create a registry that draws decoded submits from `pool`
    #[must_use]
    pub fn new(pool: SubmitPool) -> Self {
        Self { pool }
    }

    /// Submit pool used on the decode path
    #[must_use]
    pub fn pool(&self) -> &SubmitPool {
        &self.pool
    }

    /// Decode a message body into a packet
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The body is empty
    /// - The command byte is not registered
    /// - The body is too short for its variant
    pub fn decode(&self, body: &[u8]) -> Result<Packet> {
        let Some((&id, rest)) = body.split_first() else {
            Metrics::record_error();
            return Err(Error::EmptyBody);
        };

        let Some(command) = CommandId::from_u8(id) else {
            Metrics::record_error();
            return Err(Error::UnknownCommand { id });
        };

        let packet = match command {
            CommandId::Conn => Packet::Conn,
            CommandId::ConnAck => Packet::ConnAck,
            CommandId::Submit => {
                let mut submit = self.pool.acquire();
                if let Err(err) = submit.decode_into(rest) {
                    self.pool.release(submit);
                    Metrics::record_error();
                    return Err(err);
                }
                Packet::Submit(submit)
            }
            CommandId::SubmitAck => match SubmitAck::decode_body(rest) {
                Ok(ack) => Packet::SubmitAck(ack),
                Err(err) => {
                    Metrics::record_error();
                    return Err(err);
                }
            },
        };

        Metrics::record_packet(MessageDirection::Received, command);
        trace!(%command, len = body.len(), "packet decoded");
        Ok(packet)
    }

    /// Encode a packet into a fresh message body
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVariant`] for the reserved `Conn`/`ConnAck`
    /// stubs, which have no encoder.
    pub fn encode(packet: &Packet) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        Self::encode_into(packet, &mut out)?;
        Ok(out)
    }

    /// Append the message body for `packet` to `out`
    ///
    /// On error nothing is appended.
    pub fn encode_into(packet: &Packet, out: &mut Vec<u8>) -> Result<()> {
        let command = packet.command();
        match packet {
            Packet::Submit(submit) => {
                out.reserve(COMMAND_SIZE + submit.body_len());
                out.push(command.as_u8());
                submit.encode_body(out);
            }
            Packet::SubmitAck(ack) => {
                out.push(command.as_u8());
                ack.encode_body(out);
            }
            Packet::Conn | Packet::ConnAck => {
                Metrics::record_error();
                return Err(Error::UnsupportedVariant { command });
            }
        }

        Metrics::record_packet(MessageDirection::Sent, command);
        Ok(())
    }

    /// Return a consumed packet's resources to the pool
    pub fn release(&self, packet: Packet) {
        if let Packet::Submit(submit) = packet {
            self.pool.release(submit);
        }
    }
}
