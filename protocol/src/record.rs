//! Wire format of a telemetry record.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0      | 1    | sequence number |
//! | 1      | 1    | padding, always zero |
//! | 2      | N    | routing blob |
//! | 2 + N  | 4    | latitude, big endian |
//! | 6 + N  | 4    | longitude, big endian |

use crate::{Error, Position};

/// Largest record that can be encoded.
pub const MAX_RECORD_LEN: usize = 64;

const HEADER_LEN: usize = 2;

/// Sequence number reported by a node that has not sent anything yet.
pub const SEQNO_NEVER_SENT: u8 = 0;

/// Value the sequence number continues from after wrapping.
pub const SEQNO_WRAP: u8 = 128;

/// Returns the sequence number following `previous`.
///
/// Zero is never produced, the counter continues from [`SEQNO_WRAP`] instead.
pub fn next_seqno(previous: u8) -> u8 {
    match previous.wrapping_add(1) {
        SEQNO_NEVER_SENT => SEQNO_WRAP,
        seqno => seqno,
    }
}

/// An externally defined, fixed size sub-message embedded verbatim in a record.
pub trait RoutingBlob: Sized {
    /// Encoded size in bytes.
    const LEN: usize;

    /// Writes the encoded blob, `buffer` is exactly [`Self::LEN`] bytes.
    fn write_to(&self, buffer: &mut [u8]);

    /// Reads a blob back, `buffer` is exactly [`Self::LEN`] bytes.
    fn read_from(buffer: &[u8]) -> Result<Self, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryRecord {
    bytes: heapless::Vec<u8, MAX_RECORD_LEN>,
}

impl TelemetryRecord {
    pub const fn encoded_len<B: RoutingBlob>() -> usize {
        HEADER_LEN + B::LEN + Position::WIRE_SIZE
    }

    pub fn encode<B: RoutingBlob>(seqno: u8, blob: &B, position: Position) -> Result<Self, Error> {
        let mut bytes: heapless::Vec<u8, MAX_RECORD_LEN> = heapless::Vec::new();
        bytes
            .resize_default(Self::encoded_len::<B>())
            .map_err(|_| Error::RecordOverflow {
                capacity: MAX_RECORD_LEN,
            })?;

        bytes[0] = seqno;
        blob.write_to(&mut bytes[HEADER_LEN..HEADER_LEN + B::LEN]);
        bytes[HEADER_LEN + B::LEN..].copy_from_slice(&position.to_be_bytes());

        Ok(Self { bytes })
    }

    pub fn decode<B: RoutingBlob>(bytes: &[u8]) -> Result<DecodedRecord<B>, Error> {
        let expected = Self::encoded_len::<B>();
        if bytes.len() != expected {
            return Err(Error::IncorrectLength {
                expected,
                actual: bytes.len(),
            });
        }

        let blob = B::read_from(&bytes[HEADER_LEN..HEADER_LEN + B::LEN])?;

        let mut position = [0u8; Position::WIRE_SIZE];
        position.copy_from_slice(&bytes[HEADER_LEN + B::LEN..]);

        Ok(DecodedRecord {
            seqno: bytes[0],
            blob,
            position: Position::from_be_bytes(position),
        })
    }

    pub fn seqno(&self) -> u8 {
        self.bytes[0]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord<B> {
    pub seqno: u8,
    pub blob: B,
    pub position: Position,
}
