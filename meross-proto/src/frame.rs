//! Checksummed frame codec
//!
//! ```text
//! +--------+-----------+-------------+-------------+--------+
//! | 55 AA  | len: u16  | body        | crc32: u32  | AA 55  |
//! +--------+-----------+-------------+-------------+--------+
//! ```
//!
//! All integers are big-endian. The CRC-32 (zlib polynomial) covers the body
//! only.

use crate::error::{Error, Result};

pub const MAGIC_START: [u8; 2] = [0x55, 0xAA];
pub const MAGIC_END: [u8; 2] = [0xAA, 0x55];

/// Largest body the 16-bit length field can describe.
pub const MAX_BODY_LEN: usize = u16::MAX as usize;

/// Marker, length, checksum and trailing marker bytes around a body.
pub const FRAME_OVERHEAD: usize = 2 + 2 + 4 + 2;

/// Outcome of comparing the received CRC with the one computed over the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checksum {
    Valid,
    Mismatch { expected: u32, actual: u32 },
}

impl Checksum {
    pub fn is_valid(&self) -> bool {
        matches!(self, Checksum::Valid)
    }
}

/// One protocol message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub body: Vec<u8>,
}

/// A frame read off the wire together with its checksum verdict.
///
/// The body is returned even when the checksum does not match, some firmware
/// sends mismatched frames while failing and the data is still useful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub frame: Frame,
    pub checksum: Checksum,
}

impl Frame {
    pub fn new(body: Vec<u8>) -> Self {
        Self { body }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(&self.body)
    }

    pub fn from_bytes(data: &[u8]) -> Result<DecodedFrame> {
        decode(data)
    }
}

/// Wrap `body` in markers, length and checksum.
pub fn encode(body: &[u8]) -> Result<Vec<u8>> {
    if body.len() > MAX_BODY_LEN {
        return Err(Error::FrameTooLarge { len: body.len() });
    }

    let mut buf = Vec::with_capacity(body.len() + FRAME_OVERHEAD);
    buf.extend_from_slice(&MAGIC_START);
    buf.extend_from_slice(&(body.len() as u16).to_be_bytes());
    buf.extend_from_slice(body);
    buf.extend_from_slice(&crc32fast::hash(body).to_be_bytes());
    buf.extend_from_slice(&MAGIC_END);
    Ok(buf)
}

/// Parse a framed region back into its body.
///
/// Markers are not checked here, the reassembler decides where a frame starts
/// and ends. Bytes after the checksum are ignored.
pub fn decode(data: &[u8]) -> Result<DecodedFrame> {
    let body_len = declared_body_len(data).ok_or(Error::MalformedFrame {
        needed: 4,
        available: data.len(),
    })?;

    let body_end = 4 + body_len;
    let needed = body_end + 4;
    if data.len() < needed {
        return Err(Error::MalformedFrame {
            needed,
            available: data.len(),
        });
    }

    let body = &data[4..body_end];
    let expected = u32::from_be_bytes([
        data[body_end],
        data[body_end + 1],
        data[body_end + 2],
        data[body_end + 3],
    ]);
    let actual = crc32fast::hash(body);

    let checksum = if expected == actual {
        Checksum::Valid
    } else {
        tracing::warn!(expected, actual, "CRC mismatch on frame body");
        Checksum::Mismatch { expected, actual }
    };

    Ok(DecodedFrame {
        frame: Frame::new(body.to_vec()),
        checksum,
    })
}

/// Body length from the header, if at least the header is present.
pub(crate) fn declared_body_len(data: &[u8]) -> Option<usize> {
    if data.len() < 4 {
        return None;
    }
    Some(u16::from_be_bytes([data[2], data[3]]) as usize)
}
