use thiserror::Error;

/// Errors produced by the protocol layer.
///
/// A CRC mismatch is deliberately absent: it is reported through
/// [`crate::frame::Checksum`] so that callers can keep going.
#[derive(Debug, Error)]
pub enum Error {
    #[error("frame body is {len} bytes, the length field holds at most 65535")]
    FrameTooLarge { len: usize },

    #[error("malformed frame: need {needed} bytes, have {available}")]
    MalformedFrame { needed: usize, available: usize },

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64: {0}")]
    Base64(#[from] data_encoding::DecodeError),

    #[error("plaintext of {len} bytes is not a multiple of the AES block size")]
    UnalignedPlaintext { len: usize },

    #[error("ciphertext of {len} bytes is not a multiple of the AES block size")]
    UnalignedCiphertext { len: usize },

    #[error("iv must be 16 bytes, got {len}")]
    InvalidIv { len: usize },

    #[error("response is missing {0}")]
    MissingField(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
