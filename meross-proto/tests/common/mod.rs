//! Shared fixtures for the integration tests

#![allow(dead_code)]

pub use meross_proto::frame::{self, Checksum, DecodedFrame};
pub use meross_proto::{Error, Reassembler};

pub const HARDWARE_REQUEST: &[u8] = br#"{"header":{"from":"","messageId":"0123456789abcdef0123456789abcdef","method":"GET","namespace":"Appliance.System.Hardware","payloadVersion":1,"sign":"2ce3a2ab29e9ff89a77409e4be88d245","timestamp":"0"},"payload":{}}"#;

/// Lowercase alphabet repeated to `len` bytes.
pub fn alphabet(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'a' + (i % 26) as u8).collect()
}

/// Bodies whose encoded frames carry no start marker past offset 0, so any
/// chunking keeps them intact.
pub fn sample_bodies() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        b"x".to_vec(),
        HARDWARE_REQUEST.to_vec(),
        alphabet(1000),
    ]
}

/// Push `bytes` through a fresh reassembler in `chunk_size` pieces and
/// collect every frame it emits.
pub fn reassemble(bytes: &[u8], chunk_size: usize) -> Vec<DecodedFrame> {
    let mut reassembler = Reassembler::new();
    let mut frames = Vec::new();
    for chunk in bytes.chunks(chunk_size) {
        if let Some(decoded) = reassembler.push(chunk).expect("chunk rejected") {
            frames.push(decoded);
        }
    }
    frames
}
