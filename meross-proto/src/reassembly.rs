//! Reconstructs frames from transport chunks.
//!
//! BLE notifications carry at most one MTU worth of bytes, so a response frame
//! arrives split across several of them. A chunk starting with the start
//! marker opens a new frame and throws away whatever was accumulated before
//! (a delivery that never completed). The frame is closed once the buffer
//! ends with the end marker and the bytes announced by the length field have
//! all arrived. Checking the buffer rather than the chunk keeps a marker that
//! straddles two chunks from going unnoticed.
//!
//! The reassembler trusts in-order delivery and keeps no state between
//! frames. Use one instance per in-flight request.

use crate::error::Result;
use crate::frame::{self, DecodedFrame, FRAME_OVERHEAD, MAGIC_END, MAGIC_START};

#[derive(Debug, Default)]
pub struct Reassembler {
    buf: Vec<u8>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk. Returns the decoded frame once it is complete.
    ///
    /// The buffer is reset after a complete frame, whether decoding succeeded
    /// or not.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<DecodedFrame>> {
        if chunk.starts_with(&MAGIC_START) {
            if !self.buf.is_empty() {
                tracing::warn!(
                    discarded = self.buf.len(),
                    "new frame started, dropping partial frame"
                );
            }
            self.buf.clear();
        }

        self.buf.extend_from_slice(chunk);
        tracing::trace!(chunk = chunk.len(), buffered = self.buf.len(), "chunk");

        if !self.buf.ends_with(&MAGIC_END) || self.awaiting_body() {
            return Ok(None);
        }

        let data = std::mem::take(&mut self.buf);
        frame::decode(&data).map(Some)
    }

    /// Bytes accumulated for the frame in progress.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Give up on the frame in progress, e.g. once the caller's deadline has
    /// passed.
    ///
    /// A buffer that ends with the end marker but is shorter than its length
    /// field announces is decoded anyway, so the caller sees
    /// [`Error::MalformedFrame`](crate::Error::MalformedFrame) instead of
    /// silence. Anything else is dropped and `Ok(None)` returned.
    pub fn finish(&mut self) -> Result<Option<DecodedFrame>> {
        let data = std::mem::take(&mut self.buf);
        if data.ends_with(&MAGIC_END) {
            return frame::decode(&data).map(Some);
        }
        if !data.is_empty() {
            tracing::debug!(discarded = data.len(), "incomplete frame dropped");
        }
        Ok(None)
    }

    /// True while the length field promises more bytes than we have, which
    /// means an end marker seen now sits inside the body or the checksum.
    fn awaiting_body(&self) -> bool {
        match frame::declared_body_len(&self.buf) {
            Some(len) => self.buf.len() < len + FRAME_OVERHEAD,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Checksum, encode};

    #[test]
    fn single_chunk_frame() {
        let mut r = Reassembler::new();
        let decoded = r.push(&encode(b"ping").unwrap()).unwrap().unwrap();
        assert_eq!(decoded.frame.body, b"ping");
        assert_eq!(r.buffered(), 0);
    }

    #[test]
    fn waits_for_end_marker() {
        let bytes = encode(b"{\"a\":1}").unwrap();
        let mut r = Reassembler::new();
        assert!(r.push(&bytes[..5]).unwrap().is_none());
        assert!(r.push(&bytes[5..9]).unwrap().is_none());
        assert_eq!(r.buffered(), 9);
        let decoded = r.push(&bytes[9..]).unwrap().unwrap();
        assert_eq!(decoded.frame.body, b"{\"a\":1}");
        assert_eq!(decoded.checksum, Checksum::Valid);
    }

    #[test]
    fn start_marker_discards_partial_frame() {
        let lost = encode(b"lost response").unwrap();
        let good = encode(b"good").unwrap();
        let mut r = Reassembler::new();
        assert!(r.push(&lost[..6]).unwrap().is_none());
        let decoded = r.push(&good).unwrap().unwrap();
        assert_eq!(decoded.frame.body, b"good");
    }

    #[test]
    fn end_marker_inside_body_does_not_close_frame() {
        let body = [b'a', 0xAA, 0x55, b'b', b'c'];
        let bytes = encode(&body).unwrap();
        let mut r = Reassembler::new();
        // first chunk ends right after the embedded AA 55
        assert!(r.push(&bytes[..7]).unwrap().is_none());
        let decoded = r.push(&bytes[7..]).unwrap().unwrap();
        assert_eq!(decoded.frame.body, body);
    }

    #[test]
    fn end_marker_split_across_chunks() {
        let bytes = encode(b"split").unwrap();
        let (head, tail) = bytes.split_at(bytes.len() - 1);
        let mut r = Reassembler::new();
        assert!(r.push(head).unwrap().is_none());
        assert_eq!(r.push(tail).unwrap().unwrap().frame.body, b"split");
    }

    #[test]
    fn resets_after_each_frame() {
        let mut r = Reassembler::new();
        for body in [&b"one"[..], b"two", b"three"] {
            let bytes = encode(body).unwrap();
            let (head, tail) = bytes.split_at(3);
            assert!(r.push(head).unwrap().is_none());
            assert_eq!(r.push(tail).unwrap().unwrap().frame.body, body);
        }
    }

    #[test]
    fn stray_trailer_is_malformed_and_clears() {
        let mut r = Reassembler::new();
        assert!(r.push(&[0x01, 0xAA, 0x55]).is_err());
        assert_eq!(r.buffered(), 0);
        assert!(r.push(&encode(b"ok").unwrap()).unwrap().is_some());
    }

    #[test]
    fn finish_reports_overlong_length() {
        let mut bytes = encode(b"short").unwrap();
        bytes[3] = 0x20;
        let mut r = Reassembler::new();
        assert!(r.push(&bytes).unwrap().is_none());
        match r.finish() {
            Err(crate::Error::MalformedFrame { needed, available }) => {
                assert_eq!(needed, 4 + 0x20 + 4);
                assert_eq!(available, bytes.len());
            }
            other => panic!("expected MalformedFrame, got {other:?}"),
        }
        assert_eq!(r.buffered(), 0);
    }

    #[test]
    fn finish_drops_frame_without_trailer() {
        let bytes = encode(b"partial").unwrap();
        let mut r = Reassembler::new();
        r.push(&bytes[..9]).unwrap();
        assert!(r.finish().unwrap().is_none());
        assert_eq!(r.buffered(), 0);
        assert!(r.finish().unwrap().is_none());
    }

    #[test]
    fn explicit_reset() {
        let bytes = encode(b"partial").unwrap();
        let mut r = Reassembler::new();
        r.push(&bytes[..4]).unwrap();
        r.reset();
        assert_eq!(r.buffered(), 0);
    }
}
