//! Frames survive any chunking the transport applies

mod common;

use common::*;

#[test]
fn every_chunk_size_yields_one_frame() {
    for body in sample_bodies() {
        let bytes = frame::encode(&body).unwrap();
        let expected = frame::decode(&bytes).unwrap();

        for chunk_size in 1..=bytes.len() + 1 {
            let frames = reassemble(&bytes, chunk_size);
            assert_eq!(
                frames.len(),
                1,
                "body of {} bytes, chunk size {}",
                body.len(),
                chunk_size
            );
            assert_eq!(frames[0], expected);
            assert_eq!(frames[0].checksum, Checksum::Valid);
        }
    }
}

#[test]
fn typical_mtu_chunking_of_large_body() {
    let body = alphabet(4000);
    let bytes = frame::encode(&body).unwrap();
    for chunk_size in [20, 182, 241, 509] {
        let frames = reassemble(&bytes, chunk_size);
        assert_eq!(frames.len(), 1, "chunk size {chunk_size}");
        assert_eq!(frames[0].frame.body, body);
    }
}

#[test]
fn back_to_back_frames_on_one_reassembler() {
    let mut reassembler = Reassembler::new();
    let mut bodies = Vec::new();
    for body in sample_bodies() {
        let bytes = frame::encode(&body).unwrap();
        for chunk in bytes.chunks(7) {
            if let Some(decoded) = reassembler.push(chunk).unwrap() {
                bodies.push(decoded.frame.body);
            }
        }
    }
    assert_eq!(bodies, sample_bodies());
}

#[test]
fn aborted_delivery_is_replaced_by_the_next_frame() {
    let first = frame::encode(&alphabet(300)).unwrap();
    let second = frame::encode(HARDWARE_REQUEST).unwrap();

    let mut reassembler = Reassembler::new();
    // only the first half of the first frame ever arrives
    for chunk in first[..150].chunks(20) {
        assert!(reassembler.push(chunk).unwrap().is_none());
    }

    let mut frames = Vec::new();
    for chunk in second.chunks(20) {
        if let Some(decoded) = reassembler.push(chunk).unwrap() {
            frames.push(decoded);
        }
    }
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].frame.body, HARDWARE_REQUEST);
}
