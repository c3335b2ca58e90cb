//! Meross BLE wire protocol - framing, envelopes and the onboarding cipher
//!
//! Outbound: [`Envelope`] -> [`frame::encode`] -> transport chunks.
//! Inbound: transport chunks -> [`Reassembler`] -> [`DecodedFrame`] -> [`Envelope`].
//!
//! Nothing in here performs I/O; the BLE side lives in `meross-ble-controller`.

pub mod ble;
pub mod cipher;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod payload;
pub mod reassembly;

pub use cipher::{
    CipherPayload, DerivedKey, DeviceIdentity, decrypt_credential, derive_key, encrypt_credential,
    wifix_password,
};
pub use envelope::{Envelope, Header, Method};
pub use error::{Error, Result};
pub use frame::{Checksum, DecodedFrame, Frame};
pub use payload::{Gateway, HardwareInfo, KeyConfig, WifiConfig, WifiList, WifiNetwork, namespace};
pub use reassembly::Reassembler;
