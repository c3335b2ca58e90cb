//! BLE GATT constants for the Meross provisioning service
//!
//! Requests are written to the write characteristic in MTU sized chunks,
//! responses arrive as notifications on the notify characteristic.

/// Provisioning service, advertised by unconfigured devices
pub const SERVICE_UUID: &str = "0000a00a-0000-1000-8000-00805f9b34fb";

/// Request characteristic (write without response)
pub const WRITE_CHAR_UUID: &str = "0000b002-0000-1000-8000-00805f9b34fb";

/// Response characteristic (notify)
pub const NOTIFY_CHAR_UUID: &str = "0000b003-0000-1000-8000-00805f9b34fb";

/// Bytes of each ATT packet taken by the opcode and handle
pub const ATT_OVERHEAD: usize = 3;

/// Smallest MTU every BLE link supports
pub const DEFAULT_MTU: usize = 23;

/// Largest write payload for a negotiated MTU, never below one byte
pub fn max_chunk_size(mtu: usize) -> usize {
    mtu.saturating_sub(ATT_OVERHEAD).max(1)
}
