//! JSON request/response envelope carried in a frame body.

use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::frame;

pub const PAYLOAD_VERSION: u32 = 1;

/// Request and response methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Set,
    GetAck,
    SetAck,
    Error,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Set => "SET",
            Method::GetAck => "GETACK",
            Method::SetAck => "SETACK",
            Method::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope header. Field order here is the key order on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(default)]
    pub from: String,
    pub message_id: String,
    pub method: String,
    pub namespace: String,
    #[serde(default = "default_payload_version")]
    pub payload_version: u32,
    #[serde(default)]
    pub sign: String,
    #[serde(default, deserialize_with = "timestamp_as_string")]
    pub timestamp: String,
}

fn default_payload_version() -> u32 {
    PAYLOAD_VERSION
}

/// Devices answer with a numeric timestamp while requests carry a string.
fn timestamp_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub header: Header,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Build a request with a fresh message id and the current unix time.
    pub fn new(method: &str, namespace: &str, payload: Value) -> Self {
        Self::with_timestamp(method, namespace, payload, &unix_timestamp())
    }

    /// Build a request with a caller supplied timestamp. Firmware does not
    /// validate the value, only the signature over it.
    pub fn with_timestamp(method: &str, namespace: &str, payload: Value, timestamp: &str) -> Self {
        let message_id = new_message_id();
        let sign = sign(&message_id, timestamp);
        Self {
            header: Header {
                from: String::new(),
                message_id,
                method: method.to_string(),
                namespace: namespace.to_string(),
                payload_version: PAYLOAD_VERSION,
                sign,
                timestamp: timestamp.to_string(),
            },
            payload,
        }
    }

    pub fn method(&self) -> &str {
        &self.header.method
    }

    pub fn namespace(&self) -> &str {
        &self.header.namespace
    }

    pub fn is_error(&self) -> bool {
        self.header.method == Method::Error.as_str()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Serialize and wrap in a wire frame.
    pub fn to_frame(&self) -> Result<Vec<u8>> {
        frame::encode(&self.to_bytes()?)
    }
}

/// 16 random bytes, lowercase hex.
pub fn new_message_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    data_encoding::HEXLOWER.encode(&bytes)
}

/// `md5(message_id + timestamp)` as lowercase hex.
///
/// The device key is not known before onboarding, so it is left out.
pub fn sign(message_id: &str, timestamp: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(message_id.as_bytes());
    hasher.update(timestamp.as_bytes());
    data_encoding::HEXLOWER.encode(&hasher.finalize())
}

fn unix_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string()
}
