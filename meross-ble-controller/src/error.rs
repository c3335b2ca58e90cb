use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bluetooth error: {0}")]
    Ble(#[from] btleplug::Error),

    #[error("no Bluetooth adapter found")]
    NoAdapter,

    #[error("no device matching {0:?} found")]
    DeviceNotFound(String),

    #[error("characteristic {0} not found")]
    CharacteristicNotFound(Uuid),

    #[error("invalid uuid: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("notification stream closed before a full frame arrived")]
    Disconnected,

    #[error(transparent)]
    Proto(#[from] meross_proto::Error),

    #[error("device rejected {namespace}: {payload}")]
    DeviceError {
        namespace: String,
        payload: serde_json::Value,
    },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Proto(e.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
