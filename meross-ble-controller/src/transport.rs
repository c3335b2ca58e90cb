//! Transport seam between the session and the BLE link

use std::future::Future;

use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use futures::StreamExt;
use futures::stream::BoxStream;
use meross_proto::ble::{NOTIFY_CHAR_UUID, WRITE_CHAR_UUID, max_chunk_size};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Raw notification payloads in arrival order.
pub type ChunkStream = BoxStream<'static, Vec<u8>>;

/// What the session needs from a link.
///
/// Implementations must deliver notifications in the order the device sent
/// them and must finish writing one chunk before the next is started.
pub trait Transport {
    /// Largest payload a single write may carry.
    fn max_chunk_size(&self) -> usize;

    fn write_chunk(&self, chunk: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// A stream of notifications received from now on.
    fn notifications(&self) -> impl Future<Output = Result<ChunkStream>> + Send;
}

/// GATT link to one device.
pub struct BleTransport {
    peripheral: Peripheral,
    write_char: Characteristic,
    notify_char: Characteristic,
    mtu: usize,
}

impl BleTransport {
    /// Connect, discover the provisioning characteristics and subscribe to
    /// notifications.
    pub async fn connect(peripheral: Peripheral, mtu: usize) -> Result<Self> {
        if !peripheral.is_connected().await? {
            info!(address = %peripheral.address(), "connecting");
            peripheral.connect().await?;
        }
        peripheral.discover_services().await?;

        let write_char = find_characteristic(&peripheral, WRITE_CHAR_UUID)?;
        let notify_char = find_characteristic(&peripheral, NOTIFY_CHAR_UUID)?;

        peripheral.subscribe(&notify_char).await?;
        info!(address = %peripheral.address(), mtu, "connected");

        Ok(Self {
            peripheral,
            write_char,
            notify_char,
            mtu,
        })
    }

    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    pub async fn disconnect(&self) -> Result<()> {
        // the device may already have dropped the link after a config change
        let _ = self.peripheral.unsubscribe(&self.notify_char).await;
        self.peripheral.disconnect().await?;
        info!(address = %self.peripheral.address(), "disconnected");
        Ok(())
    }
}

impl Transport for BleTransport {
    fn max_chunk_size(&self) -> usize {
        max_chunk_size(self.mtu)
    }

    async fn write_chunk(&self, chunk: &[u8]) -> Result<()> {
        debug!(bytes = %data_encoding::HEXLOWER.encode(chunk), "BLE write");
        self.peripheral
            .write(&self.write_char, chunk, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }

    async fn notifications(&self) -> Result<ChunkStream> {
        let uuid = self.notify_char.uuid;
        let stream = self.peripheral.notifications().await?;
        Ok(stream
            .filter_map(move |n| futures::future::ready((n.uuid == uuid).then_some(n.value)))
            .boxed())
    }
}

fn find_characteristic(peripheral: &Peripheral, uuid: &str) -> Result<Characteristic> {
    let uuid = Uuid::parse_str(uuid)?;
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == uuid)
        .ok_or(Error::CharacteristicNotFound(uuid))
}
