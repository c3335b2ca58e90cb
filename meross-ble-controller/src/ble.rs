//! Adapter discovery and device lookup
//!
//! Meross devices in pairing mode advertise the provisioning service, so
//! scans are filtered on it.

use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use meross_proto::ble::SERVICE_UUID;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::transport::BleTransport;

/// A device advertising the provisioning service
#[derive(Debug, Clone)]
pub struct MerossDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(Error::NoAdapter)
}

/// Scan for `duration` and return every peripheral advertising the
/// provisioning service.
pub async fn scan(duration: Duration) -> Result<Vec<MerossDevice>> {
    let adapter = get_adapter().await?;
    let peripherals = discover(&adapter, duration).await?;

    let mut devices = Vec::new();
    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_else(|| "Unknown".to_string());
            let address = peripheral.address().to_string();
            debug!(%name, %address, rssi = ?props.rssi, "found device");
            devices.push(MerossDevice {
                name,
                address,
                rssi: props.rssi,
            });
        }
    }
    Ok(devices)
}

/// Find a device by address (case-insensitive) or by a substring of its
/// advertised name.
pub async fn find_device(target: &str, duration: Duration) -> Result<Peripheral> {
    let adapter = get_adapter().await?;
    let peripherals = discover(&adapter, duration).await?;

    for peripheral in peripherals {
        let addr = peripheral.address().to_string();
        let name = peripheral
            .properties()
            .await?
            .and_then(|p| p.local_name)
            .unwrap_or_default();

        if addr.eq_ignore_ascii_case(target) || (!name.is_empty() && name.contains(target)) {
            info!(%name, address = %addr, "matched device");
            return Ok(peripheral);
        }
    }

    Err(Error::DeviceNotFound(target.to_string()))
}

/// Find `target`, connect and wrap the link in a request session.
pub async fn connect(target: &str, config: &ControllerConfig) -> Result<Session<BleTransport>> {
    let peripheral = find_device(target, config.scan_duration).await?;
    let transport = BleTransport::connect(peripheral, config.mtu).await?;
    Ok(Session::new(transport, config.response_timeout))
}

async fn discover(adapter: &Adapter, duration: Duration) -> Result<Vec<Peripheral>> {
    let filter = ScanFilter {
        services: vec![Uuid::parse_str(SERVICE_UUID)?],
    };
    adapter.start_scan(filter).await?;
    tokio::time::sleep(duration).await;
    let peripherals = adapter.peripherals().await;
    adapter.stop_scan().await?;
    Ok(peripherals?)
}
