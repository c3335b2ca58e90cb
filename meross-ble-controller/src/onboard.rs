//! Onboarding: hand the device its cloud key and WiFi credentials

use meross_proto::{
    Envelope, Gateway, HardwareInfo, KeyConfig, Method, WifiConfig, derive_key, namespace,
    wifix_password,
};
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::session::Session;
use crate::transport::Transport;

pub const DEFAULT_USER_ID: &str = "0";

/// How the WiFi password is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordMode {
    /// Encrypted with the key derived from the hardware identity
    #[default]
    Encrypted,
    /// Sent as is, for firmware that predates the cipher
    Plaintext,
}

#[derive(Debug, Clone)]
pub struct OnboardRequest {
    pub gateway: Gateway,
    pub key: String,
    pub user_id: String,
    /// `password` holds the plaintext password.
    pub wifi: WifiConfig,
    pub password_mode: PasswordMode,
}

/// Replies collected along the way.
#[derive(Debug, Clone)]
pub struct OnboardReport {
    pub hardware: HardwareInfo,
    pub hardware_response: Envelope,
    pub key_response: Envelope,
    pub wifi_response: Envelope,
}

/// Read the hardware identity, then configure the key and the WiFi network.
///
/// Any `ERROR` reply stops the flow. After a successful `WifiX` the device
/// leaves pairing mode and usually drops the link.
pub async fn onboard<T: Transport>(
    session: &mut Session<T>,
    request: &OnboardRequest,
) -> Result<OnboardReport> {
    let hardware_response = session
        .request(Method::Get, namespace::SYSTEM_HARDWARE, json!({}))
        .await?
        .envelope()?;
    let hardware = HardwareInfo::from_payload(&hardware_response.payload)?;
    info!(
        device_type = %hardware.device_type,
        uuid = %hardware.uuid,
        mac = %hardware.mac_address,
        "hardware"
    );

    let key = KeyConfig {
        gateway: request.gateway.clone(),
        key: request.key.clone(),
        user_id: request.user_id.clone(),
    };
    let key_response = session
        .request(Method::Set, namespace::CONFIG_KEY, key.to_payload())
        .await?
        .envelope()?;
    info!(host = %key.gateway.host, port = key.gateway.port, "key configured");

    let mut wifi = request.wifi.clone();
    if request.password_mode == PasswordMode::Encrypted {
        let device_key = derive_key(&hardware.identity());
        wifi.password = wifix_password(&device_key, &request.wifi.password)?;
    }
    let wifi_response = session
        .request(Method::Set, namespace::CONFIG_WIFIX, wifi.to_payload())
        .await?
        .envelope()?;
    info!(ssid = %wifi.ssid, "wifi configured");

    Ok(OnboardReport {
        hardware,
        hardware_response,
        key_response,
        wifi_response,
    })
}
