//! Payloads for the namespaces used during onboarding.

use data_encoding::BASE64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cipher::DeviceIdentity;
use crate::error::{Error, Result};

pub mod namespace {
    pub const SYSTEM_HARDWARE: &str = "Appliance.System.Hardware";
    pub const CONFIG_KEY: &str = "Appliance.Config.Key";
    pub const CONFIG_WIFIX: &str = "Appliance.Config.WifiX";
    pub const CONFIG_WIFI_LIST: &str = "Appliance.Config.WifiList";
}

/// `payload.hardware` of an `Appliance.System.Hardware` response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HardwareInfo {
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub chip_type: Option<String>,
    pub uuid: String,
    pub mac_address: String,
}

impl HardwareInfo {
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let hardware = payload
            .get("hardware")
            .ok_or(Error::MissingField("payload.hardware"))?;
        Ok(Self::deserialize(hardware)?)
    }

    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity {
            device_type: self.device_type.clone(),
            uuid: self.uuid.clone(),
            mac_address: self.mac_address.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Gateway {
    pub host: String,
    pub port: u16,
}

/// `Appliance.Config.Key` payload: where the device should connect and the
/// key it signs with afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfig {
    pub gateway: Gateway,
    pub key: String,
    pub user_id: String,
}

impl KeyConfig {
    pub fn to_payload(&self) -> Value {
        serde_json::json!({ "key": self })
    }
}

/// Network parameters as reported by `Appliance.Config.WifiList`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WifiNetwork {
    pub ssid: String,
    pub bssid: String,
    pub channel: u32,
    pub encryption: u32,
    pub cipher: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
}

/// `Appliance.Config.WifiX` request. `ssid` is plain text here and base64
/// encoded on the wire; `password` is either the cipher output or plain text
/// for older firmware.
#[derive(Debug, Clone, PartialEq)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
    pub bssid: String,
    pub channel: u32,
    pub encryption: u32,
    pub cipher: u32,
}

impl WifiConfig {
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "wifi": {
                "ssid": BASE64.encode(self.ssid.as_bytes()),
                "password": self.password,
                "bssid": self.bssid,
                "channel": self.channel,
                "encryption": self.encryption,
                "cipher": self.cipher,
            }
        })
    }
}

/// Decoded `payload.wifiList` of an `Appliance.Config.WifiList` response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WifiList {
    pub networks: Vec<WifiNetwork>,
}

impl WifiList {
    /// Parse the list and decode the base64 SSIDs.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let list = payload
            .get("wifiList")
            .ok_or(Error::MissingField("payload.wifiList"))?;
        let mut networks = Vec::<WifiNetwork>::deserialize(list)?;
        for network in &mut networks {
            let raw = BASE64.decode(network.ssid.as_bytes())?;
            network.ssid = String::from_utf8_lossy(&raw).into_owned();
        }
        Ok(Self { networks })
    }

    /// Networks whose decoded SSID equals `ssid`, or all when `None`.
    pub fn filter_ssid(&self, ssid: Option<&str>) -> Vec<&WifiNetwork> {
        self.networks
            .iter()
            .filter(|n| ssid.is_none_or(|s| n.ssid == s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hardware_from_response_payload() {
        let payload = json!({
            "hardware": {
                "type": "mss710",
                "subType": "un",
                "version": "8.0.0",
                "chipType": "rtl8720cf",
                "uuid": "2308283569760958070148e1e9d7c243",
                "macAddress": "48:e1:e9:d7:c2:43"
            }
        });
        let hw = HardwareInfo::from_payload(&payload).unwrap();
        assert_eq!(hw.chip_type.as_deref(), Some("rtl8720cf"));
        let identity = hw.identity();
        assert_eq!(identity.device_type, "mss710");
        assert_eq!(identity.mac_address, "48:e1:e9:d7:c2:43");
    }

    #[test]
    fn hardware_missing() {
        assert!(matches!(
            HardwareInfo::from_payload(&json!({})),
            Err(Error::MissingField(_))
        ));
        assert!(matches!(
            HardwareInfo::from_payload(&json!({"hardware": {"type": "x"}})),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn key_config_shape() {
        let config = KeyConfig {
            gateway: Gateway {
                host: "mqtt.local".to_string(),
                port: 8883,
            },
            key: "k".to_string(),
            user_id: "0".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&config.to_payload()).unwrap(),
            r#"{"key":{"gateway":{"host":"mqtt.local","port":8883},"key":"k","userId":"0"}}"#
        );
    }

    #[test]
    fn wifi_config_encodes_ssid() {
        let config = WifiConfig {
            ssid: "home".to_string(),
            password: "sg+KELFbqthVM67/HJp3/A==".to_string(),
            bssid: "aa:bb:cc:dd:ee:ff".to_string(),
            channel: 6,
            encryption: 6,
            cipher: 3,
        };
        let payload = config.to_payload();
        assert_eq!(payload["wifi"]["ssid"], "aG9tZQ==");
        assert_eq!(payload["wifi"]["password"], "sg+KELFbqthVM67/HJp3/A==");
        assert_eq!(payload["wifi"]["channel"], 6);
    }

    fn sample_list() -> Value {
        json!({
            "wifiList": [
                {"ssid": "aG9tZQ==", "bssid": "aa:bb:cc:dd:ee:ff", "channel": 6,
                 "encryption": 6, "cipher": 3, "signal": 80},
                {"ssid": "b2ZmaWNl", "bssid": "11:22:33:44:55:66", "channel": 11,
                 "encryption": 0, "cipher": 0, "signal": 40}
            ]
        })
    }

    #[test]
    fn wifi_list_decodes_ssids() {
        let list = WifiList::from_payload(&sample_list()).unwrap();
        assert_eq!(list.networks.len(), 2);
        assert_eq!(list.networks[0].ssid, "home");
        assert_eq!(list.networks[1].ssid, "office");
        assert_eq!(list.networks[1].signal, Some(40));
    }

    #[test]
    fn wifi_list_filter() {
        let list = WifiList::from_payload(&sample_list()).unwrap();
        assert_eq!(list.filter_ssid(None).len(), 2);
        let office = list.filter_ssid(Some("office"));
        assert_eq!(office.len(), 1);
        assert_eq!(office[0].channel, 11);
        assert!(list.filter_ssid(Some("cafe")).is_empty());
    }
}
