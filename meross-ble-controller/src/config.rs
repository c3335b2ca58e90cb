//! Controller configuration

use std::time::Duration;

use meross_proto::ble::DEFAULT_MTU;

pub const MTU_ENV: &str = "MEROSS_BLE_MTU";
pub const TIMEOUT_ENV: &str = "MEROSS_BLE_TIMEOUT_SECS";
pub const SCAN_ENV: &str = "MEROSS_BLE_SCAN_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// ATT MTU assumed for the link. Writes carry `mtu - 3` bytes.
    pub mtu: usize,
    /// How long to wait for a complete response frame
    pub response_timeout: Duration,
    /// How long to scan before looking for the target device
    pub scan_duration: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mtu: DEFAULT_MTU,
            response_timeout: Duration::from_secs(10),
            scan_duration: Duration::from_secs(5),
        }
    }
}

impl ControllerConfig {
    /// Defaults overlaid with `MEROSS_BLE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`. Unparseable values are logged and
    /// ignored.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(mtu) = parse_var(&lookup, MTU_ENV) {
            self.mtu = mtu;
        }
        if let Some(secs) = parse_var(&lookup, TIMEOUT_ENV) {
            self.response_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, SCAN_ENV) {
            self.scan_duration = Duration::from_secs(secs);
        }
        self
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring invalid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.mtu, 23);
        assert_eq!(config.response_timeout, Duration::from_secs(10));
        assert_eq!(config.scan_duration, Duration::from_secs(5));
    }

    #[test]
    fn env_overrides() {
        let config = ControllerConfig::default().with_env(|name| match name {
            MTU_ENV => Some("247".to_string()),
            TIMEOUT_ENV => Some(" 30 ".to_string()),
            _ => None,
        });
        assert_eq!(config.mtu, 247);
        assert_eq!(config.response_timeout, Duration::from_secs(30));
        assert_eq!(config.scan_duration, Duration::from_secs(5));
    }

    #[test]
    fn invalid_env_keeps_default() {
        let config = ControllerConfig::default().with_env(|name| match name {
            MTU_ENV => Some("big".to_string()),
            SCAN_ENV => Some("-1".to_string()),
            _ => None,
        });
        assert_eq!(config, ControllerConfig::default());
    }
}
