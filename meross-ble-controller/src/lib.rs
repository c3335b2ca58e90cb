//! Meross BLE Controller
//!
//! BLE client for onboarding Meross IoT devices: finds devices in pairing
//! mode, exchanges framed JSON requests over the provisioning service and
//! runs the key and WiFi configuration flow.
//!
//! # Example
//!
//! ```ignore
//! use meross_ble_controller::{ControllerConfig, ble};
//! use meross_proto::{Method, namespace};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ControllerConfig::from_env();
//!     let mut session = ble::connect("48:E1:E9:D7:C2:43", &config).await?;
//!
//!     let response = session
//!         .request(Method::Get, namespace::SYSTEM_HARDWARE, serde_json::json!({}))
//!         .await?;
//!     println!("{}", response.text());
//!
//!     session.transport().disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod ble;
pub mod config;
pub mod error;
pub mod onboard;
pub mod session;
pub mod transport;

pub use config::ControllerConfig;
pub use error::{Error, Result};
pub use onboard::{OnboardReport, OnboardRequest, PasswordMode, onboard};
pub use session::{Response, Session};
pub use transport::{BleTransport, Transport};
