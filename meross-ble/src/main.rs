//! BLE onboarding tool for Meross devices
//!
//! Scans for devices in pairing mode, lists the networks they can see, sends
//! raw requests and runs the key and WiFi onboarding flow.

use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use meross_ble_controller::onboard::DEFAULT_USER_ID;
use meross_ble_controller::{
    ControllerConfig, OnboardReport, OnboardRequest, PasswordMode, Session, Transport, ble, onboard,
};
use meross_proto::{Envelope, Gateway, Method, WifiConfig, WifiList, namespace};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "meross-ble")]
#[command(about = "BLE onboarding tool for Meross devices")]
struct Cli {
    /// ATT MTU of the link (writes carry MTU - 3 bytes)
    #[arg(long, global = true)]
    mtu: Option<usize>,
    /// Seconds to wait for each response
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Log frame traffic
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for devices in pairing mode
    Scan {
        /// Scan duration in seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },
    /// List the WiFi networks a device can see
    WifiScan {
        /// Device address
        #[arg(short = 'a', long)]
        mac_address: String,
        /// Only show networks with this SSID
        #[arg(short, long)]
        ssid: Option<String>,
    },
    /// Send a single request and print the raw response
    Send {
        /// Device address
        #[arg(short = 'a', long)]
        mac_address: String,
        /// Request method, e.g. GET or SET
        #[arg(short, long)]
        method: String,
        /// Request namespace, e.g. Appliance.System.Hardware
        #[arg(short, long)]
        namespace: String,
        /// JSON payload
        #[arg(short, long, default_value = "{}")]
        payload: String,
    },
    /// Configure the cloud key and WiFi credentials
    Onboard(OnboardArgs),
}

#[derive(Args)]
struct OnboardArgs {
    /// Device address
    #[arg(short = 'a', long)]
    mac_address: String,
    /// MQTT host the device should connect to
    #[arg(short = 'd', long)]
    host: String,
    /// MQTT port
    #[arg(short = 'P', long)]
    port: u16,
    /// Key the device signs messages with
    #[arg(short, long)]
    key: String,
    /// WiFi password
    #[arg(short, long)]
    password: String,
    #[arg(short, long, default_value = DEFAULT_USER_ID)]
    userid: String,
    /// Network as printed by wifi-scan; explicit flags take precedence
    #[arg(short = 'j', long)]
    from_json: Option<String>,
    #[arg(short, long)]
    ssid: Option<String>,
    #[arg(short, long)]
    bssid: Option<String>,
    #[arg(short, long)]
    channel: Option<u32>,
    #[arg(short, long)]
    encryption: Option<u32>,
    #[arg(short = 'C', long)]
    cipher: Option<u32>,
    /// Send the password unencrypted (older firmware)
    #[arg(long)]
    plaintext_password: bool,
}

/// Fields accepted by `--from-json`.
#[derive(Deserialize, Default)]
#[serde(default)]
struct WifiJson {
    ssid: Option<String>,
    bssid: Option<String>,
    channel: Option<u32>,
    encryption: Option<u32>,
    cipher: Option<u32>,
}

impl OnboardArgs {
    /// Merge flags over `--from-json`. Errors name the missing fields.
    fn wifi_config(&self) -> Result<WifiConfig, clap::Error> {
        let json = match &self.from_json {
            Some(raw) => serde_json::from_str::<WifiJson>(raw).map_err(|e| {
                Cli::command().error(ErrorKind::InvalidValue, format!("invalid --from-json: {e}"))
            })?,
            None => WifiJson::default(),
        };

        let ssid = self.ssid.clone().or(json.ssid);
        let bssid = self.bssid.clone().or(json.bssid);
        let channel = self.channel.or(json.channel);
        let encryption = self.encryption.or(json.encryption);
        let cipher = self.cipher.or(json.cipher);

        match (ssid, bssid, channel, encryption, cipher) {
            (Some(ssid), Some(bssid), Some(channel), Some(encryption), Some(cipher)) => {
                Ok(WifiConfig {
                    ssid,
                    password: self.password.clone(),
                    bssid,
                    channel,
                    encryption,
                    cipher,
                })
            }
            (ssid, bssid, channel, encryption, cipher) => {
                let missing: Vec<_> = [
                    ("--ssid", ssid.is_none()),
                    ("--bssid", bssid.is_none()),
                    ("--channel", channel.is_none()),
                    ("--encryption", encryption.is_none()),
                    ("--cipher", cipher.is_none()),
                ]
                .into_iter()
                .filter_map(|(flag, absent)| absent.then_some(flag))
                .collect();
                Err(Cli::command().error(
                    ErrorKind::MissingRequiredArgument,
                    format!(
                        "missing WiFi parameters: {} (pass them or use --from-json)",
                        missing.join(", ")
                    ),
                ))
            }
        }
    }

    fn request(&self) -> Result<OnboardRequest, clap::Error> {
        Ok(OnboardRequest {
            gateway: Gateway {
                host: self.host.clone(),
                port: self.port,
            },
            key: self.key.clone(),
            user_id: self.userid.clone(),
            wifi: self.wifi_config()?,
            password_mode: if self.plaintext_password {
                PasswordMode::Plaintext
            } else {
                PasswordMode::Encrypted
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();

    let mut config = ControllerConfig::from_env();
    if let Some(mtu) = cli.mtu {
        config.mtu = mtu;
    }
    if let Some(secs) = cli.timeout {
        config.response_timeout = Duration::from_secs(secs);
    }

    match cli.command {
        Commands::Scan { duration } => {
            if let Some(secs) = duration {
                config.scan_duration = Duration::from_secs(secs);
            }
            scan_devices(&config).await?;
        }
        Commands::WifiScan { mac_address, ssid } => {
            let mut session = ble::connect(&mac_address, &config).await?;
            let result = wifi_scan(&mut session, ssid.as_deref()).await;
            let _ = session.transport().disconnect().await;
            println!("{}", result?);
        }
        Commands::Send {
            mac_address,
            method,
            namespace,
            payload,
        } => {
            let payload: serde_json::Value = serde_json::from_str(&payload).map_err(|e| {
                Cli::command().error(ErrorKind::InvalidValue, format!("invalid --payload: {e}"))
            })?;
            let envelope = Envelope::new(&method, &namespace, payload);

            let mut session = ble::connect(&mac_address, &config).await?;
            let response = session.send(&envelope).await;
            let _ = session.transport().disconnect().await;
            println!("{}", response?.text());
        }
        Commands::Onboard(args) => {
            let request = args.request().unwrap_or_else(|e| e.exit());

            let mut session = ble::connect(&args.mac_address, &config).await?;
            let report = onboard(&mut session, &request).await;
            // the device usually drops the link itself after WifiX
            let _ = session.transport().disconnect().await;
            let report = report?;

            for line in report_lines(&report)? {
                println!("{line}");
            }
            println!(
                "Onboarded {} ({}). Device will join \"{}\".",
                report.hardware.device_type, report.hardware.mac_address, request.wifi.ssid
            );
        }
    }

    Ok(())
}

async fn scan_devices(config: &ControllerConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Scanning for Meross devices ({} seconds)...",
        config.scan_duration.as_secs()
    );
    let devices = ble::scan(config.scan_duration).await?;

    if devices.is_empty() {
        println!("No devices found");
        return Ok(());
    }

    println!("\nFound {} devices:", devices.len());
    for device in devices {
        let rssi = device
            .rssi
            .map(|r| format!("{} dBm", r))
            .unwrap_or_else(|| "N/A".to_string());
        println!("  {} ({}) RSSI: {}", device.name, device.address, rssi);
    }
    Ok(())
}

/// Compact JSON of the visible networks; a single match prints as an object.
async fn wifi_scan<T: Transport>(
    session: &mut Session<T>,
    ssid: Option<&str>,
) -> Result<String, Box<dyn std::error::Error>> {
    let payload = session
        .request(Method::Get, namespace::CONFIG_WIFI_LIST, serde_json::json!({}))
        .await?
        .payload()?;
    let list = WifiList::from_payload(&payload)?;
    Ok(networks_json(&list, ssid)?)
}

/// One compact JSON line per device reply, in the order they arrived.
fn report_lines(report: &OnboardReport) -> serde_json::Result<Vec<String>> {
    [
        &report.hardware_response,
        &report.key_response,
        &report.wifi_response,
    ]
    .into_iter()
    .map(serde_json::to_string)
    .collect()
}

fn networks_json(list: &WifiList, ssid: Option<&str>) -> serde_json::Result<String> {
    match list.filter_ssid(ssid).as_slice() {
        [single] => serde_json::to_string(single),
        many => serde_json::to_string(many),
    }
}
