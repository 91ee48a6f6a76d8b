//! Common types for BMC operations

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::{BmcError, Result};

/// Requested power action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    /// Power on
    On,
    /// Hard power off
    Off,
    /// ACPI soft shutdown
    Soft,
    /// Hard reset
    Reset,
    /// Power off then on
    Cycle,
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerAction::On => write!(f, "on"),
            PowerAction::Off => write!(f, "off"),
            PowerAction::Soft => write!(f, "soft"),
            PowerAction::Reset => write!(f, "reset"),
            PowerAction::Cycle => write!(f, "cycle"),
        }
    }
}

impl FromStr for PowerAction {
    type Err = BmcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(PowerAction::On),
            "off" => Ok(PowerAction::Off),
            "soft" => Ok(PowerAction::Soft),
            "reset" => Ok(PowerAction::Reset),
            "cycle" => Ok(PowerAction::Cycle),
            other => Err(BmcError::InvalidConfig(format!(
                "unknown power state: {}",
                other
            ))),
        }
    }
}

/// Power state of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    /// Machine is powered on
    On,
    /// Machine is powered off
    Off,
    /// Power state is unknown
    Unknown,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => write!(f, "on"),
            PowerState::Off => write!(f, "off"),
            PowerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Boot device selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootDevice {
    /// BIOS setup
    Bios,
    /// CD/DVD
    Cdrom,
    /// Diagnostics partition
    Diag,
    /// Floppy
    Floppy,
    /// Local disk
    Disk,
    /// No override (use default)
    None,
    /// Network (PXE)
    Pxe,
    /// Remotely mounted drive
    RemoteDrive,
    /// SD card
    SdCard,
    /// USB device
    Usb,
    /// Vendor utilities partition
    Utilities,
}

impl BootDevice {
    pub const ALL: [BootDevice; 11] = [
        BootDevice::Bios,
        BootDevice::Cdrom,
        BootDevice::Diag,
        BootDevice::Floppy,
        BootDevice::Disk,
        BootDevice::None,
        BootDevice::Pxe,
        BootDevice::RemoteDrive,
        BootDevice::SdCard,
        BootDevice::Usb,
        BootDevice::Utilities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BootDevice::Bios => "bios",
            BootDevice::Cdrom => "cdrom",
            BootDevice::Diag => "diag",
            BootDevice::Floppy => "floppy",
            BootDevice::Disk => "disk",
            BootDevice::None => "none",
            BootDevice::Pxe => "pxe",
            BootDevice::RemoteDrive => "remote_drive",
            BootDevice::SdCard => "sd_card",
            BootDevice::Usb => "usb",
            BootDevice::Utilities => "utilities",
        }
    }
}

impl fmt::Display for BootDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BootDevice {
    type Err = BmcError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_ascii_lowercase();
        BootDevice::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| BmcError::InvalidConfig(format!("unknown boot device: {}", s)))
    }
}

/// Current boot override as reported by the BMC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootDeviceOverride {
    pub device: BootDevice,
    pub persistent: bool,
    pub efi_boot: bool,
}

/// When a firmware update takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirmwareApplyTime {
    Immediate,
    OnReset,
}

/// State of a firmware install task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirmwareInstallState {
    Queued,
    Running,
    Complete,
    Failed,
    Unknown,
    AwaitingPowerCycle,
}

impl FirmwareInstallState {
    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FirmwareInstallState::Complete
                | FirmwareInstallState::Failed
                | FirmwareInstallState::AwaitingPowerCycle
        )
    }
}

impl fmt::Display for FirmwareInstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FirmwareInstallState::Queued => "queued",
            FirmwareInstallState::Running => "running",
            FirmwareInstallState::Complete => "complete",
            FirmwareInstallState::Failed => "failed",
            FirmwareInstallState::Unknown => "unknown",
            FirmwareInstallState::AwaitingPowerCycle => "awaiting-power-cycle",
        };
        f.write_str(s)
    }
}

/// BMC reset flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmcResetType {
    Warm,
    Cold,
}

impl fmt::Display for BmcResetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BmcResetType::Warm => write!(f, "warm"),
            BmcResetType::Cold => write!(f, "cold"),
        }
    }
}

impl FromStr for BmcResetType {
    type Err = BmcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "warm" => Ok(BmcResetType::Warm),
            "cold" => Ok(BmcResetType::Cold),
            other => Err(BmcError::InvalidConfig(format!(
                "unknown reset type: {}",
                other
            ))),
        }
    }
}

/// Kind of virtual media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VirtualMediaKind {
    Cd,
    Floppy,
    Usb,
}

/// Wire protocol a provider speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Redfish,
    Ipmi,
    /// Vendor HTTP with session cookies
    Http,
    Soap,
    Ssh,
    /// Wake-on-LAN
    Wol,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::Redfish => "redfish",
            Protocol::Ipmi => "ipmi",
            Protocol::Http => "http",
            Protocol::Soap => "soap",
            Protocol::Ssh => "ssh",
            Protocol::Wol => "wol",
        };
        f.write_str(s)
    }
}

/// A binary payload that can be read more than once
///
/// Each provider attempt opens its own reader, so a fallback provider
/// always starts from the first byte.
#[derive(Debug, Clone)]
pub enum Payload {
    /// In-memory image
    Bytes(Bytes),
    /// Image on local disk
    File(PathBuf),
}

impl Payload {
    /// Open a fresh reader over the payload
    pub async fn open(&self) -> Result<Box<dyn AsyncRead + Send + Unpin>> {
        match self {
            Payload::Bytes(bytes) => Ok(Box::new(std::io::Cursor::new(bytes.clone()))),
            Payload::File(path) => {
                let file = tokio::fs::File::open(path).await?;
                Ok(Box::new(file))
            }
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(data))
    }
}

impl From<PathBuf> for Payload {
    fn from(path: PathBuf) -> Self {
        Payload::File(path)
    }
}

/// Hardware inventory of one machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub vendor: String,
    pub model: String,
    pub serial: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmc_firmware: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bios_firmware: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
}

/// One inventoried component (CPU, DIMM, NIC, drive, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

/// BIOS/UEFI POST progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCode {
    pub status: String,
    pub code: i32,
}

/// Captured console image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub image: Bytes,
    /// e.g. "png", "jpg"
    pub file_type: String,
}

/// Power sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSensor {
    pub id: String,
    pub name: String,
    pub input_watts: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_watts: Option<f64>,
}

/// Temperature sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSensor {
    pub id: String,
    pub name: String,
    pub reading_celsius: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_celsius: Option<f64>,
}

/// Fan sensor reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanSensor {
    pub id: String,
    pub name: String,
    pub rpm: Option<u32>,
}

/// Health rollup of one chassis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChassisHealth {
    pub id: String,
    pub name: String,
    /// e.g. "OK", "Warning", "Critical"
    pub health: String,
}

/// System event log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelEntry {
    pub id: String,
    pub timestamp: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

/// User account as reported by the BMC
pub type UserRecord = HashMap<String, String>;

/// BIOS attribute name to value
pub type BiosConfiguration = HashMap<String, String>;

/// IPMI connection configuration
#[derive(Debug, Clone)]
pub struct IpmiConfig {
    /// BMC IP address or hostname
    pub host: String,
    /// BMC port (default 623)
    pub port: u16,
    /// Username
    pub username: String,
    /// Password
    pub password: String,
    /// ipmitool interface (default "lanplus")
    pub interface: String,
}

impl IpmiConfig {
    /// Create new IPMI config
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: 623,
            username: username.into(),
            password: password.into(),
            interface: "lanplus".to_string(),
        }
    }

    /// Set custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the ipmitool interface (`lan`, `lanplus`, `open`)
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }
}

/// Wake-on-LAN configuration
#[derive(Debug, Clone)]
pub struct WolConfig {
    /// Target MAC address
    pub mac_address: [u8; 6],
    /// Broadcast address (default 255.255.255.255)
    pub broadcast_address: IpAddr,
    /// Port (default 9)
    pub port: u16,
}

impl WolConfig {
    /// Create new WoL config from MAC address
    pub fn new(mac_address: [u8; 6]) -> Self {
        Self {
            mac_address,
            broadcast_address: IpAddr::V4(std::net::Ipv4Addr::BROADCAST),
            port: 9,
        }
    }

    /// Parse MAC address from string (e.g., "aa:bb:cc:dd:ee:ff")
    pub fn from_mac_string(mac: &str) -> Option<Self> {
        let parts: Vec<&str> = mac.split(':').collect();
        if parts.len() != 6 {
            return None;
        }

        let mut addr = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            addr[i] = u8::from_str_radix(part, 16).ok()?;
        }

        Some(Self::new(addr))
    }

    /// Set custom broadcast address
    pub fn with_broadcast(mut self, addr: IpAddr) -> Self {
        self.broadcast_address = addr;
        self
    }

    /// Set custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Get MAC address as string
    pub fn mac_string(&self) -> String {
        self.mac_address
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_power_action_roundtrip() {
        for action in [
            PowerAction::On,
            PowerAction::Off,
            PowerAction::Soft,
            PowerAction::Reset,
            PowerAction::Cycle,
        ] {
            assert_eq!(action.to_string().parse::<PowerAction>().unwrap(), action);
        }
        assert!("hibernate".parse::<PowerAction>().is_err());
    }

    #[test]
    fn test_power_state_display() {
        assert_eq!(PowerState::On.to_string(), "on");
        assert_eq!(PowerState::Off.to_string(), "off");
        assert_eq!(PowerState::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_boot_device_parse() {
        assert_eq!("pxe".parse::<BootDevice>().unwrap(), BootDevice::Pxe);
        assert_eq!(
            "REMOTE_DRIVE".parse::<BootDevice>().unwrap(),
            BootDevice::RemoteDrive
        );
        assert_eq!(BootDevice::SdCard.to_string(), "sd_card");
        assert!("tape".parse::<BootDevice>().is_err());
    }

    #[test]
    fn test_firmware_state_terminal() {
        assert!(FirmwareInstallState::Complete.is_terminal());
        assert!(FirmwareInstallState::AwaitingPowerCycle.is_terminal());
        assert!(!FirmwareInstallState::Running.is_terminal());
        assert_eq!(
            FirmwareInstallState::AwaitingPowerCycle.to_string(),
            "awaiting-power-cycle"
        );
    }

    #[test]
    fn test_reset_type_parse() {
        assert_eq!("Cold".parse::<BmcResetType>().unwrap(), BmcResetType::Cold);
        assert!("lukewarm".parse::<BmcResetType>().is_err());
    }

    #[test]
    fn test_ipmi_config() {
        let config = IpmiConfig::new("192.168.1.100", "admin", "password");

        assert_eq!(config.port, 623);
        assert_eq!(config.username, "admin");
        assert_eq!(config.interface, "lanplus");

        let config = config.with_port(6230).with_interface("lan");
        assert_eq!(config.port, 6230);
        assert_eq!(config.interface, "lan");
    }

    #[test]
    fn test_wol_config_from_mac() {
        let config = WolConfig::from_mac_string("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(config.mac_address, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(config.mac_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_wol_config_invalid_mac() {
        assert!(WolConfig::from_mac_string("invalid").is_none());
        assert!(WolConfig::from_mac_string("aa:bb:cc").is_none());
        assert!(WolConfig::from_mac_string("aa:bb:cc:dd:ee:gg").is_none());
    }

    #[test]
    fn test_wol_config_builder() {
        let config = WolConfig::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55])
            .with_broadcast(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 255)))
            .with_port(7);

        assert_eq!(
            config.broadcast_address,
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 255))
        );
        assert_eq!(config.port, 7);
    }

    #[tokio::test]
    async fn test_payload_reopens_from_start() {
        let payload = Payload::from(b"firmware-image".to_vec());

        for _ in 0..2 {
            let mut reader = payload.open().await.unwrap();
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).await.unwrap();
            assert_eq!(buf, b"firmware-image");
        }
    }

    #[tokio::test]
    async fn test_payload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bios.bin");
        std::fs::write(&path, b"\x01\x02\x03").unwrap();

        let mut reader = Payload::from(path).open().await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_payload_missing_file() {
        let result = Payload::File(PathBuf::from("/nonexistent/bmcmux/image.bin"))
            .open()
            .await;
        assert!(matches!(result, Err(BmcError::Io(_))));
    }
}
