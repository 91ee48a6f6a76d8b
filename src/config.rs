//! BMC configuration file
//!
//! One YAML file describes one machine:
//!
//! ```yaml
//! host: 10.0.0.5
//! username: admin
//! password: secret
//! mac: "aa:bb:cc:dd:ee:ff"
//! providers: [ipmitool, wol]
//! prefer: wol
//! executor:
//!   attempt_timeout_secs: 10
//! ```

use std::fmt;
use std::net::IpAddr;
use std::path::Path;

use bmcmux_bmc::providers::{IpmitoolProvider, WolProvider};
use bmcmux_bmc::{Client, ExecutorConfig, IpmiConfig, Registry, WolConfig};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_port() -> u16 {
    623
}

fn default_interface() -> String {
    "lanplus".to_string()
}

/// Providers the CLI knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ipmitool,
    Wol,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Ipmitool => write!(f, "ipmitool"),
            ProviderKind::Wol => write!(f, "wol"),
        }
    }
}

/// Settings for one BMC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmcConfig {
    /// BMC address or hostname
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// ipmitool interface
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Path to the ipmitool binary
    #[serde(default)]
    pub ipmitool_path: Option<String>,

    /// Host MAC address, needed by the wol provider
    #[serde(default)]
    pub mac: Option<String>,

    /// Broadcast address for magic packets
    #[serde(default)]
    pub broadcast: Option<IpAddr>,

    /// Providers in precedence order
    #[serde(default)]
    pub providers: Vec<ProviderKind>,

    /// Provider to try first
    #[serde(default)]
    pub prefer: Option<String>,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

impl BmcConfig {
    /// Check the settings make sense together
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("host must not be empty");
        }
        if self.providers.is_empty() {
            bail!("at least one provider must be configured");
        }

        if self.providers.contains(&ProviderKind::Wol) {
            let mac = self
                .mac
                .as_deref()
                .ok_or_else(|| eyre!("the wol provider requires `mac`"))?;
            if WolConfig::from_mac_string(mac).is_none() {
                bail!("invalid MAC address: {}", mac);
            }
        }

        self.executor.validate()?;

        if let Some(prefer) = &self.prefer {
            if !self.providers.iter().any(|p| p.to_string() == *prefer) {
                bail!("preferred provider {} is not configured", prefer);
            }
        }

        Ok(())
    }

    /// Build the provider registry in configured order
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::new();

        for kind in &self.providers {
            match kind {
                ProviderKind::Ipmitool => {
                    let ipmi = IpmiConfig::new(&self.host, &self.username, &self.password)
                        .with_port(self.port)
                        .with_interface(&self.interface);
                    let mut provider = IpmitoolProvider::new(ipmi);
                    if let Some(path) = &self.ipmitool_path {
                        provider = provider.with_binary(path);
                    }
                    registry.register(provider);
                }
                ProviderKind::Wol => {
                    let mac = self.mac.as_deref().unwrap_or_default();
                    let mut wol = WolConfig::from_mac_string(mac)
                        .ok_or_else(|| eyre!("invalid MAC address: {}", mac))?;
                    if let Some(broadcast) = self.broadcast {
                        wol = wol.with_broadcast(broadcast);
                    }
                    registry.register(WolProvider::new(wol));
                }
            }
            debug!(provider = %kind, "Registered provider");
        }

        Ok(registry)
    }

    /// Client over the configured providers, preferred provider first
    pub fn client(&self) -> Result<Client> {
        let mut client = Client::new(&self.host, self.registry()?)
            .with_executor(self.executor.executor(&self.host));
        if let Some(prefer) = &self.prefer {
            client.prefer_provider(prefer);
        }
        Ok(client)
    }
}

/// Parse and validate a config document
pub fn parse(contents: &str) -> Result<BmcConfig> {
    let config: BmcConfig =
        serde_yaml::from_str(contents).wrap_err("Failed to parse BMC config")?;
    config.validate().wrap_err("Invalid BMC config")?;
    Ok(config)
}

/// Load the config file at `path`
pub fn load(path: &Path) -> Result<BmcConfig> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
    parse(&contents).wrap_err_with(|| format!("Failed to load {}", path.display()))
}
