//! `bmcmux providers`
//!
//! Lists the configured providers in precedence order together with the
//! capabilities each one advertises. Nothing is sent to the BMC.

use bmcmux_bmc::connection::{Closer, Opener};
use bmcmux_bmc::ops::bmc_reset::BmcResetter;
use bmcmux_bmc::ops::boot_device::{BootDeviceOverrideGetter, BootDeviceSetter};
use bmcmux_bmc::ops::nmi::NmiSender;
use bmcmux_bmc::ops::power::{PowerSetter, PowerStateGetter};
use bmcmux_bmc::ops::sel::{SystemEventLogClearer, SystemEventLogGetter};
use bmcmux_bmc::ops::sol::SolDeactivator;
use bmcmux_bmc::{Capability, Protocol, RegisteredProvider};
use color_eyre::eyre::Result;
use serde::Serialize;

use crate::config::BmcConfig;

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    pub capabilities: Vec<&'static str>,
}

fn advertise<C: Capability + ?Sized>(provider: &RegisteredProvider, out: &mut Vec<&'static str>) {
    if C::resolve(provider.provider()).is_some() {
        out.push(C::NAME);
    }
}

impl ProviderInfo {
    pub fn describe(provider: &RegisteredProvider) -> Self {
        let mut capabilities = Vec::new();
        advertise::<dyn Opener>(provider, &mut capabilities);
        advertise::<dyn Closer>(provider, &mut capabilities);
        advertise::<dyn PowerSetter>(provider, &mut capabilities);
        advertise::<dyn PowerStateGetter>(provider, &mut capabilities);
        advertise::<dyn BootDeviceSetter>(provider, &mut capabilities);
        advertise::<dyn BootDeviceOverrideGetter>(provider, &mut capabilities);
        advertise::<dyn BmcResetter>(provider, &mut capabilities);
        advertise::<dyn NmiSender>(provider, &mut capabilities);
        advertise::<dyn SystemEventLogClearer>(provider, &mut capabilities);
        advertise::<dyn SystemEventLogGetter>(provider, &mut capabilities);
        advertise::<dyn SolDeactivator>(provider, &mut capabilities);

        Self {
            name: provider.name().to_string(),
            protocol: provider.protocol(),
            capabilities,
        }
    }
}

pub fn run(config: &BmcConfig) -> Result<()> {
    let client = config.client()?;
    let infos: Vec<ProviderInfo> = client
        .registry()
        .providers()
        .iter()
        .map(ProviderInfo::describe)
        .collect();

    println!("{}", serde_json::to_string_pretty(&infos)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_wol() {
        let config = crate::config::parse(
            "host: bmc1\nmac: \"aa:bb:cc:dd:ee:ff\"\nproviders: [wol, ipmitool]\n",
        )
        .unwrap();
        let client = config.client().unwrap();
        let infos: Vec<ProviderInfo> = client
            .registry()
            .providers()
            .iter()
            .map(ProviderInfo::describe)
            .collect();

        assert_eq!(infos[0].name, "wol");
        assert_eq!(infos[0].protocol, Some(Protocol::Wol));
        assert_eq!(infos[0].capabilities, vec!["Opener", "Closer", "PowerSetter"]);

        assert_eq!(infos[1].name, "ipmitool");
        assert!(infos[1].capabilities.contains(&"PowerStateGetter"));
        assert!(infos[1].capabilities.contains(&"SolDeactivator"));
        assert!(!infos[1].capabilities.contains(&"BootDeviceOverrideGetter"));
    }
}
