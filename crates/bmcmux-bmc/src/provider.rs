//! Provider trait and registration
//!
//! A provider is one protocol-specific implementation for one physical BMC.
//! It advertises what it can do through the `as_*` accessors: each returns
//! `Some(self)` for a capability the provider implements and `None`
//! otherwise. The defaults return `None`, so an implementation only lists
//! what it supports.
//!
//! ```ignore
//! struct Ipmi;
//!
//! impl Provider for Ipmi {
//!     fn name(&self) -> Option<&str> {
//!         Some("ipmitool")
//!     }
//!
//!     fn as_power_setter(&self) -> Option<&dyn PowerSetter> {
//!         Some(self)
//!     }
//! }
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use crate::connection::{Closer, Opener};
use crate::ops::bios::{BiosConfigurationGetter, BiosConfigurationResetter, BiosConfigurationSetter};
use crate::ops::bmc_reset::BmcResetter;
use crate::ops::boot_device::{BootDeviceOverrideGetter, BootDeviceSetter};
use crate::ops::diagnostics::{PostCodeGetter, Screenshotter};
use crate::ops::firmware::{FirmwareInstallVerifier, FirmwareInstaller};
use crate::ops::inventory::InventoryGetter;
use crate::ops::nmi::NmiSender;
use crate::ops::power::{PowerSetter, PowerStateGetter};
use crate::ops::sel::{SystemEventLogClearer, SystemEventLogGetter};
use crate::ops::sensors::{
    ChassisHealthGetter, FanSensorGetter, PowerSensorGetter, TemperatureSensorGetter,
};
use crate::ops::sol::SolDeactivator;
use crate::ops::user::{UserCreator, UserDeleter, UserReader, UserUpdater};
use crate::ops::virtual_media::{
    FloppyImageMounter, FloppyImageUnmounter, VirtualMediaEjector, VirtualMediaInserter,
    VirtualMediaSetter,
};
use crate::types::Protocol;

/// A protocol-specific BMC implementation
pub trait Provider: Send + Sync {
    /// Declared display name
    ///
    /// When `None`, the concrete type name captured at registration is used.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Wire protocol, used only for registry filtering
    fn protocol(&self) -> Option<Protocol> {
        None
    }

    fn as_opener(&self) -> Option<&dyn Opener> {
        None
    }

    fn as_closer(&self) -> Option<&dyn Closer> {
        None
    }

    fn as_power_setter(&self) -> Option<&dyn PowerSetter> {
        None
    }

    fn as_power_state_getter(&self) -> Option<&dyn PowerStateGetter> {
        None
    }

    fn as_boot_device_setter(&self) -> Option<&dyn BootDeviceSetter> {
        None
    }

    fn as_boot_device_override_getter(&self) -> Option<&dyn BootDeviceOverrideGetter> {
        None
    }

    fn as_bios_configuration_getter(&self) -> Option<&dyn BiosConfigurationGetter> {
        None
    }

    fn as_bios_configuration_setter(&self) -> Option<&dyn BiosConfigurationSetter> {
        None
    }

    fn as_bios_configuration_resetter(&self) -> Option<&dyn BiosConfigurationResetter> {
        None
    }

    fn as_firmware_installer(&self) -> Option<&dyn FirmwareInstaller> {
        None
    }

    fn as_firmware_install_verifier(&self) -> Option<&dyn FirmwareInstallVerifier> {
        None
    }

    fn as_inventory_getter(&self) -> Option<&dyn InventoryGetter> {
        None
    }

    fn as_user_creator(&self) -> Option<&dyn UserCreator> {
        None
    }

    fn as_user_updater(&self) -> Option<&dyn UserUpdater> {
        None
    }

    fn as_user_deleter(&self) -> Option<&dyn UserDeleter> {
        None
    }

    fn as_user_reader(&self) -> Option<&dyn UserReader> {
        None
    }

    fn as_nmi_sender(&self) -> Option<&dyn NmiSender> {
        None
    }

    fn as_system_event_log_clearer(&self) -> Option<&dyn SystemEventLogClearer> {
        None
    }

    fn as_system_event_log_getter(&self) -> Option<&dyn SystemEventLogGetter> {
        None
    }

    fn as_virtual_media_setter(&self) -> Option<&dyn VirtualMediaSetter> {
        None
    }

    fn as_virtual_media_inserter(&self) -> Option<&dyn VirtualMediaInserter> {
        None
    }

    fn as_virtual_media_ejector(&self) -> Option<&dyn VirtualMediaEjector> {
        None
    }

    fn as_floppy_image_mounter(&self) -> Option<&dyn FloppyImageMounter> {
        None
    }

    fn as_floppy_image_unmounter(&self) -> Option<&dyn FloppyImageUnmounter> {
        None
    }

    fn as_bmc_resetter(&self) -> Option<&dyn BmcResetter> {
        None
    }

    fn as_sol_deactivator(&self) -> Option<&dyn SolDeactivator> {
        None
    }

    fn as_post_code_getter(&self) -> Option<&dyn PostCodeGetter> {
        None
    }

    fn as_screenshotter(&self) -> Option<&dyn Screenshotter> {
        None
    }

    fn as_power_sensor_getter(&self) -> Option<&dyn PowerSensorGetter> {
        None
    }

    fn as_temperature_sensor_getter(&self) -> Option<&dyn TemperatureSensorGetter> {
        None
    }

    fn as_fan_sensor_getter(&self) -> Option<&dyn FanSensorGetter> {
        None
    }

    fn as_chassis_health_getter(&self) -> Option<&dyn ChassisHealthGetter> {
        None
    }
}

/// A provider with its identity resolved at registration time
#[derive(Clone)]
pub struct RegisteredProvider {
    name: String,
    type_name: &'static str,
    provider: Arc<dyn Provider>,
}

impl RegisteredProvider {
    /// Register a provider by value
    pub fn new<P: Provider + 'static>(provider: P) -> Self {
        Self::from_arc(Arc::new(provider))
    }

    /// Register a shared provider
    pub fn from_arc<P: Provider + 'static>(provider: Arc<P>) -> Self {
        let type_name = type_name::<P>();
        let name = resolve_name(provider.as_ref(), type_name);
        Self {
            name,
            type_name,
            provider,
        }
    }

    /// Display name: declared name, or the concrete type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concrete type name of the provider
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn protocol(&self) -> Option<Protocol> {
        self.provider.protocol()
    }

    /// The provider itself
    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }
}

impl fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("protocol", &self.protocol())
            .finish_non_exhaustive()
    }
}

/// Display name for a provider
pub fn resolve_name(provider: &dyn Provider, type_name: &str) -> String {
    match provider.name() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => type_name.to_string(),
    }
}
