//! Scripted provider for tests
//!
//! [`ScriptedProvider`] implements every capability. Only the capabilities
//! given a [`Behavior`] with [`ScriptedProvider::script`] are advertised;
//! the rest look unimplemented to the dispatcher. Every invocation is
//! recorded in a [`CallLog`] that stays readable after the provider has
//! been moved into a registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::capability::Capability;
use crate::connection::{Closer, Opener};
use crate::context::Context;
use crate::error::{BmcError, Result};
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
use crate::provider::Provider;
use crate::types::{
    BiosConfiguration, BmcResetType, BootDevice, BootDeviceOverride, ChassisHealth, Component,
    Device, FanSensor, FirmwareApplyTime, FirmwareInstallState, PostCode, PowerAction,
    PowerSensor, PowerState, Protocol, Screenshot, SelEntry, TemperatureSensor, UserRecord,
    VirtualMediaKind,
};

/// How a scripted capability responds
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Succeed (`Ok(true)` for flag operations)
    Succeed,
    /// Return `Ok(false)`, or `BmcError::Unsuccessful` for operations without
    /// a flag; the executor records either as a soft failure
    Decline,
    /// Return `CommandFailed` with the message
    Fail(String),
    /// Block for the duration (or until the context ends), then succeed
    Hang(Duration),
}

/// Capability names in invocation order
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    fn record(&self, capability: &'static str) {
        lock(&self.0).push(capability);
    }

    pub fn names(&self) -> Vec<&'static str> {
        lock(&self.0).clone()
    }

    pub fn count(&self, capability: &str) -> usize {
        lock(&self.0).iter().filter(|c| **c == capability).count()
    }
}

/// Sizes of payloads read by firmware and floppy uploads
#[derive(Debug, Clone, Default)]
pub struct UploadLog(Arc<Mutex<Vec<usize>>>);

impl UploadLog {
    fn record(&self, size: usize) {
        lock(&self.0).push(size);
    }

    pub fn sizes(&self) -> Vec<usize> {
        lock(&self.0).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// A provider whose behavior is set per capability
pub struct ScriptedProvider {
    name: String,
    protocol: Option<Protocol>,
    behaviors: HashMap<&'static str, Behavior>,
    power_state: PowerState,
    tasks: Mutex<HashMap<String, FirmwareInstallState>>,
    calls: CallLog,
    uploads: UploadLog,
}

impl ScriptedProvider {
    /// A provider named `name` with no capabilities
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol: None,
            behaviors: HashMap::new(),
            power_state: PowerState::On,
            tasks: Mutex::new(HashMap::new()),
            calls: CallLog::default(),
            uploads: UploadLog::default(),
        }
    }

    /// Advertise capability `C` with the given behavior
    pub fn script<C: Capability + ?Sized>(mut self, behavior: Behavior) -> Self {
        self.behaviors.insert(C::NAME, behavior);
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Power state reported by `PowerStateGetter`
    pub fn with_power_state(mut self, state: PowerState) -> Self {
        self.power_state = state;
        self
    }

    /// Make a firmware task id known to `FirmwareInstallVerifier`
    pub fn with_task(self, task_id: impl Into<String>, state: FirmwareInstallState) -> Self {
        lock(&self.tasks).insert(task_id.into(), state);
        self
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn uploads(&self) -> UploadLog {
        self.uploads.clone()
    }

    fn scripts<C: Capability + ?Sized>(&self) -> bool {
        self.behaviors.contains_key(C::NAME)
    }

    async fn play<C: Capability + ?Sized>(&self, ctx: &Context) -> Result<bool> {
        self.calls.record(C::NAME);
        let behavior = self
            .behaviors
            .get(C::NAME)
            .cloned()
            .unwrap_or(Behavior::Succeed);

        match behavior {
            Behavior::Succeed => Ok(true),
            Behavior::Decline => Ok(false),
            Behavior::Fail(msg) => Err(BmcError::CommandFailed(msg)),
            Behavior::Hang(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => Ok(true),
                    e = ctx.done() => Err(e.into()),
                }
            }
        }
    }

    async fn answer<C: Capability + ?Sized, T>(&self, ctx: &Context, value: T) -> Result<T> {
        if self.play::<C>(ctx).await? {
            Ok(value)
        } else {
            Err(BmcError::Unsuccessful(format!("{} declined {}", self.name, C::NAME)))
        }
    }

    async fn upload(&self, mut reader: Box<dyn AsyncRead + Send + Unpin>) -> Result<()> {
        let mut image = Vec::new();
        reader.read_to_end(&mut image).await?;
        self.uploads.record(image.len());
        Ok(())
    }
}

macro_rules! scripted_accessors {
    ($($capability:ident => $accessor:ident),* $(,)?) => {
        $(
            fn $accessor(&self) -> Option<&dyn $capability> {
                if self.scripts::<dyn $capability>() {
                    Some(self)
                } else {
                    None
                }
            }
        )*
    };
}

impl Provider for ScriptedProvider {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    scripted_accessors! {
        Opener => as_opener,
        Closer => as_closer,
        PowerSetter => as_power_setter,
        PowerStateGetter => as_power_state_getter,
        BootDeviceSetter => as_boot_device_setter,
        BootDeviceOverrideGetter => as_boot_device_override_getter,
        BiosConfigurationGetter => as_bios_configuration_getter,
        BiosConfigurationSetter => as_bios_configuration_setter,
        BiosConfigurationResetter => as_bios_configuration_resetter,
        FirmwareInstaller => as_firmware_installer,
        FirmwareInstallVerifier => as_firmware_install_verifier,
        InventoryGetter => as_inventory_getter,
        UserCreator => as_user_creator,
        UserUpdater => as_user_updater,
        UserDeleter => as_user_deleter,
        UserReader => as_user_reader,
        NmiSender => as_nmi_sender,
        SystemEventLogClearer => as_system_event_log_clearer,
        SystemEventLogGetter => as_system_event_log_getter,
        VirtualMediaSetter => as_virtual_media_setter,
        VirtualMediaInserter => as_virtual_media_inserter,
        VirtualMediaEjector => as_virtual_media_ejector,
        FloppyImageMounter => as_floppy_image_mounter,
        FloppyImageUnmounter => as_floppy_image_unmounter,
        BmcResetter => as_bmc_resetter,
        SolDeactivator => as_sol_deactivator,
        PostCodeGetter => as_post_code_getter,
        Screenshotter => as_screenshotter,
        PowerSensorGetter => as_power_sensor_getter,
        TemperatureSensorGetter => as_temperature_sensor_getter,
        FanSensorGetter => as_fan_sensor_getter,
        ChassisHealthGetter => as_chassis_health_getter,
    }
}

#[async_trait]
impl Opener for ScriptedProvider {
    async fn open(&self, ctx: &Context) -> Result<()> {
        self.answer::<dyn Opener, _>(ctx, ()).await
    }
}

#[async_trait]
impl Closer for ScriptedProvider {
    async fn close(&self, ctx: &Context) -> Result<()> {
        self.answer::<dyn Closer, _>(ctx, ()).await
    }
}

#[async_trait]
impl PowerSetter for ScriptedProvider {
    async fn power_set(&self, ctx: &Context, _action: PowerAction) -> Result<bool> {
        self.play::<dyn PowerSetter>(ctx).await
    }
}

#[async_trait]
impl PowerStateGetter for ScriptedProvider {
    async fn power_state_get(&self, ctx: &Context) -> Result<PowerState> {
        self.answer::<dyn PowerStateGetter, _>(ctx, self.power_state).await
    }
}

#[async_trait]
impl BootDeviceSetter for ScriptedProvider {
    async fn boot_device_set(
        &self,
        ctx: &Context,
        _device: BootDevice,
        _persistent: bool,
        _efi_boot: bool,
    ) -> Result<bool> {
        self.play::<dyn BootDeviceSetter>(ctx).await
    }
}

#[async_trait]
impl BootDeviceOverrideGetter for ScriptedProvider {
    async fn boot_device_override_get(&self, ctx: &Context) -> Result<BootDeviceOverride> {
        let current = BootDeviceOverride {
            device: BootDevice::Pxe,
            persistent: false,
            efi_boot: false,
        };
        self.answer::<dyn BootDeviceOverrideGetter, _>(ctx, current).await
    }
}

#[async_trait]
impl BiosConfigurationGetter for ScriptedProvider {
    async fn get_bios_configuration(&self, ctx: &Context) -> Result<BiosConfiguration> {
        let mut config = BiosConfiguration::new();
        config.insert("boot_mode".to_string(), "Uefi".to_string());
        config.insert("sriov".to_string(), "Disabled".to_string());
        self.answer::<dyn BiosConfigurationGetter, _>(ctx, config).await
    }
}

#[async_trait]
impl BiosConfigurationSetter for ScriptedProvider {
    async fn set_bios_configuration(&self, ctx: &Context, _config: &BiosConfiguration) -> Result<()> {
        self.answer::<dyn BiosConfigurationSetter, _>(ctx, ()).await
    }
}

#[async_trait]
impl BiosConfigurationResetter for ScriptedProvider {
    async fn reset_bios_configuration(&self, ctx: &Context) -> Result<()> {
        self.answer::<dyn BiosConfigurationResetter, _>(ctx, ()).await
    }
}

#[async_trait]
impl FirmwareInstaller for ScriptedProvider {
    async fn firmware_install(
        &self,
        ctx: &Context,
        _component: &str,
        _apply_time: FirmwareApplyTime,
        _force_install: bool,
        reader: Box<dyn AsyncRead + Send + Unpin>,
    ) -> Result<String> {
        self.upload(reader).await?;
        let task_id = format!("{}-task-{}", self.name, self.uploads.sizes().len());
        let task_id = self.answer::<dyn FirmwareInstaller, _>(ctx, task_id).await?;
        lock(&self.tasks).insert(task_id.clone(), FirmwareInstallState::Queued);
        Ok(task_id)
    }
}

#[async_trait]
impl FirmwareInstallVerifier for ScriptedProvider {
    async fn firmware_install_status(
        &self,
        ctx: &Context,
        _install_version: &str,
        _component: &str,
        task_id: &str,
    ) -> Result<FirmwareInstallState> {
        self.play::<dyn FirmwareInstallVerifier>(ctx).await?;
        let state = lock(&self.tasks).get(task_id).copied();
        state.ok_or_else(|| BmcError::TaskNotFound(task_id.to_string()))
    }
}

#[async_trait]
impl InventoryGetter for ScriptedProvider {
    async fn inventory(&self, ctx: &Context) -> Result<Device> {
        let device = Device {
            vendor: "Scripted".to_string(),
            model: "S-1000".to_string(),
            serial: format!("{}-0001", self.name),
            bmc_firmware: Some("1.0.0".to_string()),
            bios_firmware: Some("2.3.1".to_string()),
            components: vec![Component {
                kind: "cpu".to_string(),
                name: "CPU1".to_string(),
                firmware: None,
                attributes: HashMap::new(),
            }],
        };
        self.answer::<dyn InventoryGetter, _>(ctx, device).await
    }
}

#[async_trait]
impl UserCreator for ScriptedProvider {
    async fn user_create(&self, ctx: &Context, _user: &str, _pass: &str, _role: &str) -> Result<bool> {
        self.play::<dyn UserCreator>(ctx).await
    }
}

#[async_trait]
impl UserUpdater for ScriptedProvider {
    async fn user_update(&self, ctx: &Context, _user: &str, _pass: &str, _role: &str) -> Result<bool> {
        self.play::<dyn UserUpdater>(ctx).await
    }
}

#[async_trait]
impl UserDeleter for ScriptedProvider {
    async fn user_delete(&self, ctx: &Context, _user: &str) -> Result<bool> {
        self.play::<dyn UserDeleter>(ctx).await
    }
}

#[async_trait]
impl UserReader for ScriptedProvider {
    async fn user_read(&self, ctx: &Context) -> Result<Vec<UserRecord>> {
        let mut admin = UserRecord::new();
        admin.insert("name".to_string(), "admin".to_string());
        admin.insert("role".to_string(), "Administrator".to_string());
        self.answer::<dyn UserReader, _>(ctx, vec![admin]).await
    }
}

#[async_trait]
impl NmiSender for ScriptedProvider {
    async fn send_nmi(&self, ctx: &Context) -> Result<()> {
        self.answer::<dyn NmiSender, _>(ctx, ()).await
    }
}

#[async_trait]
impl SystemEventLogClearer for ScriptedProvider {
    async fn clear_system_event_log(&self, ctx: &Context) -> Result<()> {
        self.answer::<dyn SystemEventLogClearer, _>(ctx, ()).await
    }
}

#[async_trait]
impl SystemEventLogGetter for ScriptedProvider {
    async fn get_system_event_log(&self, ctx: &Context) -> Result<Vec<SelEntry>> {
        let entries = vec![SelEntry {
            id: "1".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            message: "Log area reset/cleared".to_string(),
            severity: None,
        }];
        self.answer::<dyn SystemEventLogGetter, _>(ctx, entries).await
    }
}

#[async_trait]
impl VirtualMediaSetter for ScriptedProvider {
    async fn set_virtual_media(&self, ctx: &Context, _kind: VirtualMediaKind, _media_url: &str) -> Result<bool> {
        self.play::<dyn VirtualMediaSetter>(ctx).await
    }
}

#[async_trait]
impl VirtualMediaInserter for ScriptedProvider {
    async fn insert_virtual_media(&self, ctx: &Context, _kind: VirtualMediaKind, _media_url: &str) -> Result<()> {
        self.answer::<dyn VirtualMediaInserter, _>(ctx, ()).await
    }
}

#[async_trait]
impl VirtualMediaEjector for ScriptedProvider {
    async fn eject_virtual_media(&self, ctx: &Context, _kind: VirtualMediaKind) -> Result<()> {
        self.answer::<dyn VirtualMediaEjector, _>(ctx, ()).await
    }
}

#[async_trait]
impl FloppyImageMounter for ScriptedProvider {
    async fn mount_floppy_image(&self, ctx: &Context, image: Box<dyn AsyncRead + Send + Unpin>) -> Result<()> {
        self.answer::<dyn FloppyImageMounter, _>(ctx, ()).await?;
        self.upload(image).await
    }
}

#[async_trait]
impl FloppyImageUnmounter for ScriptedProvider {
    async fn unmount_floppy_image(&self, ctx: &Context) -> Result<()> {
        self.answer::<dyn FloppyImageUnmounter, _>(ctx, ()).await
    }
}

#[async_trait]
impl BmcResetter for ScriptedProvider {
    async fn bmc_reset(&self, ctx: &Context, _reset_type: BmcResetType) -> Result<bool> {
        self.play::<dyn BmcResetter>(ctx).await
    }
}

#[async_trait]
impl SolDeactivator for ScriptedProvider {
    async fn deactivate_sol(&self, ctx: &Context) -> Result<()> {
        self.answer::<dyn SolDeactivator, _>(ctx, ()).await
    }
}

#[async_trait]
impl PostCodeGetter for ScriptedProvider {
    async fn post_code(&self, ctx: &Context) -> Result<PostCode> {
        let code = PostCode {
            status: "running".to_string(),
            code: 0xA2,
        };
        self.answer::<dyn PostCodeGetter, _>(ctx, code).await
    }
}

#[async_trait]
impl Screenshotter for ScriptedProvider {
    async fn screenshot(&self, ctx: &Context) -> Result<Screenshot> {
        let shot = Screenshot {
            image: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
            file_type: "png".to_string(),
        };
        self.answer::<dyn Screenshotter, _>(ctx, shot).await
    }
}

#[async_trait]
impl PowerSensorGetter for ScriptedProvider {
    async fn power_sensors(&self, ctx: &Context) -> Result<Vec<PowerSensor>> {
        let sensors = vec![PowerSensor {
            id: "PS1".to_string(),
            name: "PSU1 Input".to_string(),
            input_watts: 212.0,
            output_watts: Some(198.5),
        }];
        self.answer::<dyn PowerSensorGetter, _>(ctx, sensors).await
    }
}

#[async_trait]
impl TemperatureSensorGetter for ScriptedProvider {
    async fn temperature_sensors(&self, ctx: &Context) -> Result<Vec<TemperatureSensor>> {
        let sensors = vec![TemperatureSensor {
            id: "T1".to_string(),
            name: "CPU1 Temp".to_string(),
            reading_celsius: 48.0,
            critical_celsius: Some(95.0),
        }];
        self.answer::<dyn TemperatureSensorGetter, _>(ctx, sensors).await
    }
}

#[async_trait]
impl FanSensorGetter for ScriptedProvider {
    async fn fan_sensors(&self, ctx: &Context) -> Result<Vec<FanSensor>> {
        let sensors = vec![FanSensor {
            id: "F1".to_string(),
            name: "FAN1".to_string(),
            rpm: Some(5400),
        }];
        self.answer::<dyn FanSensorGetter, _>(ctx, sensors).await
    }
}

#[async_trait]
impl ChassisHealthGetter for ScriptedProvider {
    async fn chassis_health(&self, ctx: &Context) -> Result<Vec<ChassisHealth>> {
        let health = vec![ChassisHealth {
            id: "1".to_string(),
            name: "Chassis".to_string(),
            health: "OK".to_string(),
        }];
        self.answer::<dyn ChassisHealthGetter, _>(ctx, health).await
    }
}
