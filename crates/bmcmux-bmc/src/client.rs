//! Client for one BMC
//!
//! [`Client`] ties a host, its provider registry and an executor together
//! and exposes every operation as a method. After [`Client::open`] the
//! registry is replaced by the providers whose connection opened, so later
//! calls only see live providers.
//!
//! ```ignore
//! let mut client = Client::new("10.0.0.5", registry);
//! client.open(&ctx).await.result?;
//! let state = client.get_power_state(&ctx).await;
//! client.close(&ctx).await;
//! ```

use std::time::Duration;

use crate::connection::{close_all, open_all};
use crate::context::Context;
use crate::executor::{Execution, Executor};
use crate::ops::{
    bios, bmc_reset, boot_device, diagnostics, firmware, inventory, nmi, power, sel, sensors, sol,
    user, virtual_media,
};
use crate::registry::Registry;
use crate::types::{
    BiosConfiguration, BmcResetType, BootDevice, BootDeviceOverride, ChassisHealth, Device,
    FanSensor, FirmwareApplyTime, FirmwareInstallState, Payload, PostCode, PowerAction,
    PowerSensor, PowerState, Screenshot, SelEntry, TemperatureSensor, UserRecord,
    VirtualMediaKind,
};

/// Multi-provider client for one BMC
#[derive(Debug, Clone)]
pub struct Client {
    host: String,
    registry: Registry,
    executor: Executor,
}

impl Client {
    /// Create a client with an executor logging under the host's span
    pub fn new(host: impl Into<String>, registry: Registry) -> Self {
        let host = host.into();
        let executor = Executor::for_host(&host);
        Self {
            host,
            registry,
            executor,
        }
    }

    /// Use a specific executor
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current working set
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Try the provider called `name` first
    pub fn prefer_provider(&mut self, name: &str) {
        self.registry = self.registry.prefer_provider(name);
    }

    /// Open every provider and keep the ones that opened
    pub async fn open(&mut self, ctx: &Context) -> Execution<()> {
        let execution = open_all(&self.executor, ctx, self.registry.providers()).await;
        let result = execution.result.map(|live| {
            self.registry = Registry::from(live);
        });
        Execution {
            result,
            metadata: execution.metadata,
        }
    }

    /// Close every provider in the working set
    pub async fn close(&self, ctx: &Context) -> Execution<()> {
        close_all(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn set_power_state(&self, ctx: &Context, action: PowerAction) -> Execution<bool> {
        power::set_power_state(&self.executor, ctx, self.registry.providers(), action).await
    }

    pub async fn get_power_state(&self, ctx: &Context) -> Execution<PowerState> {
        power::get_power_state(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn set_boot_device(
        &self,
        ctx: &Context,
        device: BootDevice,
        persistent: bool,
        efi_boot: bool,
    ) -> Execution<bool> {
        boot_device::set_boot_device(
            &self.executor,
            ctx,
            self.registry.providers(),
            device,
            persistent,
            efi_boot,
        )
        .await
    }

    pub async fn get_boot_device_override(&self, ctx: &Context) -> Execution<BootDeviceOverride> {
        boot_device::get_boot_device_override(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn get_bios_configuration(&self, ctx: &Context) -> Execution<BiosConfiguration> {
        bios::get_bios_configuration(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn set_bios_configuration(
        &self,
        ctx: &Context,
        config: &BiosConfiguration,
    ) -> Execution<()> {
        bios::set_bios_configuration(&self.executor, ctx, self.registry.providers(), config).await
    }

    pub async fn reset_bios_configuration(&self, ctx: &Context) -> Execution<()> {
        bios::reset_bios_configuration(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn install_firmware(
        &self,
        ctx: &Context,
        component: &str,
        apply_time: FirmwareApplyTime,
        force_install: bool,
        payload: &Payload,
    ) -> Execution<String> {
        firmware::install_firmware(
            &self.executor,
            ctx,
            self.registry.providers(),
            component,
            apply_time,
            force_install,
            payload,
        )
        .await
    }

    pub async fn firmware_install_status(
        &self,
        ctx: &Context,
        install_version: &str,
        component: &str,
        task_id: &str,
    ) -> Execution<FirmwareInstallState> {
        firmware::firmware_install_status(
            &self.executor,
            ctx,
            self.registry.providers(),
            install_version,
            component,
            task_id,
        )
        .await
    }

    pub async fn wait_for_firmware_install(
        &self,
        ctx: &Context,
        install_version: &str,
        component: &str,
        task_id: &str,
        poll_interval: Duration,
    ) -> Execution<FirmwareInstallState> {
        firmware::wait_for_firmware_install(
            &self.executor,
            ctx,
            self.registry.providers(),
            install_version,
            component,
            task_id,
            poll_interval,
        )
        .await
    }

    pub async fn inventory(&self, ctx: &Context) -> Execution<Device> {
        inventory::get_inventory(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn create_user(&self, ctx: &Context, user: &str, pass: &str, role: &str) -> Execution<bool> {
        user::create_user(&self.executor, ctx, self.registry.providers(), user, pass, role).await
    }

    pub async fn update_user(&self, ctx: &Context, user: &str, pass: &str, role: &str) -> Execution<bool> {
        user::update_user(&self.executor, ctx, self.registry.providers(), user, pass, role).await
    }

    pub async fn delete_user(&self, ctx: &Context, user: &str) -> Execution<bool> {
        user::delete_user(&self.executor, ctx, self.registry.providers(), user).await
    }

    pub async fn read_users(&self, ctx: &Context) -> Execution<Vec<UserRecord>> {
        user::read_users(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn send_nmi(&self, ctx: &Context) -> Execution<()> {
        nmi::send_nmi(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn clear_system_event_log(&self, ctx: &Context) -> Execution<()> {
        sel::clear_system_event_log(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn get_system_event_log(&self, ctx: &Context) -> Execution<Vec<SelEntry>> {
        sel::get_system_event_log(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn set_virtual_media(
        &self,
        ctx: &Context,
        kind: VirtualMediaKind,
        media_url: &str,
    ) -> Execution<bool> {
        virtual_media::set_virtual_media(&self.executor, ctx, self.registry.providers(), kind, media_url)
            .await
    }

    pub async fn insert_virtual_media(
        &self,
        ctx: &Context,
        kind: VirtualMediaKind,
        media_url: &str,
    ) -> Execution<()> {
        virtual_media::insert_virtual_media(
            &self.executor,
            ctx,
            self.registry.providers(),
            kind,
            media_url,
        )
        .await
    }

    pub async fn eject_virtual_media(&self, ctx: &Context, kind: VirtualMediaKind) -> Execution<()> {
        virtual_media::eject_virtual_media(&self.executor, ctx, self.registry.providers(), kind).await
    }

    pub async fn mount_floppy_image(&self, ctx: &Context, image: &Payload) -> Execution<()> {
        virtual_media::mount_floppy_image(&self.executor, ctx, self.registry.providers(), image).await
    }

    pub async fn unmount_floppy_image(&self, ctx: &Context) -> Execution<()> {
        virtual_media::unmount_floppy_image(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn reset_bmc(&self, ctx: &Context, reset_type: BmcResetType) -> Execution<bool> {
        bmc_reset::reset_bmc(&self.executor, ctx, self.registry.providers(), reset_type).await
    }

    pub async fn deactivate_sol(&self, ctx: &Context) -> Execution<()> {
        sol::deactivate_sol(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn post_code(&self, ctx: &Context) -> Execution<PostCode> {
        diagnostics::get_post_code(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn screenshot(&self, ctx: &Context) -> Execution<Screenshot> {
        diagnostics::take_screenshot(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn power_sensors(&self, ctx: &Context) -> Execution<Vec<PowerSensor>> {
        sensors::get_power_sensors(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn temperature_sensors(&self, ctx: &Context) -> Execution<Vec<TemperatureSensor>> {
        sensors::get_temperature_sensors(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn fan_sensors(&self, ctx: &Context) -> Execution<Vec<FanSensor>> {
        sensors::get_fan_sensors(&self.executor, ctx, self.registry.providers()).await
    }

    pub async fn chassis_health(&self, ctx: &Context) -> Execution<Vec<ChassisHealth>> {
        sensors::get_chassis_health(&self.executor, ctx, self.registry.providers()).await
    }
}
