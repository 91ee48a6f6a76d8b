//! IPMI provider driving the `ipmitool` binary
//!
//! IPMI over LAN is the lowest common denominator among BMCs, so this
//! provider is a useful last resort behind richer protocol providers.
//! Commands are run through a [`CommandRunner`]; the default one spawns
//! `ipmitool` with tokio and kills it if the context ends first.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::connection::{Closer, Opener};
use crate::context::Context;
use crate::error::{BmcError, Result};
use crate::ops::bmc_reset::BmcResetter;
use crate::ops::boot_device::BootDeviceSetter;
use crate::ops::nmi::NmiSender;
use crate::ops::power::{PowerSetter, PowerStateGetter};
use crate::ops::sel::{SystemEventLogClearer, SystemEventLogGetter};
use crate::ops::sol::SolDeactivator;
use crate::provider::Provider;
use crate::types::{
    BmcResetType, BootDevice, IpmiConfig, PowerAction, PowerState, Protocol, SelEntry,
};

/// Runs an external command and returns its stdout
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, ctx: &Context, program: &str, args: &[String]) -> Result<String>;
}

/// Spawns the command as a child process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, ctx: &Context, program: &str, args: &[String]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            output = output => output.map_err(|e| {
                BmcError::CommandFailed(format!("failed to run {}: {}", program, e))
            })?,
            e = ctx.done() => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = match stderr.trim() {
                "" => output.status.to_string(),
                msg => msg.to_string(),
            };
            return Err(BmcError::CommandFailed(detail));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// IPMI provider using `ipmitool`
pub struct IpmitoolProvider {
    config: IpmiConfig,
    binary: String,
    runner: Arc<dyn CommandRunner>,
}

impl IpmitoolProvider {
    /// Create a provider that spawns `ipmitool` from `PATH`
    pub fn new(config: IpmiConfig) -> Self {
        Self {
            config,
            binary: "ipmitool".to_string(),
            runner: Arc::new(ProcessRunner),
        }
    }

    /// Use a different `ipmitool` binary
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Run commands through `runner`
    pub fn with_runner<R: CommandRunner + 'static>(mut self, runner: R) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    /// BMC host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    fn base_args(&self) -> Vec<String> {
        vec![
            "-I".to_string(),
            self.config.interface.clone(),
            "-H".to_string(),
            self.config.host.clone(),
            "-p".to_string(),
            self.config.port.to_string(),
            "-U".to_string(),
            self.config.username.clone(),
            "-P".to_string(),
            self.config.password.clone(),
        ]
    }

    async fn execute(&self, ctx: &Context, command: &[&str]) -> Result<String> {
        debug!(host = %self.config.host, command = %command.join(" "), "Running ipmitool");

        let mut args = self.base_args();
        args.extend(command.iter().map(|s| s.to_string()));
        self.runner.run(ctx, &self.binary, &args).await
    }
}

impl std::fmt::Debug for IpmitoolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpmitoolProvider")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("binary", &self.binary)
            .finish_non_exhaustive()
    }
}

fn bootdev_arg(device: BootDevice) -> Result<&'static str> {
    match device {
        BootDevice::None => Ok("none"),
        BootDevice::Pxe => Ok("pxe"),
        BootDevice::Disk => Ok("disk"),
        BootDevice::Diag => Ok("diag"),
        BootDevice::Cdrom => Ok("cdrom"),
        BootDevice::Bios => Ok("bios"),
        BootDevice::Floppy => Ok("floppy"),
        other => Err(BmcError::Unsupported(format!(
            "ipmitool cannot boot from {}",
            other
        ))),
    }
}

/// Parse `sel elist` output: `id | date | time | sensor | event | direction`
fn parse_sel(output: &str) -> Vec<SelEntry> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('|').map(str::trim).collect();
            if fields.len() < 5 {
                return None;
            }
            Some(SelEntry {
                id: fields[0].to_string(),
                timestamp: format!("{} {}", fields[1], fields[2]),
                message: fields[4].to_string(),
                severity: fields.get(5).map(|s| s.to_string()),
            })
        })
        .collect()
}

impl Provider for IpmitoolProvider {
    fn name(&self) -> Option<&str> {
        Some("ipmitool")
    }

    fn protocol(&self) -> Option<Protocol> {
        Some(Protocol::Ipmi)
    }

    fn as_opener(&self) -> Option<&dyn Opener> {
        Some(self)
    }

    fn as_closer(&self) -> Option<&dyn Closer> {
        Some(self)
    }

    fn as_power_setter(&self) -> Option<&dyn PowerSetter> {
        Some(self)
    }

    fn as_power_state_getter(&self) -> Option<&dyn PowerStateGetter> {
        Some(self)
    }

    fn as_boot_device_setter(&self) -> Option<&dyn BootDeviceSetter> {
        Some(self)
    }

    fn as_bmc_resetter(&self) -> Option<&dyn BmcResetter> {
        Some(self)
    }

    fn as_nmi_sender(&self) -> Option<&dyn NmiSender> {
        Some(self)
    }

    fn as_system_event_log_clearer(&self) -> Option<&dyn SystemEventLogClearer> {
        Some(self)
    }

    fn as_system_event_log_getter(&self) -> Option<&dyn SystemEventLogGetter> {
        Some(self)
    }

    fn as_sol_deactivator(&self) -> Option<&dyn SolDeactivator> {
        Some(self)
    }
}

#[async_trait]
impl Opener for IpmitoolProvider {
    // ipmitool is sessionless; a successful `mc info` proves the BMC answers
    async fn open(&self, ctx: &Context) -> Result<()> {
        self.execute(ctx, &["mc", "info"]).await?;
        Ok(())
    }
}

#[async_trait]
impl Closer for IpmitoolProvider {
    async fn close(&self, _ctx: &Context) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl PowerSetter for IpmitoolProvider {
    async fn power_set(&self, ctx: &Context, action: PowerAction) -> Result<bool> {
        let arg = action.to_string();
        let output = self.execute(ctx, &["chassis", "power", &arg]).await?;
        Ok(output.contains("Chassis Power Control"))
    }
}

#[async_trait]
impl PowerStateGetter for IpmitoolProvider {
    async fn power_state_get(&self, ctx: &Context) -> Result<PowerState> {
        let output = self.execute(ctx, &["chassis", "power", "status"]).await?;

        if output.contains("is on") {
            Ok(PowerState::On)
        } else if output.contains("is off") {
            Ok(PowerState::Off)
        } else {
            Ok(PowerState::Unknown)
        }
    }
}

#[async_trait]
impl BootDeviceSetter for IpmitoolProvider {
    async fn boot_device_set(
        &self,
        ctx: &Context,
        device: BootDevice,
        persistent: bool,
        efi_boot: bool,
    ) -> Result<bool> {
        let device = bootdev_arg(device)?;

        let mut flags = Vec::new();
        if persistent {
            flags.push("persistent");
        }
        if efi_boot {
            flags.push("efiboot");
        }
        let options = format!("options={}", flags.join(","));

        let mut command = vec!["chassis", "bootdev", device];
        if !flags.is_empty() {
            command.push(&options);
        }

        let output = self.execute(ctx, &command).await?;
        Ok(output.contains("Set Boot Device to"))
    }
}

#[async_trait]
impl BmcResetter for IpmitoolProvider {
    async fn bmc_reset(&self, ctx: &Context, reset_type: BmcResetType) -> Result<bool> {
        let arg = reset_type.to_string();
        let output = self.execute(ctx, &["mc", "reset", &arg]).await?;
        Ok(output.contains(&format!("Sent {} reset command", arg)))
    }
}

#[async_trait]
impl NmiSender for IpmitoolProvider {
    async fn send_nmi(&self, ctx: &Context) -> Result<()> {
        self.execute(ctx, &["chassis", "power", "diag"]).await?;
        Ok(())
    }
}

#[async_trait]
impl SystemEventLogClearer for IpmitoolProvider {
    async fn clear_system_event_log(&self, ctx: &Context) -> Result<()> {
        self.execute(ctx, &["sel", "clear"]).await?;
        Ok(())
    }
}

#[async_trait]
impl SystemEventLogGetter for IpmitoolProvider {
    async fn get_system_event_log(&self, ctx: &Context) -> Result<Vec<SelEntry>> {
        let output = self.execute(ctx, &["sel", "elist"]).await?;
        Ok(parse_sel(&output))
    }
}

#[async_trait]
impl SolDeactivator for IpmitoolProvider {
    async fn deactivate_sol(&self, ctx: &Context) -> Result<()> {
        match self.execute(ctx, &["sol", "deactivate"]).await {
            Ok(_) => Ok(()),
            Err(BmcError::CommandFailed(msg)) if msg.contains("already de-activated") => Ok(()),
            Err(e) => Err(e),
        }
    }
}
