//! `bmcmux boot-device`

use bmcmux_bmc::{BootDevice, Context};
use clap::Args;
use color_eyre::eyre::Result;

use super::Session;
use crate::config::BmcConfig;

#[derive(Args, Debug, Clone)]
pub struct BootDeviceArgs {
    /// Device to boot from next (pxe, disk, cdrom, bios, ...)
    pub device: BootDevice,

    /// Keep the override for every boot, not just the next one
    #[arg(long)]
    pub persistent: bool,

    /// Request a UEFI boot
    #[arg(long)]
    pub efi: bool,
}

pub async fn run(config: &BmcConfig, ctx: Context, args: BootDeviceArgs) -> Result<()> {
    let session = Session::open(config, ctx).await?;
    let execution = session
        .client()
        .set_boot_device(session.ctx(), args.device, args.persistent, args.efi)
        .await;
    session
        .finish(&format!("boot-device {}", args.device), execution)
        .await
}
