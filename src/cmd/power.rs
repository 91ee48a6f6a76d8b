//! `bmcmux power`

use bmcmux_bmc::{Context, PowerAction};
use clap::Subcommand;
use color_eyre::eyre::Result;

use super::Session;
use crate::config::BmcConfig;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    /// Show the current power state
    Status,
    /// Power on
    On,
    /// Hard power off
    Off,
    /// ACPI soft shutdown
    Soft,
    /// Hard reset
    Reset,
    /// Power off, then on
    Cycle,
}

impl PowerCommand {
    /// The action to request, `None` for a status query
    pub fn action(self) -> Option<PowerAction> {
        match self {
            PowerCommand::Status => None,
            PowerCommand::On => Some(PowerAction::On),
            PowerCommand::Off => Some(PowerAction::Off),
            PowerCommand::Soft => Some(PowerAction::Soft),
            PowerCommand::Reset => Some(PowerAction::Reset),
            PowerCommand::Cycle => Some(PowerAction::Cycle),
        }
    }
}

pub async fn run(config: &BmcConfig, ctx: Context, command: PowerCommand) -> Result<()> {
    let session = Session::open(config, ctx).await?;

    match command.action() {
        None => {
            let execution = session.client().get_power_state(session.ctx()).await;
            session.finish("power status", execution).await
        }
        Some(action) => {
            let execution = session.client().set_power_state(session.ctx(), action).await;
            session
                .finish(&format!("power {}", action), execution)
                .await
        }
    }
}
