//! Controller maintenance: `bmc-reset`, `nmi` and `sol`

use bmcmux_bmc::{BmcResetType, Context};
use clap::Subcommand;
use color_eyre::eyre::Result;

use super::Session;
use crate::config::BmcConfig;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum SolCommand {
    /// Close any active serial-over-LAN session
    Deactivate,
}

pub async fn reset(config: &BmcConfig, ctx: Context, reset_type: BmcResetType) -> Result<()> {
    let session = Session::open(config, ctx).await?;
    let execution = session.client().reset_bmc(session.ctx(), reset_type).await;
    session
        .finish(&format!("bmc-reset {}", reset_type), execution)
        .await
}

pub async fn nmi(config: &BmcConfig, ctx: Context) -> Result<()> {
    let session = Session::open(config, ctx).await?;
    let execution = session.client().send_nmi(session.ctx()).await;
    session.finish("nmi", execution).await
}

pub async fn sol(config: &BmcConfig, ctx: Context, command: SolCommand) -> Result<()> {
    let session = Session::open(config, ctx).await?;
    match command {
        SolCommand::Deactivate => {
            let execution = session.client().deactivate_sol(session.ctx()).await;
            session.finish("sol deactivate", execution).await
        }
    }
}
