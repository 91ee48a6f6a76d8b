//! `bmcmux sel`

use bmcmux_bmc::Context;
use clap::Subcommand;
use color_eyre::eyre::Result;

use super::Session;
use crate::config::BmcConfig;

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum SelCommand {
    /// Clear the system event log
    Clear,
    /// Print the system event log
    List,
}

pub async fn run(config: &BmcConfig, ctx: Context, command: SelCommand) -> Result<()> {
    let session = Session::open(config, ctx).await?;

    match command {
        SelCommand::Clear => {
            let execution = session.client().clear_system_event_log(session.ctx()).await;
            session.finish("sel clear", execution).await
        }
        SelCommand::List => {
            let execution = session.client().get_system_event_log(session.ctx()).await;
            session.finish("sel list", execution).await
        }
    }
}
