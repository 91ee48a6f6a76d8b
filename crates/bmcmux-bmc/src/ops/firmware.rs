//! Firmware install and install-status polling
//!
//! Installing firmware is a long-running, multi-phase job on the BMC
//! (upload, verify, flash, possibly a power cycle). Providers collapse that
//! into two calls: [`FirmwareInstaller::firmware_install`] starts the job
//! and returns a task id, and [`FirmwareInstallVerifier::firmware_install_status`]
//! reports where the task stands. Both go through the executor like any
//! other operation.
//!
//! The image is passed as a [`Payload`], which opens a fresh reader for
//! every attempt.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tracing::debug;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::{BmcError, MultiError, Result};
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::{FirmwareApplyTime, FirmwareInstallState, Payload};

/// Starts a firmware install
#[async_trait]
pub trait FirmwareInstaller: Send + Sync {
    /// Upload `reader` for `component` and return the BMC task id
    async fn firmware_install(
        &self,
        ctx: &Context,
        component: &str,
        apply_time: FirmwareApplyTime,
        force_install: bool,
        reader: Box<dyn AsyncRead + Send + Unpin>,
    ) -> Result<String>;
}

/// Reports the state of a firmware install task
#[async_trait]
pub trait FirmwareInstallVerifier: Send + Sync {
    async fn firmware_install_status(
        &self,
        ctx: &Context,
        install_version: &str,
        component: &str,
        task_id: &str,
    ) -> Result<FirmwareInstallState>;
}

capability!(FirmwareInstaller, as_firmware_installer);
capability!(FirmwareInstallVerifier, as_firmware_install_verifier);

pub const FIRMWARE_INSTALL: Operation = Operation::new("firmware_install", "failed to install firmware");
pub const FIRMWARE_INSTALL_STATUS: Operation =
    Operation::new("firmware_install_status", "failed to get firmware install status");

/// Start a firmware install, returning the task id
pub async fn install_firmware(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    component: &str,
    apply_time: FirmwareApplyTime,
    force_install: bool,
    payload: &Payload,
) -> Execution<String> {
    executor
        .run(
            ctx,
            FIRMWARE_INSTALL,
            dispatch::<dyn FirmwareInstaller>(providers),
            |installer, ctx| async move {
                let reader = match payload.open().await {
                    Ok(reader) => reader,
                    Err(e) => return Outcome::HardError(e),
                };
                Outcome::from(
                    installer
                        .firmware_install(&ctx, component, apply_time, force_install, reader)
                        .await,
                )
            },
        )
        .await
}

/// Query the state of an install task
pub async fn firmware_install_status(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    install_version: &str,
    component: &str,
    task_id: &str,
) -> Execution<FirmwareInstallState> {
    executor
        .run(
            ctx,
            FIRMWARE_INSTALL_STATUS,
            dispatch::<dyn FirmwareInstallVerifier>(providers),
            |verifier, ctx| async move {
                Outcome::from(
                    verifier
                        .firmware_install_status(&ctx, install_version, component, task_id)
                        .await,
                )
            },
        )
        .await
}

/// Poll the install status until the task reaches a terminal state
///
/// Returns the last status execution: a terminal state, a failed status
/// query, or the context error if `ctx` ends while waiting.
pub async fn wait_for_firmware_install(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    install_version: &str,
    component: &str,
    task_id: &str,
    poll_interval: Duration,
) -> Execution<FirmwareInstallState> {
    loop {
        let execution =
            firmware_install_status(executor, ctx, providers, install_version, component, task_id)
                .await;

        match &execution.result {
            Ok(state) if !state.is_terminal() => {
                debug!(task_id, state = %state, "Firmware install in progress");
            }
            _ => return execution,
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            e = ctx.done() => {
                return Execution {
                    result: Err(MultiError::from(BmcError::Context(e))),
                    metadata: execution.metadata,
                };
            }
        }
    }
}
