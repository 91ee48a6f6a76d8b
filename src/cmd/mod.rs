//! CLI commands
//!
//! Every command that talks to the BMC opens a [`Session`], runs one
//! operation and hands the [`Execution`] back to [`Session::finish`], which
//! prints it as JSON and closes the connections.

pub mod bmc;
pub mod boot_device;
pub mod power;
pub mod providers;
pub mod sel;

use bmcmux_bmc::{Client, Context, Execution, Metadata};
use color_eyre::eyre::{bail, Result, WrapErr};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::BmcConfig;

/// What a command prints on stdout
#[derive(Debug, Serialize)]
pub struct Report<T> {
    pub host: String,
    pub operation: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: Metadata,
}

impl<T> Report<T> {
    pub fn new(host: &str, operation: &str, execution: Execution<T>) -> Self {
        let (ok, result, error) = match execution.result {
            Ok(value) => (true, Some(value), None),
            Err(e) => (false, None, Some(e.to_string())),
        };
        Self {
            host: host.to_string(),
            operation: operation.to_string(),
            ok,
            result,
            error,
            metadata: execution.metadata,
        }
    }
}

/// A client whose working set holds only the providers that opened
pub struct Session {
    client: Client,
    ctx: Context,
}

impl Session {
    /// Build the client from `config` and open every provider
    pub async fn open(config: &BmcConfig, ctx: Context) -> Result<Self> {
        let mut client = config.client()?;
        let opened = client.open(&ctx).await;
        opened
            .result
            .wrap_err_with(|| format!("Failed to open any provider for {}", config.host))?;

        info!(
            host = %client.host(),
            providers = ?client.registry().names(),
            "Connected"
        );
        Ok(Self { client, ctx })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// Close connections, print the report and fail if the operation did
    pub async fn finish<T: Serialize>(self, operation: &str, execution: Execution<T>) -> Result<()> {
        // Close under a fresh context so a cancelled command still disconnects
        let closed = self.client.close(&Context::background()).await;
        if let Err(e) = closed.result {
            warn!(error = %e, "Failed to close connections");
        }

        let report = Report::new(self.client.host(), operation, execution);
        println!("{}", serde_json::to_string_pretty(&report)?);

        if !report.ok {
            bail!(
                "{} failed: {}",
                operation,
                report.error.unwrap_or_default()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmcmux_bmc::{BmcError, MultiError};

    #[test]
    fn test_report_success() {
        let mut metadata = Metadata::new();
        metadata.record_attempt("ipmitool");
        metadata.record_success("ipmitool");
        let execution = Execution {
            result: Ok(true),
            metadata,
        };

        let report = Report::new("bmc1", "power on", execution);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["ok"], true);
        assert_eq!(json["result"], true);
        assert!(json.get("error").is_none());
        assert_eq!(json["metadata"]["successful_provider"], "ipmitool");
    }

    #[test]
    fn test_report_failure() {
        let errors = MultiError::new()
            .with(BmcError::for_provider(
                "ipmitool",
                BmcError::CommandFailed("unable to establish session".into()),
            ))
            .with(BmcError::Exhausted("failed to set power state".into()));
        let execution: Execution<bool> = Execution {
            result: Err(errors),
            metadata: Metadata::new(),
        };

        let report = Report::new("bmc1", "power on", execution);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["ok"], false);
        assert!(json.get("result").is_none());
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("unable to establish session"));
        assert!(error.ends_with("failed to set power state"));
    }
}
