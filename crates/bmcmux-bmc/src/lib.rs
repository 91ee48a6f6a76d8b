//! bmcmux BMC execution framework
//!
//! This crate runs BMC (Baseboard Management Controller) operations across
//! several protocol-specific providers for the same machine. A caller
//! registers the providers it has (IPMI, Redfish, vendor APIs, Wake-on-LAN,
//! ...) in precedence order; each operation is dispatched to the providers
//! implementing it and attempted in order until one succeeds.
//!
//! # Building blocks
//!
//! - **Capabilities**: one small trait per operation (`PowerSetter`,
//!   `FirmwareInstaller`, ...), defined in [`ops`] and [`connection`]
//! - **Providers**: implement any subset of the capabilities and advertise
//!   them through [`Provider`]
//! - **Dispatch**: [`dispatch()`] filters providers down to one capability
//! - **Executor**: [`Executor`] attempts candidates in order under
//!   cancellation and per-attempt timeouts, and reports [`Metadata`]
//! - **Connections**: [`open_all`] / [`close_all`] keep every provider that
//!   connected rather than stopping at the first
//!
//! # Example
//!
//! ```no_run
//! use bmcmux_bmc::providers::{IpmitoolProvider, WolProvider};
//! use bmcmux_bmc::{Client, Context, IpmiConfig, PowerAction, Registry};
//!
//! # async fn example() -> Result<(), bmcmux_bmc::MultiError> {
//! let mut registry = Registry::new();
//! registry.register(IpmitoolProvider::new(IpmiConfig::new("10.0.0.5", "admin", "password")));
//! registry.register(WolProvider::from_mac("aa:bb:cc:dd:ee:ff")?);
//!
//! let mut client = Client::new("10.0.0.5", registry);
//! let ctx = Context::background();
//!
//! // Keep only the providers that answer
//! client.open(&ctx).await.result?;
//!
//! let execution = client.set_power_state(&ctx, PowerAction::On).await;
//! println!("powered on by {:?}", execution.metadata.successful_provider);
//! execution.result?;
//!
//! client.close(&ctx).await;
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod client;
pub mod config;
pub mod connection;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod ops;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod testing;
pub mod types;

pub use capability::Capability;
pub use client::Client;
pub use config::ExecutorConfig;
pub use connection::{close_all, open_all, Closer, Opener};
pub use context::{Context, ContextError};
pub use dispatch::{dispatch, Candidate};
pub use error::{BmcError, ErrorKind, MultiError, Result};
pub use executor::{AttemptTimeout, Execution, Executor, Operation, Outcome};
pub use metadata::Metadata;
pub use provider::{Provider, RegisteredProvider};
pub use registry::Registry;
pub use types::{
    BmcResetType, BootDevice, BootDeviceOverride, FirmwareApplyTime, FirmwareInstallState,
    IpmiConfig, Payload, PowerAction, PowerState, Protocol, VirtualMediaKind, WolConfig,
};
