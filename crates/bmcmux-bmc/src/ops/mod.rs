//! Operations
//!
//! One module per operation family. Each declares the capability traits a
//! provider implements and the functions that dispatch and run the
//! operation across a set of providers.

pub mod bios;
pub mod bmc_reset;
pub mod boot_device;
pub mod diagnostics;
pub mod firmware;
pub mod inventory;
pub mod nmi;
pub mod power;
pub mod sel;
pub mod sensors;
pub mod sol;
pub mod user;
pub mod virtual_media;
