//! Reference providers

pub mod ipmitool;
pub mod wol;

pub use ipmitool::{CommandRunner, IpmitoolProvider, ProcessRunner};
pub use wol::WolProvider;
