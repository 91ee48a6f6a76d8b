//! Wake-on-LAN provider
//!
//! Wake-on-LAN sends a "magic packet" to wake a machine from a powered-off
//! state. It needs no BMC at all, which makes it a useful fallback for
//! powering on when the BMC itself is unreachable. Only power on is
//! supported.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::connection::{Closer, Opener};
use crate::context::Context;
use crate::error::{BmcError, Result};
use crate::ops::power::PowerSetter;
use crate::provider::Provider;
use crate::types::{PowerAction, Protocol, WolConfig};

/// Wake-on-LAN provider
#[derive(Debug)]
pub struct WolProvider {
    config: WolConfig,
}

impl WolProvider {
    pub fn new(config: WolConfig) -> Self {
        Self { config }
    }

    /// Create from a MAC address string ("aa:bb:cc:dd:ee:ff")
    pub fn from_mac(mac: &str) -> Result<Self> {
        let config = WolConfig::from_mac_string(mac)
            .ok_or_else(|| BmcError::InvalidConfig(format!("invalid MAC address: {}", mac)))?;
        Ok(Self::new(config))
    }

    /// Get the target MAC address
    pub fn mac_address(&self) -> &[u8; 6] {
        &self.config.mac_address
    }

    /// 6 bytes of 0xFF followed by the MAC repeated 16 times
    fn build_magic_packet(&self) -> [u8; 102] {
        let mut packet = [0xFFu8; 102];
        for chunk in packet[6..].chunks_exact_mut(6) {
            chunk.copy_from_slice(&self.config.mac_address);
        }
        packet
    }

    async fn broadcast_socket(&self) -> Result<UdpSocket> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| BmcError::NetworkError(e.to_string()))?;
        socket
            .set_broadcast(true)
            .map_err(|e| BmcError::NetworkError(e.to_string()))?;
        Ok(socket)
    }
}

impl Provider for WolProvider {
    fn name(&self) -> Option<&str> {
        Some("wol")
    }

    fn protocol(&self) -> Option<Protocol> {
        Some(Protocol::Wol)
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
}

#[async_trait]
impl Opener for WolProvider {
    // Nothing to connect to; opening checks a broadcast socket can be bound.
    async fn open(&self, _ctx: &Context) -> Result<()> {
        self.broadcast_socket().await.map(|_| ())
    }
}

#[async_trait]
impl Closer for WolProvider {
    async fn close(&self, _ctx: &Context) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl PowerSetter for WolProvider {
    async fn power_set(&self, _ctx: &Context, action: PowerAction) -> Result<bool> {
        if action != PowerAction::On {
            return Err(BmcError::Unsupported(format!(
                "Wake-on-LAN does not support power {}",
                action
            )));
        }

        let socket = self.broadcast_socket().await?;
        let target = SocketAddr::new(self.config.broadcast_address, self.config.port);
        debug!(mac = %self.config.mac_string(), target = %target, "Sending magic packet");

        let sent = socket
            .send_to(&self.build_magic_packet(), target)
            .await
            .map_err(|e| BmcError::NetworkError(e.to_string()))?;

        Ok(sent == 102)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_wol_from_mac() {
        let provider = WolProvider::from_mac("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(provider.mac_address(), &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }

    #[test]
    fn test_wol_from_invalid_mac() {
        assert!(WolProvider::from_mac("invalid").is_err());
    }

    #[test]
    fn test_magic_packet_format() {
        let provider = WolProvider::from_mac("11:22:33:44:55:66").unwrap();
        let packet = provider.build_magic_packet();

        assert_eq!(&packet[0..6], &[0xFF; 6]);

        let mac = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
        for i in 0..16 {
            let offset = 6 + (i * 6);
            assert_eq!(&packet[offset..offset + 6], &mac);
        }
    }

    #[test]
    fn test_only_power_setter_advertised() {
        let provider = WolProvider::from_mac("aa:bb:cc:dd:ee:ff").unwrap();
        assert!(provider.as_power_setter().is_some());
        assert!(provider.as_power_state_getter().is_none());
        assert!(provider.as_boot_device_setter().is_none());
    }

    #[tokio::test]
    async fn test_unsupported_actions() {
        let provider = WolProvider::from_mac("aa:bb:cc:dd:ee:ff").unwrap();
        let ctx = Context::background();

        for action in [PowerAction::Off, PowerAction::Soft, PowerAction::Cycle] {
            let err = provider.power_set(&ctx, action).await.unwrap_err();
            assert!(matches!(err, BmcError::Unsupported(_)));
        }
    }

    #[tokio::test]
    async fn test_power_on_sends_magic_packet() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let config = WolConfig::from_mac_string("11:22:33:44:55:66")
            .unwrap()
            .with_broadcast(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_port(port);
        let provider = WolProvider::new(config);

        assert!(provider
            .power_set(&Context::background(), PowerAction::On)
            .await
            .unwrap());

        let mut buf = [0u8; 128];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, 102);
        assert_eq!(&buf[0..6], &[0xFF; 6]);
    }
}
