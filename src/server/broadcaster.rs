//! # Notification Broadcaster
//!
//! Sends administrator notes as single UDP datagrams to the configured
//! multicast group. Fire-and-forget: no acknowledgement, no retry, no ordering.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use log::{error, info};
use tokio::net::UdpSocket;

use crate::common::config::BroadcastConfig;
use crate::common::error::Result;

pub struct NotificationBroadcaster {
    socket: UdpSocket,
    target: SocketAddr,
}

impl NotificationBroadcaster {
    /// Bind an ephemeral sending socket aimed at the configured group.
    pub async fn bind(config: &BroadcastConfig) -> Result<Self> {
        Self::with_target(config.target(), config.ttl).await
    }

    /// Bind a sender for an explicit destination. Any IPv4 address works; a
    /// unicast target is handy for loopback testing.
    pub async fn with_target(target: SocketAddrV4, ttl: u32) -> Result<Self> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_multicast_ttl_v4(ttl)?;

        Ok(Self {
            socket,
            target: SocketAddr::V4(target),
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send `text` as one UTF-8 datagram, returning the bytes handed to the socket.
    pub async fn broadcast(&self, text: &str) -> Result<usize> {
        let sent = self.socket.send_to(text.as_bytes(), self.target).await?;
        Ok(sent)
    }

    /// Send a note and swallow any failure after logging it.
    pub async fn announce(&self, text: &str) {
        match self.broadcast(text).await {
            Ok(bytes) => info!("📢 Note sent to {} ({} bytes)", self.target, bytes),
            Err(e) => error!("❌ Failed to send note to {}: {}", self.target, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_note_arrives_as_raw_text() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = match receiver.local_addr().unwrap() {
            SocketAddr::V4(addr) => addr,
            SocketAddr::V6(_) => unreachable!(),
        };

        let broadcaster = NotificationBroadcaster::with_target(target, 1).await.unwrap();
        broadcaster.announce("polls close at noon").await;

        let mut buf = [0u8; 128];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"polls close at noon");
    }
}
