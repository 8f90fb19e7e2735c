//! # Note Listener
//!
//! Joins the broadcast group and yields every administrator note as it
//! arrives. Shares nothing with the control channel.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use log::{info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::common::config::BroadcastConfig;
use crate::common::error::Result;

/// Largest datagram payload read per note.
const MAX_NOTE_SIZE: usize = 64 * 1024;

pub struct NoteListener {
    socket: UdpSocket,
}

impl NoteListener {
    /// Bind the broadcast port on all interfaces and join the group.
    ///
    /// The port is bound with address reuse so several clients on one host
    /// can all subscribe.
    pub async fn join(config: &BroadcastConfig) -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port).into())?;

        let socket = UdpSocket::from_std(socket.into())?;
        socket.join_multicast_v4(config.group, Ipv4Addr::UNSPECIFIED)?;

        info!("📡 Listening for notes on {}:{}", config.group, config.port);
        Ok(Self { socket })
    }

    /// Listen on an already-bound socket without joining any group.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self { socket }
    }

    /// Wait for the next note. Invalid UTF-8 is replaced rather than rejected.
    pub async fn next_note(&self) -> Result<(String, SocketAddr)> {
        let mut buf = vec![0u8; MAX_NOTE_SIZE];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        Ok((String::from_utf8_lossy(&buf[..len]).into_owned(), from))
    }

    /// Print every note until the socket fails.
    pub async fn run(self) {
        loop {
            match self.next_note().await {
                Ok((note, _)) => {
                    println!("\n--- [ADMIN NOTE] ---");
                    println!("{}", note);
                    println!("--------------------");
                }
                Err(e) => {
                    warn!("⚠️  Note listener stopped: {}", e);
                    break;
                }
            }
        }
    }
}
