//! # Poll Server
//!
//! Owns the listening socket, the shared poll state, and the note broadcaster.
//! The voting window opens, and its timer starts, as soon as the server is
//! bound. [`PollServer::run`] then accepts control connections forever, one
//! dispatcher task per connection.
//!
//! ## Startup
//!
//! ```text
//! bind control listener + broadcast socket   (failure here is fatal)
//! seed candidates from config
//! spawn WindowController                      (closes voting after duration)
//! run: loop accept -> spawn Dispatcher::serve
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::common::connection::Connection;
use crate::common::error::Result;
use crate::server::broadcaster::NotificationBroadcaster;
use crate::server::config::ServerConfig;
use crate::server::dispatcher::Dispatcher;
use crate::server::sessions::ConnectionId;
use crate::server::state::{PollState, SharedState, VotingWindow};
use crate::server::tally::Outcome;
use crate::server::window::WindowController;

pub struct PollServer {
    config: ServerConfig,
    listener: TcpListener,
    state: SharedState,
    broadcaster: Arc<NotificationBroadcaster>,
    window_timer: Option<JoinHandle<Option<Outcome>>>,
}

impl PollServer {
    /// Bind both sockets, build the shared state, and start the window timer.
    ///
    /// # Example
    /// ```ignore
    /// let server = PollServer::bind(ServerConfig::default()).await?;
    /// server.run().await;
    /// ```
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.server.control_address).await?;
        let broadcaster = NotificationBroadcaster::bind(&config.broadcast).await?;

        let mut state = PollState::new(
            config.accounts(),
            VotingWindow::open(config.voting_duration()),
        );
        for name in &config.voting.candidates {
            state.add_candidate(name)?;
        }

        let state = state.into_shared();
        let window_timer = WindowController::new(state.clone()).spawn();

        Ok(Self {
            config,
            listener,
            state,
            broadcaster: Arc::new(broadcaster),
            window_timer: Some(window_timer),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared state, for inspection.
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Take the handle of the window timer, which resolves to the outcome
    /// once voting closes. `None` after the first call.
    pub fn take_window_timer(&mut self) -> Option<JoinHandle<Option<Outcome>>> {
        self.window_timer.take()
    }

    /// Accept connections forever.
    pub async fn run(self) {
        info!(
            "🚀 Poll server listening on {} (notes to {})",
            self.local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| self.config.server.control_address.clone()),
            self.broadcaster.target()
        );

        let idle_timeout = self.config.idle_timeout();
        let mut next_connection: ConnectionId = 0;

        loop {
            match self.listener.accept().await {
                Ok((socket, addr)) => {
                    next_connection += 1;
                    debug!("🔗 Connection {} accepted from {}", next_connection, addr);

                    let dispatcher = Dispatcher::new(
                        next_connection,
                        self.state.clone(),
                        self.broadcaster.clone(),
                    )
                    .with_idle_timeout(idle_timeout);

                    tokio::spawn(async move {
                        dispatcher.serve(Connection::new(socket)).await;
                        debug!("🔌 Connection from {} finished", addr);
                    });
                }
                Err(e) => error!("❌ Accept error: {}", e),
            }
        }
    }
}
