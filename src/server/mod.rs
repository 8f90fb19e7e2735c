//! # Server Components
//!
//! - [`tally`]: candidate registry and vote counts
//! - [`sessions`]: user table and active sessions
//! - [`state`]: the guarded state block shared by every task
//! - [`window`]: voting window timer
//! - [`dispatcher`]: per-connection request handling
//! - [`broadcaster`]: administrator notes over multicast
//! - [`server`]: listener loop tying it together

pub mod broadcaster;
pub mod config;
pub mod dispatcher;
pub mod server;
pub mod sessions;
pub mod state;
pub mod tally;
pub mod window;

pub use config::ServerConfig;
pub use server::PollServer;
