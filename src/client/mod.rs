//! # Client Components
//!
//! - [`client`]: request/response control channel client
//! - [`notes`]: broadcast note listener
//! - [`menu`]: interactive terminal loop for voters and admins
//! - [`config`]: client configuration

pub mod client;
pub mod config;
pub mod menu;
pub mod notes;

pub use client::ControlClient;
pub use config::ClientConfig;
pub use menu::{Menu, Prompt};
pub use notes::NoteListener;
