//! # Common Components
//!
//! Shared utilities and data structures used by both client and server components.
//!
//! ## Modules
//!
//! - [`messages`]: Control-channel request and response definitions
//! - [`connection`]: Stream abstraction with length-prefixed message framing
//! - [`config`]: Configuration parsing utilities and broadcast settings
//! - [`error`]: Error taxonomy shared by both sides

pub mod config;
pub mod connection;
pub mod error;
pub mod messages;
