pub mod client;
pub mod common;
pub mod server;

pub use common::error::{PollError, Result};
pub use common::messages::{Request, Response};
pub use server::PollServer;
