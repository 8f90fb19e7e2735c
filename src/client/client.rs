//! # Control Client
//!
//! Request/response side of the client. Exactly one request is outstanding at
//! a time: every call writes a request and waits for its response before
//! returning.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut client = ControlClient::connect("127.0.0.1:50007").await?;
//! let response = client.login("votante1", "123").await?;
//! if response.is_ok() {
//!     let listing = client.get_candidates().await?;
//! }
//! ```

use tokio::net::TcpStream;

use crate::common::connection::Connection;
use crate::common::error::{PollError, Result};
use crate::common::messages::{CandidateId, Request, Response};

pub struct ControlClient {
    conn: Connection<TcpStream>,
}

impl ControlClient {
    pub async fn connect(address: &str) -> Result<Self> {
        let stream = TcpStream::connect(address).await?;
        Ok(Self {
            conn: Connection::new(stream),
        })
    }

    /// Send one request and wait for its response.
    pub async fn request(&mut self, request: &Request) -> Result<Response> {
        self.conn.write_message(request).await?;
        self.read_response().await
    }

    /// Send an arbitrary frame, bypassing request encoding.
    pub async fn request_raw(&mut self, frame: &[u8]) -> Result<Response> {
        self.conn.write_frame(frame).await?;
        self.read_response().await
    }

    async fn read_response(&mut self) -> Result<Response> {
        match self.conn.read_message::<Response>().await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(PollError::PeerDisconnected),
            Err(PollError::MalformedRequest) => Err(PollError::TransportFailure(
                "server sent an undecodable response".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    pub async fn login(&mut self, username: &str, secret: &str) -> Result<Response> {
        self.request(&Request::Login {
            username: username.to_string(),
            secret: secret.to_string(),
        })
        .await
    }

    pub async fn get_candidates(&mut self) -> Result<Response> {
        self.request(&Request::GetCandidates).await
    }

    pub async fn vote(&mut self, candidate_id: CandidateId) -> Result<Response> {
        self.request(&Request::Vote { candidate_id }).await
    }

    pub async fn add_candidate(&mut self, name: &str) -> Result<Response> {
        self.request(&Request::AddCandidate {
            name: name.to_string(),
        })
        .await
    }

    pub async fn send_note(&mut self, text: &str) -> Result<Response> {
        self.request(&Request::SendNote {
            text: text.to_string(),
        })
        .await
    }

    pub async fn logout(&mut self) -> Result<Response> {
        self.request(&Request::Logout).await
    }
}
