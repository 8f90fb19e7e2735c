//! # Command Dispatcher
//!
//! Per-connection request loop. Each connection starts anonymous; a successful
//! `login` binds a session and its role decides which other actions are routed.
//!
//! ## Routing
//!
//! 1. `login` is always accepted.
//! 2. Anything else without a session is `NotAuthenticated`.
//! 3. Unknown actions, and actions outside the session's role, are `RoleNotPermitted`.
//! 4. Fields are validated only once the action is known to be permitted.
//!
//! The shared state guard is held only while touching in-memory state, never
//! across socket reads, writes, or note broadcasts.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::common::connection::Connection;
use crate::common::error::{PollError, Result};
use crate::common::messages::{Action, Envelope, Request, Response, Role};
use crate::server::broadcaster::NotificationBroadcaster;
use crate::server::sessions::ConnectionId;
use crate::server::state::SharedState;

/// Authenticated identity bound to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

/// Routing table: which roles may run which action.
///
/// `login` never reaches this check. The match is exhaustive, so a new
/// [`Action`] cannot be added without deciding who may use it.
pub fn is_permitted(action: Action, role: Role) -> bool {
    match action {
        Action::Login | Action::Logout => true,
        Action::GetCandidates | Action::Vote => role == Role::Voter,
        Action::AddCandidate | Action::SendNote => role == Role::Admin,
    }
}

pub struct Dispatcher {
    connection_id: ConnectionId,
    state: SharedState,
    broadcaster: Arc<NotificationBroadcaster>,
    idle_timeout: Option<Duration>,
    session: Option<Session>,
}

impl Dispatcher {
    pub fn new(
        connection_id: ConnectionId,
        state: SharedState,
        broadcaster: Arc<NotificationBroadcaster>,
    ) -> Self {
        Self {
            connection_id,
            state,
            broadcaster,
            idle_timeout: None,
            session: None,
        }
    }

    /// Drop the connection when no request arrives within `limit`.
    pub fn with_idle_timeout(mut self, limit: Option<Duration>) -> Self {
        self.idle_timeout = limit;
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Answer requests until the peer leaves or the transport fails, then
    /// release whatever session this connection held.
    pub async fn serve<S>(mut self, mut conn: Connection<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let response = match self.next_frame(&mut conn).await {
                Ok(Some(frame)) => self.handle_frame(&frame).await,
                Ok(None) => {
                    debug!("🔌 Connection {} closed by peer", self.connection_id);
                    break;
                }
                Err(e) if e.ends_connection() => {
                    warn!("⚠️  Connection {} terminated: {}", self.connection_id, e);
                    break;
                }
                Err(e) => Response::error(&e),
            };

            if let Err(e) = conn.write_message(&response).await {
                warn!(
                    "⚠️  Connection {} failed to send response: {}",
                    self.connection_id, e
                );
                break;
            }
        }

        self.release_session().await;
    }

    async fn next_frame<S>(&self, conn: &mut Connection<S>) -> Result<Option<Vec<u8>>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, conn.read_frame())
                .await
                .map_err(|_| PollError::IdleTimeout(limit))?,
            None => conn.read_frame().await,
        }
    }

    /// Turn one raw request frame into exactly one response.
    pub async fn handle_frame(&mut self, frame: &[u8]) -> Response {
        match self.dispatch(frame).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Connection {} request rejected: {}", self.connection_id, e);
                Response::error(&e)
            }
        }
    }

    async fn dispatch(&mut self, frame: &[u8]) -> Result<Response> {
        let envelope = Envelope::from_bytes(frame)?;
        let action = Action::from_name(&envelope.action);

        if action != Some(Action::Login) {
            let session = self.session.as_ref().ok_or(PollError::NotAuthenticated)?;
            match action {
                Some(action) if is_permitted(action, session.role) => {}
                _ => return Err(PollError::RoleNotPermitted),
            }
        }

        let action = action.ok_or(PollError::RoleNotPermitted)?;
        let request = Request::from_envelope(action, &envelope)?;
        self.execute(request).await
    }

    async fn execute(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::Login { username, secret } => {
                let role = self
                    .state
                    .lock()
                    .await
                    .login(&username, &secret, self.connection_id)?;

                info!(
                    "🔑 Connection {} logged in as '{}' ({})",
                    self.connection_id, username, role
                );
                self.session = Some(Session { username, role });
                Ok(Response::ok(format!("logged in as {}", role)).with_role(role))
            }

            Request::GetCandidates => {
                let candidates = self.state.lock().await.list_candidates();
                Ok(Response::ok(format!("{} candidates", candidates.len()))
                    .with_candidates(candidates))
            }

            Request::Vote { candidate_id } => {
                let name = self.state.lock().await.vote(candidate_id)?;
                debug!(
                    "Connection {} voted for candidate {}",
                    self.connection_id, candidate_id
                );
                Ok(Response::ok(format!("vote for '{}' recorded", name)))
            }

            Request::AddCandidate { name } => {
                let id = self.state.lock().await.add_candidate(&name)?;
                info!("➕ Candidate '{}' added with id {}", name, id);
                Ok(Response::ok(format!("candidate '{}' added with id {}", name, id))
                    .with_candidate_id(id))
            }

            Request::SendNote { text } => {
                self.broadcaster.announce(&text).await;
                Ok(Response::ok("note sent to broadcast group"))
            }

            Request::Logout => {
                self.release_session().await;
                Ok(Response::ok("logged out"))
            }
        }
    }

    async fn release_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.state.lock().await.logout(&session.username);
            info!(
                "👋 Connection {} released session for '{}'",
                self.connection_id, session.username
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::messages::Status;
    use crate::server::sessions::User;
    use crate::server::state::{PollState, VotingWindow};
    use std::net::{Ipv4Addr, SocketAddrV4};

    async fn fixture() -> (SharedState, Arc<NotificationBroadcaster>) {
        let mut state = PollState::new(
            vec![
                User::new("votante1", "123", Role::Voter),
                User::new("admin", "admin123", Role::Admin),
            ],
            VotingWindow::open(Duration::from_secs(600)),
        );
        state.add_candidate("Candidato A").unwrap();
        state.add_candidate("Candidato B").unwrap();

        // Loopback port nobody listens on; sends still succeed for UDP.
        let target = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9);
        let broadcaster = NotificationBroadcaster::with_target(target, 1).await.unwrap();
        (state.into_shared(), Arc::new(broadcaster))
    }

    async fn send(dispatcher: &mut Dispatcher, json: &str) -> Response {
        dispatcher.handle_frame(json.as_bytes()).await
    }

    #[test]
    fn test_routing_table() {
        assert!(is_permitted(Action::Vote, Role::Voter));
        assert!(!is_permitted(Action::Vote, Role::Admin));
        assert!(is_permitted(Action::SendNote, Role::Admin));
        assert!(!is_permitted(Action::GetCandidates, Role::Admin));
        for action in Action::ALL {
            assert!(is_permitted(action, Role::Voter) || is_permitted(action, Role::Admin));
        }
    }

    #[tokio::test]
    async fn test_actions_before_login_are_rejected_without_mutation() {
        let (state, broadcaster) = fixture().await;
        let mut dispatcher = Dispatcher::new(1, state.clone(), broadcaster);

        for json in [
            r#"{"action": "get_candidates"}"#,
            r#"{"action": "vote", "candidate_id": 1}"#,
            r#"{"action": "add_candidate", "name": "X"}"#,
            r#"{"action": "dance"}"#,
        ] {
            let response = send(&mut dispatcher, json).await;
            assert_eq!(response.status, Status::Error);
            assert_eq!(response.message, "must log in first");
            assert_eq!(response.error_code(), Some("not_authenticated"));
        }

        let guard = state.lock().await;
        assert_eq!(guard.tally().total_votes(), 0);
        assert_eq!(guard.tally().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_request_keeps_session() {
        let (state, broadcaster) = fixture().await;
        let mut dispatcher = Dispatcher::new(1, state, broadcaster);

        send(&mut dispatcher, r#"{"action": "login", "username": "votante1", "secret": "123"}"#).await;
        let response = send(&mut dispatcher, "{{{").await;
        assert_eq!(response.message, "invalid request");
        assert!(dispatcher.session().is_some());
    }

    #[tokio::test]
    async fn test_voter_flow() {
        let (state, broadcaster) = fixture().await;
        let mut dispatcher = Dispatcher::new(1, state.clone(), broadcaster);

        let login = send(&mut dispatcher, r#"{"action": "login", "username": "votante1", "secret": "123"}"#).await;
        assert!(login.is_ok());
        assert_eq!(login.role, Some(Role::Voter));

        let listing = send(&mut dispatcher, r#"{"action": "get_candidates"}"#).await;
        assert_eq!(listing.candidates.unwrap().len(), 2);

        assert!(send(&mut dispatcher, r#"{"action": "vote", "candidate_id": 1}"#).await.is_ok());
        let missing = send(&mut dispatcher, r#"{"action": "vote", "candidate_id": 999}"#).await;
        assert_eq!(missing.error_code(), Some("candidate_not_found"));

        let wrong_type = send(&mut dispatcher, r#"{"action": "vote", "candidate_id": "one"}"#).await;
        assert_eq!(wrong_type.error_code(), Some("invalid_input"));

        let forbidden = send(&mut dispatcher, r#"{"action": "add_candidate", "name": "X"}"#).await;
        assert_eq!(forbidden.message, "unknown or not permitted for this role");

        assert_eq!(state.lock().await.tally().votes_for(1), Some(1));
    }

    #[tokio::test]
    async fn test_admin_flow() {
        let (state, broadcaster) = fixture().await;
        let mut dispatcher = Dispatcher::new(1, state.clone(), broadcaster);

        send(&mut dispatcher, r#"{"action": "login", "username": "admin", "secret": "admin123"}"#).await;

        let added = send(&mut dispatcher, r#"{"action": "add_candidate", "name": "Candidato C"}"#).await;
        assert!(added.is_ok());
        assert_eq!(added.candidate_id, Some(3));

        let blank = send(&mut dispatcher, r#"{"action": "add_candidate", "name": ""}"#).await;
        assert_eq!(blank.error_code(), Some("invalid_input"));

        let note = send(&mut dispatcher, r#"{"action": "send_note", "text": "hello"}"#).await;
        assert!(note.is_ok());

        let vote = send(&mut dispatcher, r#"{"action": "vote", "candidate_id": 1}"#).await;
        assert_eq!(vote.error_code(), Some("role_not_permitted"));
        assert_eq!(state.lock().await.tally().votes_for(3), Some(0));
    }

    #[tokio::test]
    async fn test_logout_returns_connection_to_anonymous() {
        let (state, broadcaster) = fixture().await;
        let mut dispatcher = Dispatcher::new(1, state.clone(), broadcaster);

        send(&mut dispatcher, r#"{"action": "login", "username": "votante1", "secret": "123"}"#).await;
        assert!(send(&mut dispatcher, r#"{"action": "logout"}"#).await.is_ok());

        assert!(!state.lock().await.sessions().is_active("votante1"));
        let after = send(&mut dispatcher, r#"{"action": "get_candidates"}"#).await;
        assert_eq!(after.error_code(), Some("not_authenticated"));
    }

    #[tokio::test]
    async fn test_serve_releases_session_when_peer_drops() {
        let (state, broadcaster) = fixture().await;
        let (client_side, server_side) = tokio::io::duplex(4096);

        let worker = tokio::spawn(
            Dispatcher::new(1, state.clone(), broadcaster).serve(Connection::new(server_side)),
        );

        let mut client = Connection::new(client_side);
        client
            .write_message(&Request::Login {
                username: "votante1".to_string(),
                secret: "123".to_string(),
            })
            .await
            .unwrap();
        let response: Response = client.read_message().await.unwrap().unwrap();
        assert!(response.is_ok());
        assert!(state.lock().await.sessions().is_active("votante1"));

        drop(client);
        worker.await.unwrap();
        assert!(!state.lock().await.sessions().is_active("votante1"));
    }

    #[tokio::test]
    async fn test_oversized_frame_ends_connection_and_releases_session() {
        use crate::common::connection::MAX_FRAME_SIZE;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (state, broadcaster) = fixture().await;
        let (mut client, server_side) = tokio::io::duplex(4096);

        let worker = tokio::spawn(
            Dispatcher::new(1, state.clone(), broadcaster).serve(Connection::new(server_side)),
        );

        let login = br#"{"action": "login", "username": "votante1", "secret": "123"}"#;
        client.write_all(&(login.len() as u32).to_be_bytes()).await.unwrap();
        client.write_all(login).await.unwrap();

        let length = client.read_u32().await.unwrap() as usize;
        let mut body = vec![0u8; length];
        client.read_exact(&mut body).await.unwrap();
        let response: Response = serde_json::from_slice(&body).unwrap();
        assert!(response.is_ok());
        assert!(state.lock().await.sessions().is_active("votante1"));

        // Peer stays connected; the bad length prefix alone must end the worker
        client
            .write_all(&(MAX_FRAME_SIZE as u32 + 1).to_be_bytes())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(2), worker)
            .await
            .unwrap()
            .unwrap();

        assert!(!state.lock().await.sessions().is_active("votante1"));
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_idle_timeout_ends_connection() {
        let (state, broadcaster) = fixture().await;
        let (_client_side, server_side) = tokio::io::duplex(4096);

        let dispatcher = Dispatcher::new(1, state, broadcaster)
            .with_idle_timeout(Some(Duration::from_millis(20)));

        tokio::time::timeout(
            Duration::from_secs(2),
            dispatcher.serve(Connection::new(server_side)),
        )
        .await
        .unwrap();
    }
}
