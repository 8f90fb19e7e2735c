//! # Shared Poll State
//!
//! The one state container every connection worker and the window timer go
//! through. It is built once at startup and handed out as a [`SharedState`];
//! each operation below runs as a single critical section under that guard.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::common::error::{PollError, Result};
use crate::common::messages::{CandidateId, CandidateInfo, Role};
use crate::server::sessions::{ConnectionId, SessionRegistry, User};
use crate::server::tally::{Outcome, TallyStore};

pub type SharedState = Arc<Mutex<PollState>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Open,
    Closed,
}

/// Time-boxed period during which votes are accepted.
#[derive(Debug, Clone)]
pub struct VotingWindow {
    state: WindowState,
    duration: Duration,
}

impl VotingWindow {
    pub fn open(duration: Duration) -> Self {
        Self {
            state: WindowState::Open,
            duration,
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == WindowState::Open
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Flip to `Closed`. Returns `false` if the window was already closed.
    fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = WindowState::Closed;
        was_open
    }
}

#[derive(Debug)]
pub struct PollState {
    tally: TallyStore,
    sessions: SessionRegistry,
    window: VotingWindow,
}

impl PollState {
    pub fn new(users: Vec<User>, window: VotingWindow) -> Self {
        Self {
            tally: TallyStore::new(),
            sessions: SessionRegistry::new(users),
            window,
        }
    }

    /// Wrap the state in the guard shared by all workers.
    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn tally(&self) -> &TallyStore {
        &self.tally
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn window(&self) -> &VotingWindow {
        &self.window
    }

    pub fn login(&mut self, username: &str, secret: &str, connection: ConnectionId) -> Result<Role> {
        self.sessions.login(username, secret, connection)
    }

    pub fn logout(&mut self, username: &str) -> bool {
        self.sessions.logout(username)
    }

    pub fn add_candidate(&mut self, name: &str) -> Result<CandidateId> {
        self.tally.add_candidate(name)
    }

    pub fn list_candidates(&self) -> Vec<CandidateInfo> {
        self.tally.list_candidates()
    }

    /// Check-then-increment: rejected while the window is closed, otherwise
    /// delegated to the tally. Returns the candidate's name.
    pub fn vote(&mut self, id: CandidateId) -> Result<String> {
        if !self.window.is_open() {
            return Err(PollError::VotingClosed);
        }
        self.tally.record_vote(id).map(str::to_string)
    }

    /// Close the window and compute the outcome. `None` if it was already closed.
    pub fn close_window(&mut self) -> Option<Outcome> {
        if self.window.close() {
            Some(self.tally.compute_outcome())
        } else {
            None
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.tally.compute_outcome()
    }
}
