//! # Message Protocol
//!
//! Defines the request and response types exchanged on the control channel:
//! - Login and logout
//! - Candidate listing and vote casting (voters)
//! - Candidate management and broadcast notes (administrators)
//!
//! Messages are serialized to JSON and sent over TCP with a 4-byte length prefix.
//! Every request is an object whose `action` field names the operation:
//!
//! ```text
//! {"action": "login", "username": "votante1", "secret": "123"}
//! {"action": "vote", "candidate_id": 1}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{PollError, Result};

/// Identifier assigned to a candidate when it is registered.
pub type CandidateId = u32;

// ============================================================================
// SHARED TYPES
// ============================================================================

/// Role attached to a user account. Decides which actions a session may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Voter,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Voter => write!(f, "voter"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// One entry of the candidate listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInfo {
    pub id: CandidateId,
    pub name: String,
}

// ============================================================================
// REQUESTS
// ============================================================================

/// Every action the control channel understands, without its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Login,
    GetCandidates,
    Vote,
    AddCandidate,
    SendNote,
    Logout,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Login,
        Action::GetCandidates,
        Action::Vote,
        Action::AddCandidate,
        Action::SendNote,
        Action::Logout,
    ];

    /// Wire name of the action, as found in the `action` field.
    pub fn name(self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::GetCandidates => "get_candidates",
            Action::Vote => "vote",
            Action::AddCandidate => "add_candidate",
            Action::SendNote => "send_note",
            Action::Logout => "logout",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

/// A fully decoded control-channel request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Authenticate this connection. Always permitted.
    Login { username: String, secret: String },

    /// List registered candidates ordered by id (voters).
    GetCandidates,

    /// Cast one vote for a candidate (voters).
    Vote { candidate_id: CandidateId },

    /// Register a new candidate with a zeroed tally (admins).
    AddCandidate { name: String },

    /// Send a note to every broadcast listener (admins).
    SendNote { text: String },

    /// Release the session while keeping the connection open.
    Logout,
}

impl Request {
    /// Build the typed request for `action` from the envelope's loose fields.
    ///
    /// Missing or wrongly typed fields yield [`PollError::InvalidInput`]; a
    /// negative or out-of-range integer id is a well-formed id that matches no
    /// candidate.
    pub fn from_envelope(action: Action, envelope: &Envelope) -> Result<Self> {
        match action {
            Action::Login => Ok(Request::Login {
                username: envelope.string_field("username")?,
                secret: envelope.string_field("secret")?,
            }),
            Action::GetCandidates => Ok(Request::GetCandidates),
            Action::Vote => Ok(Request::Vote {
                candidate_id: envelope.candidate_id_field("candidate_id")?,
            }),
            Action::AddCandidate => Ok(Request::AddCandidate {
                name: envelope.non_empty_field("name")?,
            }),
            Action::SendNote => Ok(Request::SendNote {
                text: envelope.non_empty_field("text")?,
            }),
            Action::Logout => Ok(Request::Logout),
        }
    }
}

/// First decoding stage of a request: the action name plus whatever other
/// fields the peer sent, not yet checked against the action.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Envelope {
    /// Parse raw frame bytes. Anything that is not a JSON object with a string
    /// `action` is a [`PollError::MalformedRequest`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|_| PollError::MalformedRequest)
    }

    fn string_field(&self, key: &str) -> Result<String> {
        match self.fields.get(key) {
            Some(Value::String(value)) => Ok(value.clone()),
            Some(_) => Err(PollError::InvalidInput(format!("'{}' must be a string", key))),
            None => Err(PollError::InvalidInput(format!("'{}' is required", key))),
        }
    }

    fn non_empty_field(&self, key: &str) -> Result<String> {
        let value = self.string_field(key)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PollError::InvalidInput(format!("'{}' must not be empty", key)));
        }
        Ok(trimmed.to_string())
    }

    fn candidate_id_field(&self, key: &str) -> Result<CandidateId> {
        let value = self
            .fields
            .get(key)
            .ok_or_else(|| PollError::InvalidInput(format!("'{}' is required", key)))?;

        if let Some(id) = value.as_u64() {
            return CandidateId::try_from(id).map_err(|_| PollError::CandidateNotFound);
        }
        if value.is_i64() {
            return Err(PollError::CandidateNotFound);
        }
        Err(PollError::InvalidInput(format!("'{}' must be an integer", key)))
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
}

/// Reply to exactly one request.
///
/// Payload fields are only present for the actions that produce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<CandidateInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<CandidateId>,
}

impl Response {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.into(),
            code: None,
            role: None,
            candidates: None,
            candidate_id: None,
        }
    }

    pub fn error(err: &PollError) -> Self {
        Self {
            status: Status::Error,
            message: err.to_string(),
            code: Some(err.code().to_string()),
            role: None,
            candidates: None,
            candidate_id: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<CandidateInfo>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    pub fn with_candidate_id(mut self, id: CandidateId) -> Self {
        self.candidate_id = Some(id);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Error code of a failed response, `None` on success.
    pub fn error_code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}
