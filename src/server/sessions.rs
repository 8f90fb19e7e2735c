//! # Session Registry
//!
//! Static user table plus the set of usernames that currently hold a live
//! session. Each active username is bound to the connection that logged in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::common::error::{PollError, Result};
use crate::common::messages::Role;

/// Identity of one accepted control-channel connection.
pub type ConnectionId = u64;

/// A user account, loaded at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub secret: String,
    pub role: Role,
}

impl User {
    pub fn new(username: &str, secret: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            secret: secret.to_string(),
            role,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    users: HashMap<String, User>,
    /// username -> connection holding the session
    active: HashMap<String, ConnectionId>,
}

impl SessionRegistry {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
            active: HashMap::new(),
        }
    }

    /// Check credentials and open a session for `connection`.
    ///
    /// Any other username already bound to the same connection is released,
    /// so a connection holds at most one session.
    pub fn login(&mut self, username: &str, secret: &str, connection: ConnectionId) -> Result<Role> {
        let user = self
            .users
            .get(username)
            .filter(|user| user.secret == secret)
            .ok_or(PollError::InvalidCredentials)?;

        if self.active.contains_key(username) {
            return Err(PollError::AlreadyLoggedIn);
        }

        let role = user.role;
        self.active.retain(|_, owner| *owner != connection);
        self.active.insert(username.to_string(), connection);
        Ok(role)
    }

    /// Drop the active marker for `username`. Idempotent.
    pub fn logout(&mut self, username: &str) -> bool {
        self.active.remove(username).is_some()
    }

    pub fn is_active(&self, username: &str) -> bool {
        self.active.contains_key(username)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
