//! Common types for the shared crate
//!
//! Identifier and credential newtypes used on both the HTTP and the
//! WebSocket side of the platform API.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Topic prefix for job notifications (`jobs.<JobId>`)
pub const JOB_TOPIC_PREFIX: &str = "jobs";

/// ULID made of sixteen zero bytes, used as the id of an app that has never
/// been exported
pub const EMPTY_ULID: &str = "00000000000000000000000000";

/// Server-side job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Subscription topic carrying this job's completion
    pub fn topic(&self) -> String {
        format!("{JOB_TOPIC_PREFIX}.{}", self.0)
    }

    /// Extract the job id from a `jobs.<id>` topic
    ///
    /// Exactly two dot-separated segments are accepted, the first being
    /// `jobs` and the second non-empty. Everything else yields `None`.
    pub fn from_topic(topic: &str) -> Option<Self> {
        let mut parts = topic.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(JOB_TOPIC_PREFIX), Some(id), None) if !id.is_empty() => Some(Self::new(id)),
            _ => None,
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Short-lived credential for authenticating the notification channel
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(String);

impl Ticket {
    pub fn new(ticket: impl Into<String>) -> Self {
        Self(ticket.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Ticket {
    fn from(ticket: String) -> Self {
        Self(ticket)
    }
}

impl From<&str> for Ticket {
    fn from(ticket: &str) -> Self {
        Self(ticket.to_string())
    }
}

// Tickets end up in logs through `Debug` on connection errors.
impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ticket(***)")
    }
}
