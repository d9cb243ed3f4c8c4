//! Notification channel message types
//!
//! Every frame on the WebSocket is a JSON object tagged by `event`:
//!
//! ```text
//! client → server   {"event":"auth","method":"ticket","ticket":"..."}
//! client → server   {"event":"subscribe","subscription":"jobs.<JobId>"}
//! server → client   {"event":"message","subscription":"jobs.<JobId>","data":{...}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{JobId, Ticket};

pub mod payload;
pub use payload::*;

/// Authentication method announced in the `auth` envelope
pub const AUTH_METHOD_TICKET: &str = "ticket";

/// Wire envelope exchanged over the notification channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Envelope {
    /// Channel authentication (outbound only)
    Auth { method: String, ticket: String },

    /// Topic subscription (outbound only)
    Subscribe { subscription: String },

    /// Topic notification (inbound)
    Message {
        #[serde(default)]
        subscription: Option<String>,
        /// Kept raw so that a malformed payload on a job topic still
        /// completes the job (as a failure)
        #[serde(default)]
        data: Value,
    },

    /// Any other event the server may send
    #[serde(other)]
    Other,
}

impl Envelope {
    pub fn auth(ticket: &Ticket) -> Self {
        Self::Auth {
            method: AUTH_METHOD_TICKET.to_string(),
            ticket: ticket.as_str().to_string(),
        }
    }

    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self::Subscribe {
            subscription: topic.into(),
        }
    }

    /// Job id and result carried by this envelope, if it is a job notification
    pub fn into_job_result(self) -> Option<JobResult> {
        match self {
            Self::Message {
                subscription: Some(topic),
                data,
            } => JobId::from_topic(&topic).map(|job_id| {
                JobResult::from_notification(job_id, JobNotification::from_data(data))
            }),
            _ => None,
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::Subscribe { .. } => "subscribe",
            Self::Message { .. } => "message",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_wire_format() {
        let envelope = Envelope::auth(&Ticket::new("t-1"));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({"event": "auth", "method": "ticket", "ticket": "t-1"})
        );
    }

    #[test]
    fn test_subscribe_wire_format() {
        let envelope = Envelope::subscribe(JobId::new("job-1").topic());
        let text = serde_json::to_string(&envelope).unwrap();
        assert_eq!(text, r#"{"event":"subscribe","subscription":"jobs.job-1"}"#);
    }

    #[test]
    fn test_parse_job_message() {
        let text = r#"{"event":"message","subscription":"jobs.job-1","data":{"status":"success","retval":{"AppId":"app-42"}}}"#;
        let envelope: Envelope = serde_json::from_str(text).unwrap();
        let result = envelope.into_job_result().unwrap();
        assert_eq!(result.job_id, JobId::new("job-1"));
        assert!(result.success);
        assert_eq!(result.return_value, Some(json!({"AppId": "app-42"})));
    }

    #[test]
    fn test_unknown_event_parses_as_other() {
        let envelope: Envelope = serde_json::from_str(r#"{"event":"pong","ts":1}"#).unwrap();
        assert_eq!(envelope, Envelope::Other);
        assert!(envelope.into_job_result().is_none());
    }

    #[test]
    fn test_message_with_foreign_topic_has_no_job() {
        for topic in ["jobs.abc.def", "other.123", "jobs"] {
            let envelope = Envelope::Message {
                subscription: Some(topic.to_string()),
                data: json!({"status": "success"}),
            };
            assert!(envelope.into_job_result().is_none(), "topic {topic}");
        }
    }

    #[test]
    fn test_malformed_data_on_job_topic_is_a_failure() {
        for text in [
            r#"{"event":"message","subscription":"jobs.j1","data":{"status":3,"retval":null}}"#,
            r#"{"event":"message","subscription":"jobs.j1","data":null}"#,
            r#"{"event":"message","subscription":"jobs.j1","data":"oops"}"#,
        ] {
            let envelope: Envelope = serde_json::from_str(text).unwrap();
            let result = envelope.into_job_result().unwrap();
            assert_eq!(result.job_id, JobId::new("j1"), "{text}");
            assert!(!result.success, "{text}");
            assert!(result.return_value.is_none(), "{text}");
        }
    }

    #[test]
    fn test_message_without_data() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"event":"message","subscription":"jobs.j"}"#).unwrap();
        let result = envelope.into_job_result().unwrap();
        assert!(!result.success);
        assert!(result.return_value.is_none());
    }
}
