use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::JobId;

/// Status value reported for a job that completed successfully
pub const JOB_STATUS_SUCCESS: &str = "success";

// ==================== Job Notification ====================

/// `data` member of a job notification
///
/// Only a `status` equal to the string `"success"` counts as success; any
/// other value, of any JSON type, is a failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobNotification {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retval: Option<Value>,
}

impl JobNotification {
    pub fn success(retval: Option<Value>) -> Self {
        Self {
            status: Some(Value::String(JOB_STATUS_SUCCESS.to_string())),
            retval,
        }
    }

    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            status: Some(Value::String(status.into())),
            retval: None,
        }
    }

    /// Read the `data` member of a job message
    ///
    /// A missing, `null` or non-object `data` yields an empty notification,
    /// which reports failure.
    pub fn from_data(data: Value) -> Self {
        serde_json::from_value(data).unwrap_or_default()
    }

    pub fn is_success(&self) -> bool {
        self.status.as_ref().and_then(Value::as_str) == Some(JOB_STATUS_SUCCESS)
    }
}

// ==================== Job Result ====================

/// Outcome of a finished job as delivered to waiters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: JobId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Value>,
}

impl JobResult {
    pub fn from_notification(job_id: JobId, data: JobNotification) -> Self {
        Self {
            success: data.is_success(),
            return_value: data.retval,
            job_id,
        }
    }

    /// Decode the returned value into an operation response
    ///
    /// An absent value decodes as JSON `null`, so only types that accept
    /// `null` succeed in that case.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let value = self.return_value.clone().unwrap_or(Value::Null);
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_other_than_success_is_failure() {
        for status in ["failed", "error", "SUCCESS", ""] {
            let result =
                JobResult::from_notification(JobId::new("j"), JobNotification::failed(status));
            assert!(!result.success, "status {status}");
        }
    }

    #[test]
    fn test_data_of_any_shape_is_read() {
        let cases = [
            json!({"status": 3, "retval": null}),
            json!({"status": null}),
            json!(null),
            json!("success"),
            json!([1, 2]),
        ];
        for data in cases {
            let notification = JobNotification::from_data(data.clone());
            assert!(!notification.is_success(), "data {data}");
            assert!(notification.retval.is_none(), "data {data}");
        }

        let notification =
            JobNotification::from_data(json!({"status": "success", "retval": {"AppId": "a"}}));
        assert!(notification.is_success());
        assert_eq!(notification.retval, Some(json!({"AppId": "a"})));
    }

    #[test]
    fn test_decode_missing_value() {
        let result = JobResult::from_notification(JobId::new("j"), JobNotification::success(None));
        assert!(result.decode::<Option<String>>().unwrap().is_none());
        assert!(result.decode::<Vec<String>>().is_err());
    }

    #[test]
    fn test_decode_value() {
        let result = JobResult::from_notification(
            JobId::new("j"),
            JobNotification::success(Some(json!({"n": 3}))),
        );
        let decoded: Value = result.decode().unwrap();
        assert_eq!(decoded["n"], 3);
    }
}
