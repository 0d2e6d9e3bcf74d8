use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorContext, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Uniform response of every router call
///
/// Exactly one of `data` (on success) or `message` (on error) is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self {
            status: Status::Success,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Pretty-printed JSON, as placed in MCP text content
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context("tool result")
    }
}

impl From<Result<Value>> for Envelope {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(data) => Envelope::success(data),
            Err(err) => Envelope::error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    #[test]
    fn test_success_omits_message() {
        let envelope = Envelope::success(json!({ "count": 0 }));
        assert!(envelope.is_success());
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "status": "success", "data": { "count": 0 } })
        );
    }

    #[test]
    fn test_error_omits_data() {
        let envelope = Envelope::error("Unknown operation: nope");
        assert!(!envelope.is_success());
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({ "status": "error", "message": "Unknown operation: nope" })
        );
    }

    #[test]
    fn test_from_result() {
        let ok: Envelope = Ok(json!([])).into();
        assert!(ok.is_success());

        let err: Envelope = Err(Error::validation("name", "is required")).into();
        assert_eq!(
            err.message.as_deref(),
            Some("Invalid argument 'name': is required")
        );
    }

    #[test]
    fn test_to_text_is_parseable() {
        let text = Envelope::success(json!({ "a": 1 })).to_text().unwrap();
        assert!(text.contains('\n'));
        let parsed: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.data, Some(json!({ "a": 1 })));
    }
}
