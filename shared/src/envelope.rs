//! Response body shared by every pantry endpoint.

use serde::Serialize;
use serde_json::Value;

/// The `{success, error?, ...payload}` JSON body every handler answers with.
///
/// Extra payload fields are flattened into the top level, so a handler can
/// attach its own data (a batch report, an encoded document) without nesting.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    payload: serde_json::Map<String, Value>,
}

impl Envelope {
    pub fn ok() -> Self {
        Envelope {
            success: true,
            error: None,
            payload: serde_json::Map::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Envelope {
            success: false,
            error: Some(error.into()),
            payload: serde_json::Map::new(),
        }
    }

    /// Attach a payload field at the top level of the body.
    pub fn with_field(mut self, key: &str, value: impl Serialize) -> Self {
        // Serialization of handler-built values does not fail in practice;
        // fall back to null rather than poisoning the response.
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.payload.insert(key.to_string(), value);
        self
    }

    /// Mark a non-fatal downstream failure. The payload attached so far is
    /// kept, so the primary operation's result still reaches the caller.
    pub fn downgrade(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_omits_error_field() {
        let body = serde_json::to_value(Envelope::ok()).unwrap();
        assert_eq!(body, serde_json::json!({"success": true}));
    }

    #[test]
    fn failure_carries_message() {
        let body = serde_json::to_value(Envelope::failure("boom")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "boom");
    }

    #[test]
    fn payload_fields_are_flattened() {
        let body = serde_json::to_value(
            Envelope::ok()
                .with_field("size_bytes", 42)
                .with_field("document", "aGk="),
        )
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": true, "size_bytes": 42, "document": "aGk="})
        );
    }

    #[test]
    fn downgrade_keeps_payload() {
        let body = serde_json::to_value(
            Envelope::ok()
                .with_field("document", "aGk=")
                .downgrade("notification delivery failed"),
        )
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "notification delivery failed");
        assert_eq!(body["document"], "aGk=");
    }
}
