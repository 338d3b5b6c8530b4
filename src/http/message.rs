//! JSON status messages
//!
//! A message renders as `{...fields, "message": "<text>"}` with its own status.

use serde_json::{Map, Value};

use super::response::Response;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonMessage {
    message: String,
    status: u16,
    fields: Map<String, Value>,
}

impl JsonMessage {
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    /// JSON body; the `message` key always wins over a field of the same name
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("message".to_string(), Value::String(self.message.clone()));
        Value::Object(object)
    }

    /// Copy with merged fields and optionally replaced message and status
    #[must_use]
    pub fn update(
        &self,
        message: Option<&str>,
        status: Option<u16>,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        let mut merged = self.fields.clone();
        merged.extend(fields);
        Self {
            message: message.map_or_else(|| self.message.clone(), ToString::to_string),
            status: status.unwrap_or(self.status),
            fields: merged,
        }
    }

    pub fn to_response(&self) -> Result<Response> {
        Response::json(&self.to_json())?.with_status(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_body() {
        let message = JsonMessage::new("Created.", 201)
            .field("id", 7)
            .field("message", "ignored");
        assert_eq!(message.to_json(), json!({"id": 7, "message": "Created."}));

        let response = message.to_response().unwrap();
        assert_eq!(response.status(), 201);
        assert_eq!(response.mimetype(), "application/json");
    }

    #[test]
    fn test_update_merges_fields() {
        let base = JsonMessage::new("No such record.", 404).field("table", "users");
        let updated = base.update(None, Some(410), [("id".to_string(), json!(3))]);
        assert_eq!(updated.status(), 410);
        assert_eq!(updated.message(), "No such record.");
        assert_eq!(
            updated.to_json(),
            json!({"table": "users", "id": 3, "message": "No such record."})
        );
        assert_eq!(base.status(), 404);
    }

    #[test]
    fn test_invalid_status() {
        assert!(JsonMessage::new("odd", 42).to_response().is_err());
    }
}
