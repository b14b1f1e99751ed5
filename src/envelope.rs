// Response envelope: the uniform `{status, ...}` JSON shape returned by the
// forensics service and synthesized by the client when a request fails.
//
// The service is an external collaborator, so the envelope is kept as an
// opaque `serde_json::Value`. The forensics view reads each field on its own:
// a field with an unexpected type only loses that field, never the verdict.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON response from the forensics service, or a client-side error
/// shaped the same way.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Envelope(Value);

impl Envelope {
    /// Build a `{"status": "error", "message": ...}` envelope.
    pub fn error(message: impl Into<String>) -> Self {
        Envelope(json!({
            "status": "error",
            "message": message.into(),
        }))
    }

    pub fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(Value::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.status() == Some("success")
    }

    pub fn is_error(&self) -> bool {
        self.status() == Some("error")
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// View of the `forensics` object. `None` only when the field is absent
    /// or not an object.
    pub fn forensics(&self) -> Option<ForensicsVerdict> {
        self.0
            .get("forensics")
            .and_then(Value::as_object)
            .map(ForensicsVerdict::from_object)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Envelope {
    fn from(value: Value) -> Self {
        Envelope(value)
    }
}

/// Tamper analysis payload found under `forensics` in a forensics envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForensicsVerdict {
    /// `false` unless the service sent the boolean `true`.
    pub is_tampered: bool,
    /// Empty when the list is missing or not an array.
    pub tampering_indicators: Vec<TamperingIndicator>,
}

impl ForensicsVerdict {
    fn from_object(forensics: &Map<String, Value>) -> Self {
        let is_tampered = forensics
            .get("is_tampered")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let tampering_indicators: Vec<TamperingIndicator> = forensics
            .get("tampering_indicators")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(TamperingIndicator::from_value).collect())
            .unwrap_or_default();
        ForensicsVerdict {
            is_tampered,
            tampering_indicators,
        }
    }
}

/// A server-reported hint that an image was altered. Fields other than
/// `type` and `description` are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TamperingIndicator {
    pub kind: Option<String>,
    /// Strings as-is; other non-null values as their JSON text.
    pub description: Option<String>,
    pub extra: Map<String, Value>,
}

impl TamperingIndicator {
    fn from_value(value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            return TamperingIndicator::default();
        };
        let kind = fields.get("type").and_then(Value::as_str).map(str::to_string);
        let description = match fields.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        let extra: Map<String, Value> = fields
            .iter()
            .filter(|(k, _)| k.as_str() != "type" && k.as_str() != "description")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        TamperingIndicator {
            kind,
            description,
            extra,
        }
    }
}
