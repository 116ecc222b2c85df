//! Common types and utilities for the Polaris API

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Structured error body returned by the API on failed requests
#[derive(Debug, Clone, Default, PartialEq, Deserialize, thiserror::Error)]
#[error("{}", self.render())]
pub struct ErrorResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: Vec<ErrorDetail>,
    #[serde(default, rename = "innererror", deserialize_with = "null_as_default")]
    pub inner_error: InnerError,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InnerError {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

impl ErrorResponse {
    /// Parses `body` as an error envelope. Bodies that are not JSON objects, or
    /// that carry neither a code nor a message, are not envelopes.
    pub fn parse(body: &str) -> Option<Self> {
        let envelope: ErrorResponse = serde_json::from_str(body).ok()?;
        if envelope.code.is_empty() && envelope.message.is_empty() {
            return None;
        }
        Some(envelope)
    }

    /// Multi-line human readable form:
    ///
    /// ```text
    /// Error: <code> - <message>
    /// Details:
    ///  - <code>: <message>
    /// Inner Error: <code> - <message>
    /// ```
    pub fn render(&self) -> String {
        let mut out = format!("Error: {} - {}", self.code, self.message);

        if !self.details.is_empty() {
            out.push_str("\nDetails:");
            for detail in &self.details {
                out.push_str(&format!("\n - {}: {}", detail.code, detail.message));
            }
        }

        if !self.inner_error.code.is_empty() {
            out.push_str(&format!(
                "\nInner Error: {} - {}",
                self.inner_error.code, self.inner_error.message
            ));
        }

        out
    }
}

/// Wrapper for list endpoints
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListResponse<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<T>,
}

/// Resources that live in a project-scoped collection
pub trait ProjectResource {
    /// Collection segment under `/v1/projects/{project}`
    fn collection() -> &'static str;

    fn collection_path(project_id: &str) -> String {
        format!(
            "/v1/projects/{}/{}",
            urlencoding::encode(project_id),
            Self::collection()
        )
    }

    fn item_path(project_id: &str, key: &str) -> String {
        format!(
            "{}/{}",
            Self::collection_path(project_id),
            urlencoding::encode(key)
        )
    }
}

/// Treats an explicit JSON `null` the same as a missing field
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Truncated view of a response body for log lines
pub struct BodyPreview<'a>(pub &'a str);

impl fmt::Display for BodyPreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LIMIT: usize = 512;
        match self.0.char_indices().nth(LIMIT) {
            Some((cut, _)) => write!(f, "{}...", &self.0[..cut]),
            None => f.write_str(self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;

    impl ProjectResource for Widget {
        fn collection() -> &'static str {
            "widgets"
        }
    }

    #[test]
    fn renders_full_envelope() {
        let body = r#"{
            "code": "BadArgument",
            "message": "Invalid table",
            "details": [
                {"code": "InvalidValue", "message": "name is too long", "target": "name"},
                {"code": "Missing", "message": "type is required"}
            ],
            "innererror": {"code": "E42", "message": "validation failed"}
        }"#;

        let envelope = ErrorResponse::parse(body).unwrap();
        assert_eq!(
            envelope.render(),
            "Error: BadArgument - Invalid table\n\
             Details:\n \
             - InvalidValue: name is too long\n \
             - Missing: type is required\n\
             Inner Error: E42 - validation failed"
        );
    }

    #[test]
    fn renders_minimal_envelope() {
        let envelope = ErrorResponse::parse(r#"{"code":"NotFound","message":"gone"}"#).unwrap();
        assert_eq!(envelope.render(), "Error: NotFound - gone");
        assert_eq!(envelope.to_string(), "Error: NotFound - gone");
    }

    #[test]
    fn rejects_non_envelopes() {
        assert!(ErrorResponse::parse("internal server error").is_none());
        assert!(ErrorResponse::parse(r#"{"status": 500}"#).is_none());
        assert!(ErrorResponse::parse("").is_none());
    }

    #[test]
    fn null_fields_read_as_defaults() {
        let envelope =
            ErrorResponse::parse(r#"{"code":"X","message":null,"details":null,"innererror":null}"#)
                .unwrap();
        assert_eq!(envelope.render(), "Error: X - ");
    }

    #[test]
    fn paths_are_percent_encoded() {
        assert_eq!(Widget::collection_path("p1"), "/v1/projects/p1/widgets");
        assert_eq!(
            Widget::item_path("team a", "orders/2024"),
            "/v1/projects/team%20a/widgets/orders%2F2024"
        );
    }

    #[test]
    fn body_preview_truncates_long_bodies() {
        let long = "x".repeat(600);
        let preview = BodyPreview(&long).to_string();
        assert_eq!(preview.len(), 515);
        assert!(preview.ends_with("..."));
        assert_eq!(BodyPreview("short").to_string(), "short");
    }
}
