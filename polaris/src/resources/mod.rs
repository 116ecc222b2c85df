//! Resource implementations

pub mod connection;
mod fields;
pub mod table;

pub use connection::ConnectionResource;
pub use table::TableResource;

use thiserror::Error;
use tfplug::types::{AttributePath, Diagnostic};
use tfplug::TfplugError;

use crate::api::ApiError;

/// Failure turning resource configuration into an API payload
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Missing required attribute {0}")]
    Missing(AttributePath),

    #[error("Invalid value for {path}: {source}")]
    InvalidValue {
        path: AttributePath,
        #[source]
        source: TfplugError,
    },

    #[error("Unknown connection type {0:?}, expected one of confluent, kafka, kinesis, s3")]
    UnknownConnectionType(String),

    #[error("{attribute} is required for connection type {kind:?}")]
    MissingForType {
        kind: String,
        attribute: &'static str,
    },
}

impl MappingError {
    /// Attribute the error points at, for diagnostics
    pub fn attribute(&self) -> AttributePath {
        match self {
            MappingError::Missing(path) | MappingError::InvalidValue { path, .. } => path.clone(),
            MappingError::UnknownConnectionType(_) => AttributePath::new("type"),
            MappingError::MissingForType { attribute, .. } => AttributePath::new(attribute),
        }
    }

    pub fn to_diagnostic(&self, summary: &str) -> Diagnostic {
        Diagnostic::error(summary, self.to_string()).with_attribute(self.attribute())
    }
}

pub(crate) fn api_diagnostic(summary: &str, error: &ApiError) -> Diagnostic {
    Diagnostic::error(summary, format!("API error: {}", error))
}

pub(crate) fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

/// Reads `project_id`, which scopes every endpoint and is never returned by the API
pub(crate) fn project_id(value: &tfplug::DynamicValue) -> Result<String, MappingError> {
    fields::Fields::new(value).string("project_id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_point_at_offending_attribute() {
        let err = MappingError::Missing(AttributePath::new("schema").index(1).attribute("name"));
        let diag = err.to_diagnostic("Invalid table configuration");

        assert!(diag.is_error());
        assert_eq!(diag.detail, "Missing required attribute schema[1].name");
        assert_eq!(diag.attribute.unwrap().to_string(), "schema[1].name");
    }

    #[test]
    fn variant_errors_name_the_type() {
        let err = MappingError::MissingForType {
            kind: "kinesis".to_string(),
            attribute: "stream",
        };
        assert_eq!(
            err.to_string(),
            "stream is required for connection type \"kinesis\""
        );
        assert_eq!(err.attribute().to_string(), "stream");

        let err = MappingError::UnknownConnectionType("pulsar".to_string());
        assert_eq!(err.attribute().to_string(), "type");
    }
}
