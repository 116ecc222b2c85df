use thiserror::Error;

use super::common::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// `message` is the rendered error envelope when the body carried one,
    /// otherwise the raw body.
    #[error("unexpected status code: {status}, error: {message}")]
    UnexpectedStatus {
        status: u16,
        message: String,
        body: String,
        #[source]
        details: Option<Box<ErrorResponse>>,
    },

    #[error("Unauthorized: Please check your API key and permissions")]
    Unauthorized,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Table {name:?} already exists in project {project_id:?}")]
    TableAlreadyExists { project_id: String, name: String },

    #[error("table ID not set in create response")]
    TableIdMissing,

    #[error("job ID not found in response")]
    JobIdMissing,
}

impl ApiError {
    pub fn unexpected_status(status: u16, body: String) -> Self {
        let details = ErrorResponse::parse(&body).map(Box::new);
        let message = match &details {
            Some(envelope) => envelope.render(),
            None => body.clone(),
        };
        ApiError::UnexpectedStatus {
            status,
            message,
            body,
            details,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            ApiError::RequestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
