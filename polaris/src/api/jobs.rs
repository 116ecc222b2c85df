//! Ingestion job submission

use super::client::{decode, expect_status};
use super::common::ProjectResource;
use super::ApiError;
use reqwest::StatusCode;
use serde_json::Value;

/// Marker for the project-scoped jobs collection. Job payloads are passed
/// through as raw JSON.
pub struct Job;

impl ProjectResource for Job {
    fn collection() -> &'static str {
        "jobs"
    }
}

impl super::Client {
    /// Submit a job and return the id the server assigned
    pub async fn create_job(&self, project_id: &str, job: &Value) -> Result<String, ApiError> {
        let response = self.post(&Job::collection_path(project_id), job).await?;
        let body = expect_status(response, StatusCode::CREATED).await?;

        let result: Value = decode(&body)?;
        let id = result
            .get("id")
            .and_then(Value::as_str)
            .ok_or(ApiError::JobIdMissing)?;

        tracing::info!("Submitted job {} in project {}", id, project_id);
        Ok(id.to_string())
    }
}
