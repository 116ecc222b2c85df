//! Connection API implementation
//!
//! A connection's payload depends on its `type`. Each type has its own struct,
//! so fields of one type can never appear in another type's payload.

use super::client::{decode, expect_status};
use super::common::{null_as_default, ProjectResource};
use super::ApiError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub name: String,
    /// Always sent, empty when unset
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(flatten)]
    pub spec: ConnectionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionSpec {
    Confluent(ConfluentConnection),
    Kafka(KafkaConnection),
    Kinesis(KinesisConnection),
    S3(S3Connection),
}

impl ConnectionSpec {
    pub const TYPES: [&'static str; 4] = ["confluent", "kafka", "kinesis", "s3"];

    /// Wire value of the `type` discriminator
    pub fn type_name(&self) -> &'static str {
        match self {
            ConnectionSpec::Confluent(_) => "confluent",
            ConnectionSpec::Kafka(_) => "kafka",
            ConnectionSpec::Kinesis(_) => "kinesis",
            ConnectionSpec::S3(_) => "s3",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfluentConnection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bootstrap_servers: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic_name_is_pattern: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Secrets>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConnection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub bootstrap_servers: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_rack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<Ssl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic_name_is_pattern: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Secrets>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisConnection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub aws_assumed_role_arn: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aws_endpoint: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stream: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Connection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub aws_assumed_role_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_endpoint: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Secrets>,
}

/// Credentials attached to a connection. The API does not return `password`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(rename = "type")]
    pub secret_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("secret_type", &self.secret_type)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ssl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truststore: Option<Truststore>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Truststore {
    #[serde(rename = "type")]
    pub truststore_type: String,
}

impl ProjectResource for Connection {
    fn collection() -> &'static str {
        "connections"
    }
}

impl super::Client {
    /// Create a connection; expects 201
    pub async fn create_connection(
        &self,
        project_id: &str,
        connection: &Connection,
    ) -> Result<(), ApiError> {
        let response = self
            .post(&Connection::collection_path(project_id), connection)
            .await?;
        expect_status(response, StatusCode::CREATED).await?;
        tracing::debug!(
            "Created {} connection {}",
            connection.spec.type_name(),
            connection.name
        );
        Ok(())
    }

    /// Get a connection by name; anything but 200 is an error
    pub async fn get_connection(&self, project_id: &str, name: &str) -> Result<Connection, ApiError> {
        let response = self.get(&Connection::item_path(project_id, name)).await?;
        let body = expect_status(response, StatusCode::OK).await?;
        decode(&body)
    }

    /// Replace the connection at `path`; expects 200
    pub async fn update_connection(&self, path: &str, connection: &Connection) -> Result<(), ApiError> {
        let response = self.put(path, connection).await?;
        expect_status(response, StatusCode::OK).await.map(|_| ())
    }

    /// Delete the connection at `path`; expects 204
    pub async fn delete_connection(&self, path: &str) -> Result<(), ApiError> {
        let response = self.delete(path).await?;
        expect_status(response, StatusCode::NO_CONTENT)
            .await
            .map(|_| ())
    }
}
