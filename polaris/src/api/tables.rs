//! Table API implementation

use super::client::{decode, expect_status};
use super::common::{null_as_default, ListResponse, ProjectResource};
use super::ApiError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Table as sent to and returned by the API.
///
/// Fields after `availability` are owned by the server and never serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub table_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering_columns: Option<Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub partitioning_granularity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_granularity: Option<QueryGranularity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schema: Vec<SchemaColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_policy: Option<StoragePolicy>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_resolution: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub availability: String,

    #[serde(default, skip_serializing)]
    pub created_by_user: Option<User>,
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    pub created_on_timestamp: String,
    #[serde(default, skip_serializing)]
    pub modified_by_user: Option<User>,
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    pub modified_on_timestamp: String,
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    pub segment_compacted_bytes: i64,
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    pub segment_total_bytes: i64,
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    pub total_data_size_bytes: i64,
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    pub total_rows: i64,
    #[serde(default, skip_serializing, deserialize_with = "null_as_default")]
    pub queryable_schema: Vec<QueryableColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,
}

/// Server-computed projection of a schema column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryableColumn {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: String,
    #[serde(default)]
    pub data_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoragePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<StoragePolicyDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain: Option<StoragePolicyDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoragePolicyDetail {
    #[serde(rename = "type", default)]
    pub policy_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub intervals: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryGranularity {
    #[serde(rename = "type", default)]
    pub granularity_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: String,
    #[serde(rename = "userId", default)]
    pub user_id: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ProjectResource for Table {
    fn collection() -> &'static str {
        "tables"
    }
}

impl super::Client {
    /// List all tables in a project
    pub async fn list_tables(&self, project_id: &str) -> Result<Vec<Table>, ApiError> {
        let response = self.get(&Table::collection_path(project_id)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        let body = expect_status(response, StatusCode::OK).await?;
        let list: ListResponse<Table> = decode(&body)?;
        Ok(list.values)
    }

    /// Whether a table called `name` exists, by linear scan of the listing
    pub async fn table_exists(&self, project_id: &str, name: &str) -> Result<bool, ApiError> {
        let tables = self.list_tables(project_id).await?;
        Ok(tables.iter().any(|t| t.name == name))
    }

    /// Get a table by name. `Ok(None)` means the API answered 404.
    pub async fn get_table(&self, project_id: &str, name: &str) -> Result<Option<Table>, ApiError> {
        let response = self.get(&Table::item_path(project_id, name)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!("Table {} not found in project {}", name, project_id);
                Ok(None)
            }
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            _ => {
                let body = expect_status(response, StatusCode::OK).await?;
                decode(&body).map(Some)
            }
        }
    }

    /// Create a table. On success the server's response is merged into `table`,
    /// which then carries the assigned `id`. On failure `table` is untouched.
    pub async fn create_table(&self, project_id: &str, table: &mut Table) -> Result<(), ApiError> {
        let response = self
            .post(&Table::collection_path(project_id), &*table)
            .await?;
        let body = expect_status(response, StatusCode::CREATED).await?;

        let mut merged =
            serde_json::to_value(&*table).map_err(|e| ApiError::ParseError(e.to_string()))?;
        let returned: serde_json::Value = decode(&body)?;
        overlay(&mut merged, returned);

        let created: Table = serde_json::from_value(merged).map_err(|e| {
            tracing::error!("Failed to deserialize created table: {}", e);
            ApiError::ParseError(e.to_string())
        })?;
        if created.id.is_empty() {
            return Err(ApiError::TableIdMissing);
        }

        tracing::debug!("Created table {} with ID {}", created.name, created.id);
        *table = created;
        Ok(())
    }

    /// Replace all mutable fields of the table with `id`
    pub async fn update_table(
        &self,
        project_id: &str,
        id: &str,
        table: &Table,
    ) -> Result<(), ApiError> {
        let response = self.put(&Table::item_path(project_id, id), table).await?;
        expect_status(response, StatusCode::OK).await.map(|_| ())
    }

    /// Delete the table with `id`
    pub async fn delete_table(&self, project_id: &str, id: &str) -> Result<(), ApiError> {
        let response = self.delete(&Table::item_path(project_id, id)).await?;
        expect_status(response, StatusCode::NO_CONTENT)
            .await
            .map(|_| ())
    }
}

/// Top-level keys of `patch` replace those of `base`
fn overlay(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            base.extend(patch);
        }
        (base, patch) => *base = patch,
    }
}
