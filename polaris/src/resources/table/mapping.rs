//! Conversion between `polaris_table` configuration and the API's `Table`

use tfplug::types::{Dynamic, DynamicValue};

use super::{
    DEFAULT_AVAILABILITY, DEFAULT_PARTITIONING_GRANULARITY, DEFAULT_TIME_RESOLUTION,
    DEFAULT_VERSION,
};
use crate::api::{
    QueryGranularity, QueryableColumn, SchemaColumn, StoragePolicy, StoragePolicyDetail, Table,
    User,
};
use crate::resources::fields::{self, object, single_block, Fields};
use crate::resources::MappingError;

/// Builds the full table payload; every mutable field is populated
pub fn expand_table(config: &DynamicValue) -> Result<Table, MappingError> {
    let fields = Fields::new(config);

    Ok(Table {
        name: fields.string("name")?,
        table_type: fields.string("type")?,
        version: fields.integer_or("version", DEFAULT_VERSION)?,
        description: fields.non_empty_string("description")?,
        clustering_columns: fields.string_list("clustering_columns")?,
        partitioning_granularity: fields
            .string_or("partitioning_granularity", DEFAULT_PARTITIONING_GRANULARITY)?,
        query_granularity: expand_query_granularity(&fields)?,
        schema: expand_schema(&fields)?,
        schema_mode: fields.non_empty_string("schema_mode")?,
        storage_policy: expand_storage_policy(&fields)?,
        time_resolution: fields.string_or("time_resolution", DEFAULT_TIME_RESOLUTION)?,
        availability: fields.string_or("availability", DEFAULT_AVAILABILITY)?,
        ..Default::default()
    })
}

/// A map without `type` still produces a granularity, with an empty type
fn expand_query_granularity(
    fields: &Fields<'_>,
) -> Result<Option<QueryGranularity>, MappingError> {
    Ok(fields
        .string_map("query_granularity")?
        .map(|map| QueryGranularity {
            granularity_type: map.get("type").cloned().unwrap_or_default(),
        }))
}

fn expand_schema(fields: &Fields<'_>) -> Result<Vec<SchemaColumn>, MappingError> {
    fields
        .blocks("schema")?
        .iter()
        .map(|column| {
            Ok(SchemaColumn {
                name: column.string("name")?,
                column_type: column.string("type")?,
                data_type: column.string("data_type")?,
                primary_key: column.bool_or("primary_key", false)?,
            })
        })
        .collect()
}

/// A policy with neither `cached` nor `retain` is omitted
fn expand_storage_policy(fields: &Fields<'_>) -> Result<Option<StoragePolicy>, MappingError> {
    let Some(policy) = fields.single_block("storage_policy")? else {
        return Ok(None);
    };

    let cached = expand_storage_policy_detail(&policy, "cached")?;
    let retain = expand_storage_policy_detail(&policy, "retain")?;
    if cached.is_none() && retain.is_none() {
        return Ok(None);
    }
    Ok(Some(StoragePolicy { cached, retain }))
}

fn expand_storage_policy_detail(
    policy: &Fields<'_>,
    name: &str,
) -> Result<Option<StoragePolicyDetail>, MappingError> {
    let Some(detail) = policy.single_block(name)? else {
        return Ok(None);
    };
    Ok(Some(StoragePolicyDetail {
        policy_type: detail.optional_string("type")?.unwrap_or_default(),
        intervals: detail.string_list("intervals")?.unwrap_or_default(),
    }))
}

/// Full resource state for `table`. `project_id` is not part of the API model
/// and comes from the caller.
pub fn flatten_table(table: &Table, project_id: &str) -> DynamicValue {
    let mut state = std::collections::HashMap::new();
    let mut set = |key: &str, value: Dynamic| {
        state.insert(key.to_string(), value);
    };

    set("project_id", Dynamic::from(project_id));
    set("id", Dynamic::from(table.id.as_str()));
    set("name", Dynamic::from(table.name.as_str()));
    set("type", Dynamic::from(table.table_type.as_str()));
    set("description", Dynamic::from(table.description.clone()));
    set("version", Dynamic::from(table.version));
    set(
        "clustering_columns",
        fields::string_list(table.clustering_columns.as_deref().unwrap_or_default()),
    );
    set(
        "partitioning_granularity",
        Dynamic::from(table.partitioning_granularity.as_str()),
    );
    set(
        "query_granularity",
        flatten_query_granularity(table.query_granularity.as_ref()),
    );
    set("schema", flatten_schema(&table.schema));
    set("schema_mode", Dynamic::from(table.schema_mode.clone()));
    set(
        "storage_policy",
        single_block(table.storage_policy.as_ref().and_then(flatten_storage_policy)),
    );
    set("time_resolution", Dynamic::from(table.time_resolution.as_str()));
    set("availability", Dynamic::from(table.availability.as_str()));

    set("created_by_user", flatten_user(table.created_by_user.as_ref()));
    set(
        "created_on_timestamp",
        Dynamic::from(table.created_on_timestamp.as_str()),
    );
    set("modified_by_user", flatten_user(table.modified_by_user.as_ref()));
    set(
        "modified_on_timestamp",
        Dynamic::from(table.modified_on_timestamp.as_str()),
    );
    set(
        "segment_compacted_bytes",
        Dynamic::from(table.segment_compacted_bytes),
    );
    set("segment_total_bytes", Dynamic::from(table.segment_total_bytes));
    set(
        "total_data_size_bytes",
        Dynamic::from(table.total_data_size_bytes),
    );
    set("total_rows", Dynamic::from(table.total_rows));
    set(
        "queryable_schema",
        flatten_queryable_schema(&table.queryable_schema),
    );

    DynamicValue::from_map(state)
}

fn flatten_query_granularity(granularity: Option<&QueryGranularity>) -> Dynamic {
    match granularity {
        Some(g) => object([("type", Dynamic::from(g.granularity_type.as_str()))]),
        None => Dynamic::Null,
    }
}

fn flatten_schema(columns: &[SchemaColumn]) -> Dynamic {
    if columns.is_empty() {
        return Dynamic::Null;
    }
    Dynamic::List(
        columns
            .iter()
            .map(|c| {
                object([
                    ("name", Dynamic::from(c.name.as_str())),
                    ("type", Dynamic::from(c.column_type.as_str())),
                    ("data_type", Dynamic::from(c.data_type.as_str())),
                    ("primary_key", fields::flag(c.primary_key)),
                ])
            })
            .collect(),
    )
}

/// `None` for a policy with neither `cached` nor `retain`, matching expansion
fn flatten_storage_policy(policy: &StoragePolicy) -> Option<Dynamic> {
    if policy.cached.is_none() && policy.retain.is_none() {
        return None;
    }
    Some(object([
        (
            "cached",
            single_block(policy.cached.as_ref().map(flatten_storage_policy_detail)),
        ),
        (
            "retain",
            single_block(policy.retain.as_ref().map(flatten_storage_policy_detail)),
        ),
    ]))
}

fn flatten_storage_policy_detail(detail: &StoragePolicyDetail) -> Dynamic {
    object([
        ("type", fields::non_empty(&detail.policy_type)),
        ("intervals", fields::string_list(&detail.intervals)),
    ])
}

fn flatten_user(user: Option<&User>) -> Dynamic {
    match user {
        Some(u) => object([
            ("username", Dynamic::from(u.username.as_str())),
            ("user_id", Dynamic::from(u.user_id.as_str())),
        ]),
        None => Dynamic::Null,
    }
}

/// Only column names are exposed
fn flatten_queryable_schema(columns: &[QueryableColumn]) -> Dynamic {
    Dynamic::List(
        columns
            .iter()
            .map(|c| object([("name", Dynamic::from(c.name.as_str()))]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tfplug::types::AttributePath;

    fn config(value: serde_json::Value) -> DynamicValue {
        DynamicValue::new(Dynamic::from(value))
    }

    fn full_config() -> serde_json::Value {
        json!({
            "project_id": "p1",
            "name": "events",
            "type": "detail",
            "description": "raw events",
            "version": 2,
            "clustering_columns": ["country", "city"],
            "partitioning_granularity": "hour",
            "query_granularity": {"type": "minute"},
            "schema": [
                {"name": "__time", "type": "timestamp", "data_type": "timestamp", "primary_key": true},
                {"name": "country", "type": "dimension", "data_type": "string"}
            ],
            "schema_mode": "strict",
            "storage_policy": [{
                "cached": [{"type": "periodRetention", "intervals": ["P30D"]}],
                "retain": [{"type": "periodRetention", "intervals": ["P1Y", "P2Y"]}]
            }],
            "time_resolution": "second",
            "availability": "available"
        })
    }

    /// Mutable attributes of a flattened state, for comparing against config
    fn configurable(state: &DynamicValue) -> Dynamic {
        let mut map = state.value.as_map().unwrap().clone();
        for computed in [
            "id",
            "created_by_user",
            "created_on_timestamp",
            "modified_by_user",
            "modified_on_timestamp",
            "segment_compacted_bytes",
            "segment_total_bytes",
            "total_data_size_bytes",
            "total_rows",
            "queryable_schema",
        ] {
            map.remove(computed);
        }
        without_nulls(&Dynamic::Map(map))
    }

    fn without_nulls(value: &Dynamic) -> Dynamic {
        match value {
            Dynamic::Map(map) => Dynamic::Map(
                map.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), without_nulls(v)))
                    .collect(),
            ),
            Dynamic::List(items) => Dynamic::List(items.iter().map(without_nulls).collect()),
            other => other.clone(),
        }
    }

    #[test]
    fn expands_every_field() {
        let table = expand_table(&config(full_config())).unwrap();

        assert_eq!(table.name, "events");
        assert_eq!(table.version, 2);
        assert_eq!(table.description.as_deref(), Some("raw events"));
        assert_eq!(
            table.query_granularity.unwrap().granularity_type,
            "minute"
        );
        assert_eq!(table.schema.len(), 2);
        assert!(table.schema[0].primary_key);
        let policy = table.storage_policy.unwrap();
        assert_eq!(policy.retain.unwrap().intervals, vec!["P1Y", "P2Y"]);
        assert!(table.id.is_empty());
    }

    #[test]
    fn round_trips_full_config() {
        let table = expand_table(&config(full_config())).unwrap();
        let state = flatten_table(&table, "p1");

        assert_eq!(configurable(&state), Dynamic::from(full_config()));
        assert_eq!(expand_table(&state).unwrap(), table);
    }

    #[test]
    fn unset_primary_key_stays_null() {
        let table = expand_table(&config(full_config())).unwrap();
        assert!(!table.schema[1].primary_key);

        let state = flatten_table(&table, "p1");
        let column = AttributePath::new("schema").index(1);
        assert!(state.lookup(&column.clone().attribute("primary_key")).is_none());
        assert!(state
            .get_bool(&AttributePath::new("schema").index(0).attribute("primary_key"))
            .unwrap());
        assert_eq!(
            state.get_string(&column.attribute("name")).unwrap(),
            "country"
        );
    }

    #[test]
    fn empty_storage_policy_from_server_flattens_to_null() {
        let table: Table = serde_json::from_value(json!({
            "id": "t-1",
            "name": "events",
            "type": "detail",
            "storagePolicy": {}
        }))
        .unwrap();
        assert!(table.storage_policy.is_some());

        let state = flatten_table(&table, "p1");
        assert!(state.lookup(&AttributePath::new("storage_policy")).is_none());
        assert_eq!(expand_table(&state).unwrap().storage_policy, None);
    }

    #[test]
    fn round_trips_minimal_config_with_defaults() {
        let minimal = json!({
            "project_id": "p1",
            "name": "events",
            "type": "detail",
            "version": 0,
            "partitioning_granularity": "day",
            "time_resolution": "millisecond",
            "availability": "available"
        });
        let table = expand_table(&config(minimal.clone())).unwrap();
        let state = flatten_table(&table, "p1");

        assert_eq!(configurable(&state), Dynamic::from(minimal));
        assert_eq!(expand_table(&state).unwrap(), table);
    }

    #[test]
    fn unset_attributes_take_schema_defaults() {
        let table = expand_table(&config(json!({"name": "t", "type": "detail"}))).unwrap();

        assert_eq!(table.version, DEFAULT_VERSION);
        assert_eq!(table.partitioning_granularity, "day");
        assert_eq!(table.time_resolution, "millisecond");
        assert_eq!(table.availability, "available");
        assert_eq!(table.description, None);
        assert_eq!(table.clustering_columns, None);
        assert_eq!(table.schema_mode, None);
    }

    #[test]
    fn empty_blocks_are_omitted_from_payload() {
        for storage_policy in [json!(null), json!([]), json!([{}]), json!([{"cached": [], "retain": null}])] {
            let table = expand_table(&config(json!({
                "name": "t",
                "type": "detail",
                "storage_policy": storage_policy,
                "query_granularity": {},
                "clustering_columns": []
            })))
            .unwrap();

            let payload = serde_json::to_value(&table).unwrap();
            let keys = payload.as_object().unwrap();
            assert!(!keys.contains_key("storagePolicy"), "{payload}");
            assert!(!keys.contains_key("queryGranularity"));
            assert!(!keys.contains_key("clusteringColumns"));
        }
    }

    #[test]
    fn query_granularity_without_type_is_kept_empty() {
        let table = expand_table(&config(json!({
            "name": "t",
            "type": "detail",
            "query_granularity": {"other": "x"}
        })))
        .unwrap();

        assert_eq!(table.query_granularity.unwrap().granularity_type, "");
    }

    #[test]
    fn schema_columns_require_name_type_and_data_type() {
        let err = expand_table(&config(json!({
            "name": "t",
            "type": "detail",
            "schema": [
                {"name": "a", "type": "dimension", "data_type": "string"},
                {"name": "b", "type": "dimension"}
            ]
        })))
        .unwrap_err();

        assert_eq!(
            err.attribute(),
            AttributePath::new("schema").index(1).attribute("data_type")
        );
    }

    #[test]
    fn flattens_server_fields() {
        let table: Table = serde_json::from_value(json!({
            "id": "t-1",
            "name": "events",
            "type": "detail",
            "createdByUser": {"username": "ada", "userId": "u-1"},
            "createdOnTimestamp": "2024-05-01T00:00:00Z",
            "totalRows": 1200,
            "segmentTotalBytes": 4096,
            "queryableSchema": [{"name": "__time", "type": "timestamp", "dataType": "timestamp"}]
        }))
        .unwrap();

        let state = flatten_table(&table, "p1");
        let value = serde_json::Value::from(&state.value);

        assert_eq!(value["id"], "t-1");
        assert_eq!(value["project_id"], "p1");
        assert_eq!(value["created_by_user"], json!({"username": "ada", "user_id": "u-1"}));
        assert_eq!(value["modified_by_user"], json!(null));
        assert_eq!(value["total_rows"], json!(1200.0));
        assert_eq!(value["queryable_schema"], json!([{"name": "__time"}]));
        assert_eq!(value["storage_policy"], json!(null));
    }
}
