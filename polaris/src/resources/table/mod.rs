//! `polaris_table` resource

pub mod mapping;
mod resource_table;

pub use resource_table::TableResource;

use std::collections::HashMap;
use tfplug::schema::{
    AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, Schema, SchemaBuilder,
};

pub const DEFAULT_VERSION: i64 = 0;
pub const DEFAULT_PARTITIONING_GRANULARITY: &str = "day";
pub const DEFAULT_TIME_RESOLUTION: &str = "millisecond";
pub const DEFAULT_AVAILABILITY: &str = "available";

fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

fn string_map() -> AttributeType {
    AttributeType::Map(Box::new(AttributeType::String))
}

fn storage_policy_detail(name: &str, description: &str) -> NestedBlock {
    NestedBlockBuilder::new(name)
        .description(description)
        .max_items(1)
        .attribute(
            AttributeBuilder::new("type", AttributeType::String)
                .description("Policy type, e.g. periodRetention")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("intervals", string_list())
                .description("ISO 8601 periods or intervals the policy covers")
                .optional()
                .build(),
        )
        .build()
}

pub(crate) fn table_schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("Manages a table in a Polaris project")
        .attribute(
            AttributeBuilder::new("project_id", AttributeType::String)
                .description("Project the table belongs to")
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .description("Server-assigned table ID")
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("name", AttributeType::String)
                .description("Table name, unique within the project")
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("type", AttributeType::String)
                .description("Table type, e.g. detail or aggregate")
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("description", AttributeType::String)
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("version", AttributeType::Number)
                .default(DEFAULT_VERSION)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("clustering_columns", string_list())
                .description("Secondary partitioning columns, in order")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("partitioning_granularity", AttributeType::String)
                .default(DEFAULT_PARTITIONING_GRANULARITY)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("query_granularity", string_map())
                .description("Rollup granularity; the only key is `type`")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("schema_mode", AttributeType::String)
                .description("strict or flexible")
                .optional()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("time_resolution", AttributeType::String)
                .default(DEFAULT_TIME_RESOLUTION)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("availability", AttributeType::String)
                .default(DEFAULT_AVAILABILITY)
                .build(),
        )
        .attribute(
            AttributeBuilder::new("created_by_user", string_map())
                .description("username and user_id of the creator")
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("created_on_timestamp", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("modified_by_user", string_map())
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("modified_on_timestamp", AttributeType::String)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("segment_compacted_bytes", AttributeType::Number)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("segment_total_bytes", AttributeType::Number)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("total_data_size_bytes", AttributeType::Number)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("total_rows", AttributeType::Number)
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new(
                "queryable_schema",
                AttributeType::List(Box::new(AttributeType::Object(HashMap::from([(
                    "name".to_string(),
                    AttributeType::String,
                )])))),
            )
            .description("Column names the table can be queried by")
            .computed()
            .build(),
        )
        .block(
            NestedBlockBuilder::new("schema")
                .description("Declared columns, in order")
                .attribute(
                    AttributeBuilder::new("name", AttributeType::String)
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("type", AttributeType::String)
                        .description("Column kind, e.g. dimension or measure")
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("data_type", AttributeType::String)
                        .required()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("primary_key", AttributeType::Bool)
                        .optional()
                        .build(),
                )
                .build(),
        )
        .block(
            NestedBlockBuilder::new("storage_policy")
                .max_items(1)
                .block(storage_policy_detail(
                    "cached",
                    "Data kept on query nodes",
                ))
                .block(storage_policy_detail("retain", "Data kept at all"))
                .build(),
        )
        .build()
}
