//! `polaris_connection` resource

pub mod mapping;
mod resource_connection;

pub use resource_connection::ConnectionResource;

use tfplug::schema::{
    Attribute, AttributeBuilder, AttributeType, NestedBlockBuilder, Schema, SchemaBuilder,
};

fn optional_string(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .build()
}

pub(crate) fn connection_schema() -> Schema {
    SchemaBuilder::new()
        .version(0)
        .description("Manages a data source connection in a Polaris project")
        .attribute(
            AttributeBuilder::new("project_id", AttributeType::String)
                .description("Project the connection belongs to")
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .description("Same as name")
                .computed()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("name", AttributeType::String)
                .description("Connection name, unique within the project")
                .required()
                .build(),
        )
        .attribute(
            AttributeBuilder::new("type", AttributeType::String)
                .description("One of confluent, kafka, kinesis or s3")
                .required()
                .build(),
        )
        .attribute(optional_string("description", ""))
        .attribute(optional_string(
            "bootstrap_servers",
            "Comma-separated broker list (confluent, kafka)",
        ))
        .attribute(optional_string("client_rack", "Rack ID of the consumer (kafka)"))
        .attribute(optional_string("topic_name", "Topic to read (confluent, kafka)"))
        .attribute(
            AttributeBuilder::new("topic_name_is_pattern", AttributeType::Bool)
                .description("Treat topic_name as a regular expression (confluent, kafka)")
                .optional()
                .build(),
        )
        .attribute(optional_string(
            "aws_assumed_role_arn",
            "Role Polaris assumes to read the source (kinesis, s3)",
        ))
        .attribute(optional_string("aws_endpoint", "AWS service endpoint (kinesis, s3)"))
        .attribute(optional_string("stream", "Kinesis stream name (kinesis)"))
        .attribute(optional_string("bucket", "Bucket name (s3)"))
        .attribute(optional_string("prefix", "Object key prefix (s3)"))
        .block(
            NestedBlockBuilder::new("ssl")
                .description("TLS settings (kafka)")
                .max_items(1)
                .block(
                    NestedBlockBuilder::new("truststore")
                        .max_items(1)
                        .attribute(
                            AttributeBuilder::new("type", AttributeType::String)
                                .required()
                                .build(),
                        )
                        .build(),
                )
                .build(),
        )
        .block(
            NestedBlockBuilder::new("secrets")
                .description("Credentials (confluent, kafka, s3)")
                .max_items(1)
                .attribute(
                    AttributeBuilder::new("type", AttributeType::String)
                        .required()
                        .build(),
                )
                .attribute(optional_string("username", ""))
                .attribute(
                    AttributeBuilder::new("password", AttributeType::String)
                        .optional()
                        .sensitive()
                        .build(),
                )
                .build(),
        )
        .build()
}
