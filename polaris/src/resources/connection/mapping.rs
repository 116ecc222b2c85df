//! Conversion between `polaris_connection` configuration and the API's
//! `Connection`
//!
//! Configuration is one flat object holding the attributes of every type; the
//! API model is a sum type with one payload per type. Expansion picks the
//! variant from `type` and reads only that variant's attributes.

use tfplug::types::{AttributePath, Dynamic, DynamicValue};

use crate::api::{
    ConfluentConnection, Connection, ConnectionSpec, KafkaConnection, KinesisConnection,
    S3Connection, Secrets, Ssl, Truststore,
};
use crate::resources::fields::{flag, non_empty, object, single_block, Fields};
use crate::resources::MappingError;

/// Attributes only some connection types use
pub const VARIANT_ATTRIBUTES: [&str; 11] = [
    "bootstrap_servers",
    "client_rack",
    "ssl",
    "topic_name",
    "topic_name_is_pattern",
    "secrets",
    "aws_assumed_role_arn",
    "aws_endpoint",
    "stream",
    "bucket",
    "prefix",
];

/// Attributes from `VARIANT_ATTRIBUTES` that `kind` sends to the API, or `None`
/// for an unknown type
pub fn attributes_for(kind: &str) -> Option<&'static [&'static str]> {
    match kind {
        "confluent" => Some(&[
            "bootstrap_servers",
            "topic_name",
            "topic_name_is_pattern",
            "secrets",
        ]),
        "kafka" => Some(&[
            "bootstrap_servers",
            "client_rack",
            "ssl",
            "topic_name",
            "topic_name_is_pattern",
            "secrets",
        ]),
        "kinesis" => Some(&["aws_assumed_role_arn", "aws_endpoint", "stream"]),
        "s3" => Some(&[
            "aws_assumed_role_arn",
            "aws_endpoint",
            "bucket",
            "prefix",
            "secrets",
        ]),
        _ => None,
    }
}

pub fn expand_connection(config: &DynamicValue) -> Result<Connection, MappingError> {
    let fields = Fields::new(config);
    let kind = fields.string("type")?;

    let spec = match kind.as_str() {
        "confluent" => ConnectionSpec::Confluent(ConfluentConnection {
            bootstrap_servers: required_for(&fields, &kind, "bootstrap_servers")?,
            topic_name: fields.non_empty_string("topic_name")?,
            topic_name_is_pattern: fields.bool_or("topic_name_is_pattern", false)?,
            secrets: expand_secrets(&fields)?,
        }),
        "kafka" => ConnectionSpec::Kafka(KafkaConnection {
            bootstrap_servers: required_for(&fields, &kind, "bootstrap_servers")?,
            client_rack: fields.non_empty_string("client_rack")?,
            ssl: expand_ssl(&fields)?,
            topic_name: fields.non_empty_string("topic_name")?,
            topic_name_is_pattern: fields.bool_or("topic_name_is_pattern", false)?,
            secrets: expand_secrets(&fields)?,
        }),
        "kinesis" => ConnectionSpec::Kinesis(KinesisConnection {
            aws_assumed_role_arn: required_for(&fields, &kind, "aws_assumed_role_arn")?,
            aws_endpoint: required_for(&fields, &kind, "aws_endpoint")?,
            stream: required_for(&fields, &kind, "stream")?,
        }),
        "s3" => ConnectionSpec::S3(S3Connection {
            aws_assumed_role_arn: required_for(&fields, &kind, "aws_assumed_role_arn")?,
            aws_endpoint: fields.non_empty_string("aws_endpoint")?,
            bucket: required_for(&fields, &kind, "bucket")?,
            prefix: fields.non_empty_string("prefix")?,
            secrets: expand_secrets(&fields)?,
        }),
        _ => return Err(MappingError::UnknownConnectionType(kind)),
    };

    Ok(Connection {
        name: fields.string("name")?,
        description: fields.optional_string("description")?.unwrap_or_default(),
        spec,
    })
}

fn required_for(
    fields: &Fields<'_>,
    kind: &str,
    attribute: &'static str,
) -> Result<String, MappingError> {
    fields
        .non_empty_string(attribute)?
        .ok_or_else(|| MappingError::MissingForType {
            kind: kind.to_string(),
            attribute,
        })
}

fn expand_secrets(fields: &Fields<'_>) -> Result<Option<Secrets>, MappingError> {
    let Some(secrets) = fields.single_block("secrets")? else {
        return Ok(None);
    };
    Ok(Some(Secrets {
        secret_type: secrets.string("type")?,
        username: secrets.non_empty_string("username")?,
        password: secrets.non_empty_string("password")?,
    }))
}

/// An `ssl` block without a truststore is omitted
fn expand_ssl(fields: &Fields<'_>) -> Result<Option<Ssl>, MappingError> {
    let Some(ssl) = fields.single_block("ssl")? else {
        return Ok(None);
    };
    Ok(expand_truststore(&ssl)?.map(|truststore| Ssl {
        truststore: Some(truststore),
    }))
}

fn expand_truststore(ssl: &Fields<'_>) -> Result<Option<Truststore>, MappingError> {
    let Some(truststore) = ssl.single_block("truststore")? else {
        return Ok(None);
    };
    Ok(Some(Truststore {
        truststore_type: truststore.string("type")?,
    }))
}

/// `secrets.password` from an earlier state or config; the API never returns it
pub fn prior_password(value: &DynamicValue) -> Option<String> {
    value
        .get_optional_string(
            &AttributePath::new("secrets")
                .index(0)
                .attribute("password"),
        )
        .ok()
        .flatten()
        .filter(|p| !p.is_empty())
}

/// Full resource state for `connection`. Attributes of other types are null.
pub fn flatten_connection(
    connection: &Connection,
    project_id: &str,
    prior_password: Option<&str>,
) -> DynamicValue {
    let mut state: std::collections::HashMap<String, Dynamic> = VARIANT_ATTRIBUTES
        .iter()
        .map(|name| (name.to_string(), Dynamic::Null))
        .collect();
    let mut set = |key: &str, value: Dynamic| {
        state.insert(key.to_string(), value);
    };

    set("project_id", Dynamic::from(project_id));
    set("id", Dynamic::from(connection.name.as_str()));
    set("name", Dynamic::from(connection.name.as_str()));
    set("type", Dynamic::from(connection.spec.type_name()));
    set("description", non_empty(&connection.description));

    match &connection.spec {
        ConnectionSpec::Confluent(c) => {
            set("bootstrap_servers", Dynamic::from(c.bootstrap_servers.as_str()));
            set("topic_name", Dynamic::from(c.topic_name.clone()));
            set("topic_name_is_pattern", flag(c.topic_name_is_pattern));
            set("secrets", flatten_secrets(c.secrets.as_ref(), prior_password));
        }
        ConnectionSpec::Kafka(k) => {
            set("bootstrap_servers", Dynamic::from(k.bootstrap_servers.as_str()));
            set("client_rack", Dynamic::from(k.client_rack.clone()));
            set("ssl", single_block(k.ssl.as_ref().and_then(flatten_ssl)));
            set("topic_name", Dynamic::from(k.topic_name.clone()));
            set("topic_name_is_pattern", flag(k.topic_name_is_pattern));
            set("secrets", flatten_secrets(k.secrets.as_ref(), prior_password));
        }
        ConnectionSpec::Kinesis(k) => {
            set(
                "aws_assumed_role_arn",
                Dynamic::from(k.aws_assumed_role_arn.as_str()),
            );
            set("aws_endpoint", Dynamic::from(k.aws_endpoint.as_str()));
            set("stream", Dynamic::from(k.stream.as_str()));
        }
        ConnectionSpec::S3(s) => {
            set(
                "aws_assumed_role_arn",
                Dynamic::from(s.aws_assumed_role_arn.as_str()),
            );
            set("aws_endpoint", Dynamic::from(s.aws_endpoint.clone()));
            set("bucket", Dynamic::from(s.bucket.as_str()));
            set("prefix", Dynamic::from(s.prefix.clone()));
            set("secrets", flatten_secrets(s.secrets.as_ref(), prior_password));
        }
    }

    DynamicValue::from_map(state)
}

fn flatten_secrets(secrets: Option<&Secrets>, prior_password: Option<&str>) -> Dynamic {
    single_block(secrets.map(|s| {
        let password = s.password.as_deref().or(prior_password);
        object([
            ("type", Dynamic::from(s.secret_type.as_str())),
            ("username", Dynamic::from(s.username.clone())),
            ("password", Dynamic::from(password)),
        ])
    }))
}

/// `None` for an `ssl` object without a truststore, matching expansion
fn flatten_ssl(ssl: &Ssl) -> Option<Dynamic> {
    ssl.truststore.as_ref().map(|t| {
        object([(
            "truststore",
            single_block(Some(object([(
                "type",
                Dynamic::from(t.truststore_type.as_str()),
            )]))),
        )])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> DynamicValue {
        DynamicValue::new(Dynamic::from(value))
    }

    /// Configurable attributes of a state, with nulls dropped
    fn configurable(state: &DynamicValue) -> Dynamic {
        let mut map = state.value.as_map().unwrap().clone();
        map.remove("id");
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

    fn assert_round_trip(input: serde_json::Value) {
        let expanded = expand_connection(&config(input.clone())).unwrap();
        let state = flatten_connection(&expanded, "p1", None);

        assert_eq!(configurable(&state), Dynamic::from(input));
        assert_eq!(expand_connection(&state).unwrap(), expanded);
    }

    #[test]
    fn round_trips_confluent() {
        assert_round_trip(json!({
            "project_id": "p1",
            "name": "cloud-events",
            "type": "confluent",
            "description": "Confluent Cloud",
            "bootstrap_servers": "pkc-1.confluent.cloud:9092",
            "topic_name": "events",
            "secrets": [{"type": "sasl_plain", "username": "key", "password": "secret"}]
        }));
    }

    #[test]
    fn round_trips_kafka_with_and_without_blocks() {
        assert_round_trip(json!({
            "project_id": "p1",
            "name": "events",
            "type": "kafka",
            "bootstrap_servers": "b1:9092,b2:9092",
            "client_rack": "use1-az1",
            "ssl": [{"truststore": [{"type": "pem"}]}],
            "topic_name": "events.*",
            "topic_name_is_pattern": true,
            "secrets": [{"type": "sasl_scram", "username": "u", "password": "p"}]
        }));
        assert_round_trip(json!({
            "project_id": "p1",
            "name": "events",
            "type": "kafka",
            "bootstrap_servers": "b1:9092"
        }));
    }

    #[test]
    fn unset_topic_pattern_flag_stays_null() {
        let expanded = expand_connection(&config(json!({
            "name": "events",
            "type": "kafka",
            "bootstrap_servers": "b1:9092"
        })))
        .unwrap();
        let state = flatten_connection(&expanded, "p1", None);

        assert!(state
            .lookup(&AttributePath::new("topic_name_is_pattern"))
            .is_none());
        assert_eq!(expand_connection(&state).unwrap(), expanded);
    }

    #[test]
    fn ssl_without_truststore_is_omitted() {
        for ssl in [json!([{"truststore": null}]), json!([{"truststore": []}]), json!([{}])] {
            let connection = expand_connection(&config(json!({
                "name": "e",
                "type": "kafka",
                "bootstrap_servers": "b:9092",
                "ssl": ssl
            })))
            .unwrap();

            let payload = serde_json::to_value(&connection).unwrap();
            assert!(!payload.as_object().unwrap().contains_key("ssl"), "{payload}");
        }
    }

    #[test]
    fn empty_ssl_from_server_flattens_to_null() {
        let connection: Connection = serde_json::from_value(json!({
            "name": "events",
            "type": "kafka",
            "bootstrapServers": "b1:9092",
            "ssl": {}
        }))
        .unwrap();

        let state = flatten_connection(&connection, "p1", None);
        assert!(state.lookup(&AttributePath::new("ssl")).is_none());
    }

    #[test]
    fn round_trips_kinesis() {
        assert_round_trip(json!({
            "project_id": "p1",
            "name": "clicks",
            "type": "kinesis",
            "aws_assumed_role_arn": "arn:aws:iam::123:role/polaris",
            "aws_endpoint": "kinesis.us-east-1.amazonaws.com",
            "stream": "clicks"
        }));
    }

    #[test]
    fn round_trips_s3_with_and_without_optional_fields() {
        assert_round_trip(json!({
            "project_id": "p1",
            "name": "archive",
            "type": "s3",
            "aws_assumed_role_arn": "arn:aws:iam::123:role/polaris",
            "aws_endpoint": "s3.us-east-1.amazonaws.com",
            "bucket": "archive",
            "prefix": "raw/",
            "secrets": [{"type": "access_key", "username": "AKIA", "password": "s"}]
        }));
        assert_round_trip(json!({
            "project_id": "p1",
            "name": "archive",
            "type": "s3",
            "aws_assumed_role_arn": "arn:aws:iam::123:role/polaris",
            "bucket": "archive"
        }));
    }

    #[test]
    fn kafka_payload_excludes_other_variants() {
        let connection = expand_connection(&config(json!({
            "name": "events",
            "type": "kafka",
            "bootstrap_servers": "b1:9092",
            "topic_name": "events.*",
            "topic_name_is_pattern": true,
            "stream": "ignored",
            "bucket": "ignored",
            "prefix": "ignored",
            "aws_assumed_role_arn": "ignored"
        })))
        .unwrap();

        let payload = serde_json::to_value(&connection).unwrap();
        let mut keys: Vec<&str> = payload
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "bootstrapServers",
                "description",
                "name",
                "topicName",
                "topicNameIsPattern",
                "type"
            ]
        );
    }

    #[test]
    fn kinesis_payload_excludes_stream_platform_fields() {
        let connection = expand_connection(&config(json!({
            "name": "clicks",
            "type": "kinesis",
            "aws_assumed_role_arn": "arn",
            "aws_endpoint": "endpoint",
            "stream": "clicks",
            "bootstrap_servers": "ignored",
            "topic_name": "ignored",
            "ssl": [{"truststore": [{"type": "pem"}]}]
        })))
        .unwrap();

        let payload = serde_json::to_value(&connection).unwrap();
        for key in ["bootstrapServers", "ssl", "topicName"] {
            assert!(payload.get(key).is_none(), "{key} leaked into {payload}");
        }
    }

    #[test]
    fn variant_requirements_are_enforced() {
        let err = expand_connection(&config(json!({
            "name": "clicks",
            "type": "kinesis",
            "aws_assumed_role_arn": "arn",
            "aws_endpoint": "endpoint"
        })))
        .unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingForType { attribute: "stream", .. }
        ));

        let err = expand_connection(&config(json!({"name": "x", "type": "pulsar"}))).unwrap_err();
        assert!(matches!(err, MappingError::UnknownConnectionType(t) if t == "pulsar"));
    }

    #[test]
    fn secrets_require_type() {
        let err = expand_connection(&config(json!({
            "name": "events",
            "type": "confluent",
            "bootstrap_servers": "b:9092",
            "secrets": [{"username": "u"}]
        })))
        .unwrap_err();

        assert_eq!(err.attribute().to_string(), "secrets[0].type");
    }

    #[test]
    fn flatten_keeps_password_from_prior_state() {
        let prior = config(json!({
            "secrets": [{"type": "sasl_plain", "username": "u", "password": "hunter2"}]
        }));
        let response: Connection = serde_json::from_value(json!({
            "name": "events",
            "type": "confluent",
            "bootstrapServers": "b:9092",
            "secrets": {"type": "sasl_plain", "username": "u"}
        }))
        .unwrap();

        let password = prior_password(&prior);
        let state = flatten_connection(&response, "p1", password.as_deref());

        assert_eq!(
            state
                .get_string(&AttributePath::new("secrets").index(0).attribute("password"))
                .unwrap(),
            "hunter2"
        );
        assert_eq!(
            state.get_string(&AttributePath::new("id")).unwrap(),
            "events"
        );
        assert!(state.lookup(&AttributePath::new("stream")).is_none());
    }

    #[test]
    fn every_variant_attribute_belongs_to_some_type() {
        for attribute in VARIANT_ATTRIBUTES {
            assert!(
                ConnectionSpec::TYPES
                    .iter()
                    .any(|kind| attributes_for(kind).unwrap().contains(&attribute)),
                "{attribute} is unused"
            );
        }
        assert!(attributes_for("pulsar").is_none());
    }
}
