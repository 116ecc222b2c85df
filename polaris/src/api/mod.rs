//! Polaris REST API client and wire models

pub mod client;
pub mod common;
pub mod connections;
pub mod error;
pub mod jobs;
pub mod tables;

pub use client::{AuthScheme, Client};
pub use common::{ErrorResponse, ProjectResource};
pub use connections::{
    ConfluentConnection, Connection, ConnectionSpec, KafkaConnection, KinesisConnection,
    S3Connection, Secrets, Ssl, Truststore,
};
pub use error::ApiError;
pub use tables::{
    QueryGranularity, QueryableColumn, SchemaColumn, StoragePolicy, StoragePolicyDetail, Table,
    User,
};
