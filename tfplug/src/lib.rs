//! tfplug - Terraform Plugin Framework for Rust
//!
//! The typed contract a provider implements: values, diagnostics, schemas and
//! the async provider/resource traits the plugin host drives.

pub mod context;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod types;

pub use context::Context;
pub use error::{Result, TfplugError};
pub use logging::LogLevel;
pub use provider::{Provider, ResourceFactory};
pub use resource::{Resource, ResourceWithConfigure};
pub use schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, Schema, SchemaBuilder};
pub use types::{AttributePath, Diagnostic, DiagnosticSeverity, Dynamic, DynamicValue};
