//! Schema types and builders for tfplug
//!
//! Providers and resources describe their configuration surface with these
//! types. A schema also knows enough to check a decoded config against itself
//! (required attributes, nested block cardinality) before any mapping runs.

use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::collections::HashMap;

/// AttributeType defines the type system for Terraform attributes
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

/// Schema is returned by providers and resources.
/// Version is used for state migration.
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

/// Block represents a configuration block
#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub block_types: Vec<NestedBlock>,
    pub description: String,
    pub description_kind: StringKind,
    pub deprecated: bool,
}

/// Attribute represents a single configuration attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Value planned when the attribute is absent from config.
    /// Only meaningful for optional attributes.
    pub default: Option<Dynamic>,
    pub deprecated: bool,
}

/// NestedBlock represents a nested configuration block
#[derive(Debug, Clone)]
pub struct NestedBlock {
    pub type_name: String,
    pub block: Block,
    pub nesting: NestingMode,
    pub min_items: i64,
    /// 0 means unbounded
    pub max_items: i64,
}

/// NestingMode defines how nested blocks are structured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NestingMode {
    Single,
    List,
    Set,
    Map,
    Group,
}

/// StringKind represents the format of string values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StringKind {
    Plain,
    Markdown,
}

impl Block {
    fn empty() -> Self {
        Self {
            version: 0,
            attributes: Vec::new(),
            block_types: Vec::new(),
            description: String::new(),
            description_kind: StringKind::Plain,
            deprecated: false,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn nested_block(&self, name: &str) -> Option<&NestedBlock> {
        self.block_types.iter().find(|b| b.type_name == name)
    }

    /// Checks `config` at `base` against this block: required attributes must be
    /// set, computed-only attributes must not be, and list blocks must respect
    /// their item bounds. Recurses into every present nested block element.
    pub fn check_config(&self, config: &DynamicValue, base: &AttributePath) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for attr in &self.attributes {
            let path = child(base, &attr.name);
            let present = config.lookup(&path).is_some();
            if attr.required && !present {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("The argument \"{}\" is required, but no definition was found.", attr.name),
                    )
                    .with_attribute(path),
                );
            } else if attr.computed && !attr.optional && !attr.required && present {
                diagnostics.push(
                    Diagnostic::error(
                        "Value for unconfigurable attribute",
                        format!("Can't configure a value for \"{}\": its value will be decided automatically.", attr.name),
                    )
                    .with_attribute(path),
                );
            }
        }

        for nested in &self.block_types {
            let path = child(base, &nested.type_name);
            let items = config
                .lookup(&path)
                .and_then(Dynamic::as_list)
                .map_or(0, <[Dynamic]>::len) as i64;

            if items < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(
                        "Insufficient blocks",
                        format!(
                            "At least {} \"{}\" blocks are required.",
                            nested.min_items, nested.type_name
                        ),
                    )
                    .with_attribute(path.clone()),
                );
            }
            if nested.max_items > 0 && items > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(
                        "Too many blocks",
                        format!(
                            "No more than {} \"{}\" blocks are allowed.",
                            nested.max_items, nested.type_name
                        ),
                    )
                    .with_attribute(path.clone()),
                );
            }

            for idx in 0..items {
                diagnostics.extend(nested.block.check_config(config, &path.clone().index(idx)));
            }
        }

        diagnostics
    }
}

fn child(base: &AttributePath, name: &str) -> AttributePath {
    if base.steps.is_empty() {
        AttributePath::new(name)
    } else {
        base.clone().attribute(name)
    }
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attribute(name)
    }

    /// Default declared for a top-level attribute
    pub fn default_for(&self, name: &str) -> Option<&Dynamic> {
        self.attribute(name).and_then(|a| a.default.as_ref())
    }

    pub fn check_config(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        self.block.check_config(config, &AttributePath::root())
    }
}

/// AttributeBuilder provides fluent API for building attributes
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                default: None,
                deprecated: false,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Mark as sensitive (hidden in plan output)
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    /// Attributes with a default are optional and computed
    pub fn default(mut self, value: impl Into<Dynamic>) -> Self {
        self.attribute.default = Some(value.into());
        self.attribute.optional = true;
        self.attribute.required = false;
        self.attribute.computed = true;
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// NestedBlockBuilder builds list-style nested blocks
pub struct NestedBlockBuilder {
    nested: NestedBlock,
}

impl NestedBlockBuilder {
    pub fn new(type_name: &str) -> Self {
        Self {
            nested: NestedBlock {
                type_name: type_name.to_string(),
                block: Block::empty(),
                nesting: NestingMode::List,
                min_items: 0,
                max_items: 0,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.nested.block.description = desc.to_string();
        self
    }

    pub fn nesting(mut self, mode: NestingMode) -> Self {
        self.nested.nesting = mode;
        self
    }

    pub fn min_items(mut self, min: i64) -> Self {
        self.nested.min_items = min;
        self
    }

    pub fn max_items(mut self, max: i64) -> Self {
        self.nested.max_items = max;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.nested.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.nested.block.block_types.push(block);
        self
    }

    pub fn build(self) -> NestedBlock {
        self.nested
    }
}

/// SchemaBuilder provides fluent API for building schemas
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block::empty(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn block(mut self, block: NestedBlock) -> Self {
        self.schema.block.block_types.push(block);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn description_kind(mut self, kind: StringKind) -> Self {
        self.schema.block.description_kind = kind;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        SchemaBuilder::new()
            .description("sample")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("granularity", AttributeType::String)
                    .default("day")
                    .build(),
            )
            .block(
                NestedBlockBuilder::new("policy")
                    .max_items(1)
                    .attribute(
                        AttributeBuilder::new("type", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .build(),
            )
            .build()
    }

    #[test]
    fn attribute_builder_creates_required_string() {
        let attr = AttributeBuilder::new("name", AttributeType::String)
            .description("The name of the resource")
            .required()
            .build();

        assert_eq!(attr.name, "name");
        assert!(matches!(attr.r#type, AttributeType::String));
        assert!(attr.required);
        assert!(!attr.optional);
        assert_eq!(attr.description, "The name of the resource");
    }

    #[test]
    fn default_makes_attribute_optional_and_computed() {
        let schema = sample_schema();
        let attr = schema.attribute("granularity").unwrap();

        assert!(attr.optional && attr.computed && !attr.required);
        assert_eq!(
            schema.default_for("granularity"),
            Some(&Dynamic::String("day".to_string()))
        );
        assert!(schema.default_for("name").is_none());
    }

    #[test]
    fn check_config_accepts_valid_config() {
        let config =
            DynamicValue::decode_json(br#"{"name": "t", "policy": [{"type": "a"}]}"#).unwrap();
        assert!(sample_schema().check_config(&config).is_empty());
    }

    #[test]
    fn check_config_reports_missing_required() {
        let config = DynamicValue::decode_json(br#"{"policy": [{}]}"#).unwrap();
        let diags = sample_schema().check_config(&config);

        let paths: Vec<String> = diags
            .iter()
            .filter_map(|d| d.attribute.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(paths, vec!["name", "policy[0].type"]);
    }

    #[test]
    fn check_config_enforces_max_items_and_computed() {
        let config = DynamicValue::decode_json(
            br#"{"name": "t", "id": "x", "policy": [{"type": "a"}, {"type": "b"}]}"#,
        )
        .unwrap();
        let diags = sample_schema().check_config(&config);

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].summary, "Value for unconfigurable attribute");
        assert_eq!(diags[1].summary, "Too many blocks");
    }
}
