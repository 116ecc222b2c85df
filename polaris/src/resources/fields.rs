//! Typed access to resource configuration and builders for resource state
//!
//! Expansion reads through `Fields`, which remembers where in the object it is
//! so that every failure carries the full attribute path. Flattening builds
//! `Dynamic` values with the free functions below.

use std::collections::HashMap;
use tfplug::types::{AttributePath, Dynamic, DynamicValue};
use tfplug::TfplugError;

use super::MappingError;

/// A view of one object inside a configuration value
#[derive(Clone)]
pub(crate) struct Fields<'a> {
    root: &'a DynamicValue,
    base: AttributePath,
}

impl<'a> Fields<'a> {
    pub fn new(root: &'a DynamicValue) -> Self {
        Self {
            root,
            base: AttributePath::root(),
        }
    }

    pub fn path(&self, name: &str) -> AttributePath {
        self.base.clone().attribute(name)
    }

    /// Whether `name` holds anything; empty lists and maps count as unset
    pub fn is_set(&self, name: &str) -> bool {
        match self.root.lookup(&self.path(name)) {
            None => false,
            Some(Dynamic::List(items)) => !items.is_empty(),
            Some(Dynamic::Map(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    pub fn optional_string(&self, name: &str) -> Result<Option<String>, MappingError> {
        let path = self.path(name);
        self.root
            .get_optional_string(&path)
            .map_err(|source| MappingError::InvalidValue { path, source })
    }

    /// Like `optional_string`, with empty strings read as unset
    pub fn non_empty_string(&self, name: &str) -> Result<Option<String>, MappingError> {
        Ok(self.optional_string(name)?.filter(|s| !s.is_empty()))
    }

    pub fn string(&self, name: &str) -> Result<String, MappingError> {
        self.optional_string(name)?
            .ok_or_else(|| MappingError::Missing(self.path(name)))
    }

    pub fn string_or(&self, name: &str, default: &str) -> Result<String, MappingError> {
        Ok(self
            .non_empty_string(name)?
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, MappingError> {
        let path = self.path(name);
        match self.root.lookup(&path) {
            None => Ok(default),
            Some(value) => value.as_bool().ok_or_else(|| mismatch(path, "bool", value)),
        }
    }

    pub fn integer_or(&self, name: &str, default: i64) -> Result<i64, MappingError> {
        let path = self.path(name);
        match self.root.lookup(&path) {
            None => Ok(default),
            Some(value) => match value.as_number() {
                Some(n) if n.fract() == 0.0 => Ok(n as i64),
                _ => Err(mismatch(path, "integer", value)),
            },
        }
    }

    /// List of strings; absent and empty lists are `None`
    pub fn string_list(&self, name: &str) -> Result<Option<Vec<String>>, MappingError> {
        let path = self.path(name);
        let Some(value) = self.root.lookup(&path) else {
            return Ok(None);
        };
        let items = value
            .as_list()
            .ok_or_else(|| mismatch(path.clone(), "list", value))?;

        let strings = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| mismatch(path.clone().index(i as i64), "string", item))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(if strings.is_empty() {
            None
        } else {
            Some(strings)
        })
    }

    /// Map of strings; absent and empty maps are `None`
    pub fn string_map(&self, name: &str) -> Result<Option<HashMap<String, String>>, MappingError> {
        let path = self.path(name);
        let Some(value) = self.root.lookup(&path) else {
            return Ok(None);
        };
        let map = value
            .as_map()
            .ok_or_else(|| mismatch(path.clone(), "map", value))?;

        let mut strings = HashMap::with_capacity(map.len());
        for (key, item) in map {
            match item {
                Dynamic::Null => {}
                Dynamic::String(s) => {
                    strings.insert(key.clone(), s.clone());
                }
                other => return Err(mismatch(path.clone().key(key), "string", other)),
            }
        }

        Ok(if strings.is_empty() {
            None
        } else {
            Some(strings)
        })
    }

    /// Elements of a nested block list, skipping null elements
    pub fn blocks(&self, name: &str) -> Result<Vec<Fields<'a>>, MappingError> {
        let path = self.path(name);
        let Some(value) = self.root.lookup(&path) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_list()
            .ok_or_else(|| mismatch(path.clone(), "list", value))?;

        Ok(items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(i, _)| Fields {
                root: self.root,
                base: path.clone().index(i as i64),
            })
            .collect())
    }

    /// First element of a block limited to one item
    pub fn single_block(&self, name: &str) -> Result<Option<Fields<'a>>, MappingError> {
        Ok(self.blocks(name)?.into_iter().next())
    }
}

fn mismatch(path: AttributePath, expected: &str, actual: &Dynamic) -> MappingError {
    MappingError::InvalidValue {
        source: TfplugError::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
        },
        path,
    }
}

pub(crate) fn object<const N: usize>(entries: [(&str, Dynamic); N]) -> Dynamic {
    Dynamic::Map(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

/// Nested block limited to one item: a one-element list, or null when absent
pub(crate) fn single_block(item: Option<Dynamic>) -> Dynamic {
    match item {
        Some(item) => Dynamic::List(vec![item]),
        None => Dynamic::Null,
    }
}

/// List of strings; empty lists are null
pub(crate) fn string_list(values: &[String]) -> Dynamic {
    if values.is_empty() {
        Dynamic::Null
    } else {
        Dynamic::List(values.iter().map(|v| Dynamic::from(v.as_str())).collect())
    }
}

/// Optional bool where the API uses `false` for unset
pub(crate) fn flag(value: bool) -> Dynamic {
    if value {
        Dynamic::Bool(true)
    } else {
        Dynamic::Null
    }
}

/// String attribute where the API uses "" for unset
pub(crate) fn non_empty(value: &str) -> Dynamic {
    if value.is_empty() {
        Dynamic::Null
    } else {
        Dynamic::from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DynamicValue {
        let json = br#"{
            "name": "events",
            "empty": "",
            "flag": true,
            "version": 3,
            "ratio": 1.5,
            "columns": ["a", "b"],
            "bad_columns": ["a", 1],
            "labels": {"type": "hour", "skip": null},
            "schema": [{"name": "ts"}, null, {"name": "id"}]
        }"#;
        DynamicValue::decode_json(json).unwrap()
    }

    #[test]
    fn strings_distinguish_missing_empty_and_wrong_type() {
        let config = config();
        let fields = Fields::new(&config);

        assert_eq!(fields.string("name").unwrap(), "events");
        assert_eq!(fields.optional_string("empty").unwrap().as_deref(), Some(""));
        assert_eq!(fields.non_empty_string("empty").unwrap(), None);
        assert_eq!(fields.string_or("empty", "day").unwrap(), "day");
        assert!(matches!(
            fields.string("absent"),
            Err(MappingError::Missing(_))
        ));
        assert!(matches!(
            fields.string("flag"),
            Err(MappingError::InvalidValue { .. })
        ));
    }

    #[test]
    fn numbers_must_be_whole() {
        let config = config();
        let fields = Fields::new(&config);

        assert_eq!(fields.integer_or("version", 0).unwrap(), 3);
        assert_eq!(fields.integer_or("absent", 7).unwrap(), 7);
        assert!(fields.integer_or("ratio", 0).is_err());
        assert!(fields.bool_or("flag", false).unwrap());
        assert!(!fields.bool_or("absent", false).unwrap());
    }

    #[test]
    fn collections_read_empty_as_absent() {
        let config = config();
        let fields = Fields::new(&config);

        assert_eq!(
            fields.string_list("columns").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        let err = fields.string_list("bad_columns").unwrap_err();
        assert_eq!(err.attribute().to_string(), "bad_columns[1]");

        let labels = fields.string_map("labels").unwrap().unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels["type"], "hour");
        assert_eq!(fields.string_map("absent").unwrap(), None);
    }

    #[test]
    fn blocks_carry_their_path() {
        let config = config();
        let fields = Fields::new(&config);

        let blocks = fields.blocks("schema").unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].string("name").unwrap(), "id");
        assert_eq!(blocks[1].path("name").to_string(), "schema[2].name");

        let err = blocks[0].string("type").unwrap_err();
        assert_eq!(err.attribute().to_string(), "schema[0].type");

        assert!(fields.single_block("absent").unwrap().is_none());
        assert!(fields.is_set("schema"));
        assert!(!fields.is_set("absent"));
    }

    #[test]
    fn builders_use_null_for_absence() {
        assert_eq!(single_block(None), Dynamic::Null);
        assert_eq!(string_list(&[]), Dynamic::Null);
        assert_eq!(non_empty(""), Dynamic::Null);
        assert_eq!(
            object([("type", Dynamic::from("hour"))]).as_map().unwrap()["type"],
            Dynamic::from("hour")
        );
    }
}
