//! Processor descriptors and the input/output shapes they exchange with the
//! engine.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::error::ProcessError;
use crate::media::{injected, Category, Fields, MediaType, RecordId, Value};

use super::context::ProcessingContext;

pub type Handler = fn(&ProcessingContext, &Input<'_>) -> Result<Output, ProcessError>;

/// A named processing step with its declared inputs.
#[derive(Clone, Copy)]
pub struct ProcessorDef {
    pub name: &'static str,
    pub params: &'static [&'static str],
    /// Receives the entire working set instead of `params`.
    pub accepts_all: bool,
    pub handler: Handler,
}

impl ProcessorDef {
    pub const fn new(name: &'static str, params: &'static [&'static str], handler: Handler) -> Self {
        Self {
            name,
            params,
            accepts_all: false,
            handler,
        }
    }

    pub const fn catch_all(name: &'static str, handler: Handler) -> Self {
        Self {
            name,
            params: &[],
            accepts_all: true,
            handler,
        }
    }
}

impl std::fmt::Debug for ProcessorDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("accepts_all", &self.accepts_all)
            .finish()
    }
}

/// What a processor hands back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Nothing to contribute.
    Skip,
    Pair(String, Value),
    /// Ordered updates; a later duplicate key wins.
    Pairs(Vec<(String, Value)>),
    Map(Fields),
}

impl Output {
    pub fn pair(key: &str, value: impl Into<Value>) -> Self {
        Output::Pair(key.to_string(), value.into())
    }

    pub fn pairs<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<Value>,
    {
        Output::Pairs(
            items
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }

    pub fn into_fields(self) -> Fields {
        match self {
            Output::Skip => Fields::new(),
            Output::Pair(k, v) => Fields::from([(k, v)]),
            Output::Pairs(items) => items.into_iter().collect(),
            Output::Map(fields) => fields,
        }
    }
}

static NULL: Value = Value::Null;

/// Read-only view of the fields a processor asked for.
///
/// Typed accessors treat `Null` as absent and reject values of the wrong
/// kind with [`ProcessError::InvalidInput`].
pub struct Input<'a> {
    values: BTreeMap<&'a str, &'a Value>,
}

impl<'a> Input<'a> {
    pub fn new(values: BTreeMap<&'a str, &'a Value>) -> Self {
        Self { values }
    }

    pub fn from_fields(fields: &'a Fields) -> Self {
        Self {
            values: fields.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> &'a Value {
        self.values.get(name).copied().unwrap_or(&NULL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn record_id(&self) -> Result<RecordId, ProcessError> {
        self.required_i64(injected::RECORD_ID)
    }

    pub fn optional_i64(&self, name: &'static str) -> Result<Option<i64>, ProcessError> {
        match self.get(name) {
            Value::Null => Ok(None),
            Value::Int(i) => Ok(Some(*i)),
            _ => Err(invalid(name, "integer")),
        }
    }

    pub fn required_i64(&self, name: &'static str) -> Result<i64, ProcessError> {
        self.optional_i64(name)?.ok_or(invalid(name, "integer"))
    }

    pub fn optional_str(&self, name: &'static str) -> Result<Option<&'a str>, ProcessError> {
        match self.get(name) {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.as_str())),
            _ => Err(invalid(name, "text")),
        }
    }

    pub fn optional_path(&self, name: &'static str) -> Result<Option<&'a Path>, ProcessError> {
        match self.get(name) {
            Value::Null => Ok(None),
            Value::File(p) => Ok(Some(p.as_path())),
            _ => Err(invalid(name, "file")),
        }
    }

    pub fn required_path(&self, name: &'static str) -> Result<&'a Path, ProcessError> {
        self.optional_path(name)?.ok_or(invalid(name, "file"))
    }

    pub fn optional_timestamp(
        &self,
        name: &'static str,
    ) -> Result<Option<DateTime<FixedOffset>>, ProcessError> {
        match self.get(name) {
            Value::Null => Ok(None),
            Value::Timestamp(ts) => Ok(Some(*ts)),
            _ => Err(invalid(name, "timestamp")),
        }
    }

    pub fn optional_duration(&self, name: &'static str) -> Result<Option<TimeDelta>, ProcessError> {
        match self.get(name) {
            Value::Null => Ok(None),
            Value::Duration(d) => Ok(Some(*d)),
            _ => Err(invalid(name, "duration")),
        }
    }

    pub fn media_type(&self, name: &'static str) -> Result<Option<MediaType>, ProcessError> {
        match self.optional_i64(name)? {
            None => Ok(None),
            Some(code) => MediaType::from_code(code)
                .map(Some)
                .ok_or(invalid(name, "media type code")),
        }
    }

    /// JSON object stored under `name`; `Null` reads as an empty object.
    pub fn json_object(
        &self,
        name: &'static str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ProcessError> {
        match self.get(name) {
            Value::Null => Ok(serde_json::Map::new()),
            Value::Json(serde_json::Value::Object(map)) => Ok(map.clone()),
            Value::Json(serde_json::Value::Null) => Ok(serde_json::Map::new()),
            _ => Err(invalid(name, "json object")),
        }
    }

    pub fn categories(&self, name: &'static str) -> Result<BTreeSet<Category>, ProcessError> {
        match self.get(name) {
            Value::Null => Ok(BTreeSet::new()),
            Value::Categories(c) => Ok(c.clone()),
            _ => Err(invalid(name, "categories")),
        }
    }
}

fn invalid(field: &'static str, expected: &'static str) -> ProcessError {
    ProcessError::InvalidInput { field, expected }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_pairs_last_duplicate_wins() {
        let output = Output::Pairs(vec![
            ("a".to_string(), Value::Int(1)),
            ("a".to_string(), Value::Int(2)),
        ]);
        let fields = output.into_fields();
        assert_eq!(fields.get("a"), Some(&Value::Int(2)));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_skip_is_empty() {
        assert!(Output::Skip.into_fields().is_empty());
    }

    #[test]
    fn test_input_missing_reads_as_null() {
        let fields = Fields::new();
        let input = Input::from_fields(&fields);
        assert!(input.get("nothing").is_null());
        assert_eq!(input.optional_i64("width").unwrap(), None);
        assert!(input.required_i64("width").is_err());
    }

    #[test]
    fn test_input_wrong_kind_is_rejected() {
        let fields = Fields::from([("width".to_string(), Value::Text("12".into()))]);
        let input = Input::from_fields(&fields);
        let err = input.optional_i64("width").unwrap_err();
        assert!(matches!(
            err,
            ProcessError::InvalidInput {
                field: "width",
                expected: "integer"
            }
        ));
    }

    #[test]
    fn test_json_object_defaults_to_empty() {
        let fields = Fields::from([("metadata".to_string(), Value::Null)]);
        let input = Input::from_fields(&fields);
        assert!(input.json_object("metadata").unwrap().is_empty());
    }
}
