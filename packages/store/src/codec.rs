//! Schema-version tagging, migrations, and typed (de)serialization.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use shoebox_filesystem::BoxError;

/// Reserved top-level field carrying the integer schema-version tag.
///
/// The name is namespaced with double underscores so it cannot collide with
/// a schema field; it is stripped before validation and never reaches the
/// typed item.
pub const SCHEMA_VERSION_KEY: &str = "__schema_version__";

/// An untyped structured document: the top-level JSON object of one record.
pub type Document = serde_json::Map<String, Value>;

/// A pure transform from one schema version's document shape to the next.
///
/// Migration `i` consumes a version-`i` document and produces a version-
/// `i + 1` document. The chain is ordered: a reader's chain must be a
/// superset, in order, of every chain ever used to write a record still on
/// storage.
pub type Migration = Box<dyn Fn(Document) -> Document + Send + Sync>;

/// Schema-aware parse/encode pipeline for one item type.
///
/// Injected into the filesystem adapter so the adapter stays schema-agnostic
/// while the store owns what a document means.
pub(crate) struct ItemCodec<T> {
    migrations: Vec<Migration>,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T> ItemCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(migrations: Vec<Migration>) -> Self {
        Self {
            migrations,
            _marker: PhantomData,
        }
    }

    /// The tag stamped on freshly encoded documents: the current chain
    /// length, regardless of what version an item logically originated from.
    pub(crate) fn write_version(&self) -> u64 {
        self.migrations.len() as u64
    }

    /// Decode raw text into a typed item.
    ///
    /// Parses the text as a JSON object, extracts the version tag (absent
    /// tag means version 0), applies every migration from the tag onward,
    /// and validates the final document against the schema type. A document
    /// tagged beyond the chain length applies no migrations: records written
    /// by a newer chain are read as-is.
    pub(crate) fn parse(&self, text: &str) -> Result<T, BoxError> {
        let value: Value = serde_json::from_str(text)?;

        let Value::Object(mut document) = value else {
            return Err("document root must be a JSON object".into());
        };

        let version = match document.remove(SCHEMA_VERSION_KEY) {
            None => 0,
            Some(tag) => tag
                .as_u64()
                .ok_or("schema version tag must be a non-negative integer")?
                as usize,
        };

        let already_applied = version.min(self.migrations.len());
        for migration in &self.migrations[already_applied..] {
            document = migration(document);
        }

        serde_json::from_value(Value::Object(document))
            .map_err(|error| format!("item failed schema validation: {error}").into())
    }

    /// Encode a typed item into the text that reaches storage.
    ///
    /// # Panics
    ///
    /// Panics if the item does not serialize to a JSON object; store items
    /// must be object-shaped so the version tag has somewhere to live.
    pub(crate) fn encode(&self, item: &T) -> Result<String, BoxError> {
        let mut document = serialize_document(item)?;
        document.insert(
            SCHEMA_VERSION_KEY.to_string(),
            Value::from(self.write_version()),
        );

        serde_json::to_string(&Value::Object(document)).map_err(Into::into)
    }

    /// Derive an item's key from the value of `field`.
    ///
    /// Non-string values are stringified, so a numeric primary key `101`
    /// becomes the key `"101"`.
    ///
    /// # Panics
    ///
    /// Panics if the item cannot be serialized, if `field` is absent from
    /// the serialized item, or if the field's value is not a string, number,
    /// or boolean. These are contract violations, not storage failures, and
    /// are never suppressed.
    pub(crate) fn primary_key_of(&self, item: &T, field: &str) -> String {
        let document = match serialize_document(item) {
            Ok(document) => document,
            Err(error) => panic!("unable to serialize item while deriving its key: {error}"),
        };

        let value = document
            .get(field)
            .unwrap_or_else(|| panic!("primary key field `{field}` is missing from the item"));

        match value {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => panic!("primary key field `{field}` must be a string, number, or boolean"),
        }
    }
}

fn serialize_document<T: Serialize>(item: &T) -> Result<Document, BoxError> {
    match serde_json::to_value(item) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => panic!("store items must serialize to JSON objects"),
        Err(error) => Err(error.into()),
    }
}
