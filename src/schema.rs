//! Field-schema driven encoding of request bodies.
//!
//! Most endpoints in this library build their JSON bodies directly with
//! typed builders, but the raw [`send`][crate::Discord::send] primitive
//! also accepts a dynamic mapping together with a field schema describing
//! how each field must be rendered. The schema tables themselves come from
//! the per-endpoint descriptor listings and are treated as authoritative:
//! the encoder neither infers nor validates field semantics.

use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::{Error, Result};

/// How a single field is rendered into the output document.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Quote the value as a JSON string.
    Str,
    /// Emit the value literally: numbers and booleans as themselves, string
    /// values spliced in as pre-encoded fragments without quoting.
    Bare,
    /// Recurse into the value with a nested schema.
    Object(Schema),
    /// Encode each element of a sequence under the given descriptor.
    Array(Box<FieldKind>),
}

impl FieldKind {
    /// Resolve a textual descriptor tag, as found in the per-endpoint
    /// schema tables.
    pub fn from_tag(tag: &str) -> Result<FieldKind> {
        Ok(match tag {
            "string" => FieldKind::Str,
            "bare" => FieldKind::Bare,
            "array string" => FieldKind::Array(Box::new(FieldKind::Str)),
            "array bare" => FieldKind::Array(Box::new(FieldKind::Bare)),
            other => return Err(Error::Schema("Unknown field descriptor", other.to_owned())),
        })
    }
}

/// An ordered mapping from field name to [`FieldKind`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, FieldKind)>,
}

impl Schema {
    /// Create an empty schema. Encoding anything under it yields `{}`.
    pub fn new() -> Schema {
        Schema::default()
    }

    /// Append a field descriptor.
    pub fn field<N: Into<String>>(mut self, name: N, kind: FieldKind) -> Schema {
        self.fields.push((name.into(), kind));
        self
    }

    /// Build a schema from a table of `(name, descriptor-tag)` pairs.
    pub fn from_table(table: &[(&str, &str)]) -> Result<Schema> {
        let mut schema = Schema::new();
        for &(name, tag) in table {
            schema = schema.field(name, FieldKind::from_tag(tag)?);
        }
        Ok(schema)
    }

    /// Encode `input` into a JSON document.
    ///
    /// Fields named by the schema but absent from the input are omitted;
    /// fields present in the input but not named by the schema are ignored.
    pub fn encode(&self, input: &Map<String, Value>) -> Result<String> {
        let mut out = String::with_capacity(2 + 16 * self.fields.len());
        self.encode_into(&mut out, input)?;
        Ok(out)
    }

    fn encode_into(&self, out: &mut String, input: &Map<String, Value>) -> Result<()> {
        out.push('{');
        let mut first = true;
        for (name, kind) in &self.fields {
            let value = match input.get(name) {
                Some(value) => value,
                None => continue,
            };
            if !first {
                out.push(',');
            }
            first = false;
            out.push_str(&serde_json::to_string(name)?);
            out.push(':');
            encode_value(out, kind, value)?;
        }
        out.push('}');
        Ok(())
    }
}

fn encode_value(out: &mut String, kind: &FieldKind, value: &Value) -> Result<()> {
    match *kind {
        FieldKind::Str => {
            // Quote whatever we were given; non-strings are stringified first.
            match *value {
                Value::String(ref s) => out.push_str(&serde_json::to_string(s)?),
                ref other => out.push_str(&serde_json::to_string(&other.to_string())?),
            }
        }
        FieldKind::Bare => match *value {
            Value::String(ref fragment) => out.push_str(fragment),
            ref other => out.push_str(&serde_json::to_string(other)?),
        },
        FieldKind::Object(ref schema) => match *value {
            Value::Object(ref map) => schema.encode_into(out, map)?,
            ref other => {
                return Err(Error::Schema(
                    "Expected an object for nested schema",
                    other.to_string(),
                ))
            }
        },
        FieldKind::Array(ref element) => match *value {
            Value::Array(ref items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    encode_value(out, element, item)?;
                }
                out.push(']');
            }
            ref other => {
                return Err(Error::Schema(
                    "Expected a sequence for array descriptor",
                    other.to_string(),
                ))
            }
        },
    }
    Ok(())
}

/// Encode GET parameters as a URL query string. No JSON is involved.
pub fn encode_query<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut encoder = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        encoder.append_pair(key, &value);
    }
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn empty_schema_yields_empty_object() {
        let encoded = Schema::new().encode(&object(json!({"id": "X"}))).unwrap();
        assert_eq!(encoded, "{}");
    }

    #[test]
    fn string_field_is_quoted() {
        let schema = Schema::new().field("id", FieldKind::Str);
        let encoded = schema.encode(&object(json!({"id": "X"}))).unwrap();
        assert_eq!(encoded, r#"{"id":"X"}"#);
    }

    #[test]
    fn bare_field_is_spliced() {
        let schema = Schema::new().field("id", FieldKind::Str);
        let bare = Schema::new().field("id", FieldKind::Bare);

        assert_eq!(
            schema.encode(&object(json!({"id": "X"}))).unwrap(),
            r#"{"id":"X"}"#
        );
        assert_eq!(bare.encode(&object(json!({"id": "X"}))).unwrap(), r#"{"id":X}"#);
        assert_eq!(bare.encode(&object(json!({"id": 17}))).unwrap(), r#"{"id":17}"#);
        assert_eq!(
            bare.encode(&object(json!({"id": true}))).unwrap(),
            r#"{"id":true}"#
        );
    }

    #[test]
    fn absent_fields_are_omitted() {
        let schema = Schema::new()
            .field("name", FieldKind::Str)
            .field("topic", FieldKind::Str);
        let encoded = schema.encode(&object(json!({"name": "general"}))).unwrap();
        assert_eq!(encoded, r#"{"name":"general"}"#);
    }

    #[test]
    fn string_arrays_serialize_as_json_string_arrays() {
        let schema = Schema::new().field("messages", FieldKind::Array(Box::new(FieldKind::Str)));
        let encoded = schema
            .encode(&object(json!({"messages": ["m1", "m2", "m3"]})))
            .unwrap();
        assert_eq!(encoded, r#"{"messages":["m1","m2","m3"]}"#);
    }

    #[test]
    fn nested_objects_recurse() {
        let schema = Schema::new().field(
            "properties",
            FieldKind::Object(Schema::new().field("$os", FieldKind::Str)),
        );
        let encoded = schema
            .encode(&object(json!({"properties": {"$os": "linux", "extra": 1}})))
            .unwrap();
        assert_eq!(encoded, r#"{"properties":{"$os":"linux"}}"#);
    }

    #[test]
    fn unknown_descriptor_tag_is_an_error() {
        match Schema::from_table(&[("id", "integer")]) {
            Err(Error::Schema(_, tag)) => assert_eq!(tag, "integer"),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn query_strings_are_url_encoded() {
        let query = encode_query([("limit", "50".to_owned()), ("after", "a b".to_owned())]);
        assert_eq!(query, "limit=50&after=a+b");
    }
}
