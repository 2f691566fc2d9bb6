// envelope.rs
//
// On-disk layout of every configuration file:
// `{ "format_version": 1, "kind": "...", "payload": { field: value, ... } }`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};
use crate::global_variables::FORMAT_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub format_version: u32,
    pub kind: String,
    pub payload: Map<String, Value>,
}

/// Collects the named fields of one record before it is encoded.
#[derive(Debug)]
pub struct RecordWriter {
    kind: &'static str,
    payload: Map<String, Value>,
}

impl RecordWriter {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            payload: Map::new(),
        }
    }

    pub fn field<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> ConfigResult<&mut Self> {
        let encoded = serde_json::to_value(value).map_err(|source| ConfigError::Encode {
            context: format!("{} field `{name}`", self.kind),
            source,
        })?;
        self.payload.insert(name.to_string(), encoded);
        Ok(self)
    }

    pub fn into_envelope(self) -> Envelope {
        Envelope {
            format_version: FORMAT_VERSION,
            kind: self.kind.to_string(),
            payload: self.payload,
        }
    }

    /// Pretty-printed JSON bytes of the finished envelope.
    pub fn into_bytes(self) -> ConfigResult<Vec<u8>> {
        let kind = self.kind;
        serde_json::to_vec_pretty(&self.into_envelope()).map_err(|source| ConfigError::Encode {
            context: kind.to_string(),
            source,
        })
    }
}

/// Gives named access to the payload of a decoded envelope.
#[derive(Debug)]
pub struct RecordReader {
    kind: String,
    payload: Map<String, Value>,
}

impl RecordReader {
    /// Decode the envelope and check that it holds a supported `expected_kind` record.
    pub fn from_bytes(bytes: &[u8], expected_kind: &str) -> ConfigResult<Self> {
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(|source| ConfigError::Decode {
            context: format!("{expected_kind} envelope"),
            source,
        })?;
        Self::from_envelope(envelope, expected_kind)
    }

    pub fn from_envelope(envelope: Envelope, expected_kind: &str) -> ConfigResult<Self> {
        if envelope.format_version == 0 || envelope.format_version > FORMAT_VERSION {
            return Err(ConfigError::UnsupportedFormatVersion {
                found: envelope.format_version,
                supported: FORMAT_VERSION,
            });
        }
        if envelope.kind != expected_kind {
            return Err(ConfigError::WrongKind {
                expected: expected_kind.to_string(),
                found: envelope.kind,
            });
        }
        Ok(Self {
            kind: envelope.kind,
            payload: envelope.payload,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Decode one field. An absent field decodes like `null`, so optional
    /// attributes come back as `None` and required ones fail.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> ConfigResult<T> {
        let value = self.payload.get(name).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|source| ConfigError::Decode {
            context: format!("{} field `{name}`", self.kind),
            source,
        })
    }

    /// Decode a list field element by element so a bad element is reported
    /// with its index.
    pub fn list<T: DeserializeOwned>(&self, name: &str) -> ConfigResult<Vec<T>> {
        let items = match self.payload.get(name) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => return Err(ConfigError::missing(self.kind.clone(), name)),
            Some(other) => {
                return Err(ConfigError::wrong_type(
                    self.kind.clone(),
                    None,
                    name,
                    format!("expected a list, found {}", json_type_name(other)),
                ))
            }
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::deserialize(item).map_err(|err| {
                    ConfigError::wrong_type(format!("{} {name}", self.kind), Some(index), name, err.to_string())
                })
            })
            .collect()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Lane {
        index: i64,
        width: f64,
    }

    fn lanes_record() -> Vec<u8> {
        let mut writer = RecordWriter::new("lanes");
        writer
            .field("external_id", "road_1")
            .unwrap()
            .field("lanes", &vec![Lane { index: 0, width: 3.5 }, Lane { index: 1, width: 3.0 }])
            .unwrap();
        writer.into_bytes().unwrap()
    }

    #[test]
    fn fields_are_read_back_by_name() {
        let reader = RecordReader::from_bytes(&lanes_record(), "lanes").unwrap();
        let lanes: Vec<Lane> = reader.list("lanes").unwrap();
        assert_eq!(lanes[1], Lane { index: 1, width: 3.0 });
        let external_id: Option<String> = reader.field("external_id").unwrap();
        assert_eq!(external_id.as_deref(), Some("road_1"));
        let absent: Option<String> = reader.field("name").unwrap();
        assert!(absent.is_none());
    }

    #[test]
    fn envelope_carries_version_and_kind() {
        let envelope: Envelope = serde_json::from_slice(&lanes_record()).unwrap();
        assert_eq!(envelope.format_version, FORMAT_VERSION);
        assert_eq!(envelope.kind, "lanes");
    }

    #[test]
    fn wrong_kind_is_rejected() {
        assert!(matches!(
            RecordReader::from_bytes(&lanes_record(), "detectors"),
            Err(ConfigError::WrongKind { .. })
        ));
    }

    #[test]
    fn newer_and_zero_versions_are_rejected() {
        for version in [0, FORMAT_VERSION + 1] {
            let bytes = serde_json::to_vec(&json!({
                "format_version": version,
                "kind": "lanes",
                "payload": {}
            }))
            .unwrap();
            match RecordReader::from_bytes(&bytes, "lanes") {
                Err(ConfigError::UnsupportedFormatVersion { found, .. }) => assert_eq!(found, version),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_bytes_are_a_decode_error() {
        assert!(matches!(
            RecordReader::from_bytes(b"not json", "lanes"),
            Err(ConfigError::Decode { .. })
        ));
    }

    #[test]
    fn bad_list_element_reports_its_index() {
        let bytes = serde_json::to_vec(&json!({
            "format_version": 1,
            "kind": "lanes",
            "payload": { "lanes": [ { "index": 0, "width": 3.5 }, { "index": "one", "width": 3.5 } ] }
        }))
        .unwrap();
        let reader = RecordReader::from_bytes(&bytes, "lanes").unwrap();
        match reader.list::<Lane>("lanes") {
            Err(ConfigError::WrongType { index, field, .. }) => {
                assert_eq!(index, Some(1));
                assert_eq!(field, "lanes");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn list_field_must_be_a_list() {
        let bytes = serde_json::to_vec(&json!({
            "format_version": 1,
            "kind": "lanes",
            "payload": { "lanes": 4 }
        }))
        .unwrap();
        let reader = RecordReader::from_bytes(&bytes, "lanes").unwrap();
        assert!(matches!(
            reader.list::<Lane>("lanes"),
            Err(ConfigError::WrongType { index: None, .. })
        ));
        assert!(matches!(
            reader.list::<Lane>("missing"),
            Err(ConfigError::MissingAttribute { .. })
        ));
    }
}
