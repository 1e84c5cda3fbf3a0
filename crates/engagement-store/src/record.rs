use engagement_common::{EngagementError, Id, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A stored row. The abstraction preserves an `id` field of the form
/// `<table>:<key>` in both directions regardless of the backing driver
///, so every `Record` carries its `Id` alongside the
/// arbitrary JSON body produced by the caller's typed struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Id,
    pub body: Value,
}

impl Record {
    pub fn new<T: Serialize>(id: Id, value: &T) -> Result<Self> {
        let mut body = serde_json::to_value(value)
            .map_err(|e| EngagementError::Serialization(e.to_string()))?;
        if let Value::Object(ref mut map) = body {
            map.insert("id".to_string(), Value::String(id.as_str().to_string()));
        }
        Ok(Self { id, body })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| EngagementError::Serialization(e.to_string()))
    }
}
