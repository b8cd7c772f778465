//! # CloudEvents Envelope
//!
//! Structured-mode JSON rendition of a CloudEvents 1.0 event. Bodies are
//! always JSON, so `data` holds the decoded value and `datacontenttype` is
//! `application/json`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::BusError;

/// CloudEvents specification version emitted by this crate.
pub const SPEC_VERSION: &str = "1.0";

/// Content type of every event body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A CloudEvents 1.0 event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    /// Always [`SPEC_VERSION`].
    pub specversion: String,
    /// Fresh UUID per event.
    pub id: String,
    /// Producer of the event.
    pub source: String,
    /// Event type, `type` on the wire.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Media type of `data`, [`JSON_CONTENT_TYPE`] for events built here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CloudEvent {
    /// Build an event around an already-encoded JSON body.
    ///
    /// `source` and `event_type` are required attributes and must be
    /// non-empty.
    pub fn new(source: &str, event_type: &str, data: Value) -> Result<Self, BusError> {
        if source.is_empty() {
            return Err(BusError::InvalidEvent("source must not be empty".into()));
        }
        if event_type.is_empty() {
            return Err(BusError::InvalidEvent("type must not be empty".into()));
        }
        Ok(Self {
            specversion: SPEC_VERSION.to_string(),
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            event_type: event_type.to_string(),
            datacontenttype: Some(JSON_CONTENT_TYPE.to_string()),
            time: Some(Utc::now()),
            data: Some(data),
        })
    }

    /// Encode `body` and wrap it in an event.
    pub fn encode<T: Serialize>(source: &str, event_type: &str, body: &T) -> Result<Self, BusError> {
        let data = serde_json::to_value(body).map_err(BusError::Encode)?;
        Self::new(source, event_type, data)
    }

    /// Decode the body. `Ok(None)` when the event carries no data.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, BusError> {
        match &self.data {
            None | Some(Value::Null) => Ok(None),
            Some(data) => T::deserialize(data).map(Some).map_err(BusError::Decode),
        }
    }

    /// Serialize the envelope for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BusError> {
        serde_json::to_vec(self).map_err(BusError::Encode)
    }

    /// Parse an envelope received from the wire.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BusError> {
        let event: Self = serde_json::from_slice(bytes).map_err(BusError::Decode)?;
        if event.specversion != SPEC_VERSION {
            return Err(BusError::InvalidEvent(format!(
                "unsupported specversion {}",
                event.specversion
            )));
        }
        Ok(event)
    }
}
