use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SyncError;

/// The single shared map state document.
///
/// Exactly one document exists at any time. `version` increases by one
/// with every accepted write so viewers can discard frames that arrive
/// out of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u64,
    pub objects: Vec<Value>,
}

impl Document {
    /// The document seeded on first startup.
    pub fn initial() -> Self {
        Self {
            version: 1,
            objects: Vec::new(),
        }
    }

    /// Produce the successor document for a write.
    ///
    /// Pure: replaces the object list wholesale and bumps the version.
    /// A write identical to the current state still increments.
    pub fn advance(&self, objects: Vec<Value>) -> Self {
        Self {
            version: self.version + 1,
            objects,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::initial()
    }
}

/// An admin write: the replacement object list, version assigned server-side.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub objects: Vec<Value>,
}

impl WriteRequest {
    /// Validate a raw JSON body: must be an object carrying an `objects`
    /// array. Extra fields are ignored.
    pub fn parse(body: Value) -> Result<Self, SyncError> {
        let Value::Object(mut map) = body else {
            return Err(SyncError::Validation(
                "request body must be a JSON object".into(),
            ));
        };
        match map.remove("objects") {
            Some(Value::Array(objects)) => Ok(Self { objects }),
            Some(_) => Err(SyncError::Validation("`objects` must be an array".into())),
            None => Err(SyncError::Validation("missing `objects` field".into())),
        }
    }
}

/// A message pushed over a live connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    State { state: Document },
}

impl Frame {
    pub fn state(state: Document) -> Self {
        Frame::State { state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initial_document() {
        let doc = Document::initial();
        assert_eq!(doc.version, 1);
        assert!(doc.objects.is_empty());
    }

    #[test]
    fn advance_bumps_version_and_replaces_objects() {
        let doc = Document::initial();
        let next = doc.advance(vec![json!({ "type": "marker", "lat": 1, "lng": 2 })]);
        assert_eq!(next.version, 2);
        assert_eq!(next.objects.len(), 1);

        // Identical payload still increments: no idempotence short-circuit
        let again = next.advance(next.objects.clone());
        assert_eq!(again.version, 3);
        assert_eq!(again.objects, next.objects);
    }

    #[test]
    fn write_request_requires_objects_array() {
        assert!(WriteRequest::parse(json!({ "objects": [] })).is_ok());
        assert!(WriteRequest::parse(json!({ "objects": [1, 2] })).is_ok());

        assert!(matches!(
            WriteRequest::parse(json!({ "stuff": [] })),
            Err(SyncError::Validation(_))
        ));
        assert!(matches!(
            WriteRequest::parse(json!({ "objects": "nope" })),
            Err(SyncError::Validation(_))
        ));
        assert!(matches!(
            WriteRequest::parse(json!([1, 2, 3])),
            Err(SyncError::Validation(_))
        ));
    }

    #[test]
    fn write_request_ignores_extra_fields() {
        let req = WriteRequest::parse(json!({ "objects": [true], "version": 99 })).unwrap();
        assert_eq!(req.objects, vec![json!(true)]);
    }

    #[test]
    fn state_frame_wire_shape() {
        let frame = Frame::state(Document::initial());
        let wire = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            wire,
            json!({ "type": "state", "state": { "version": 1, "objects": [] } })
        );
    }
}
