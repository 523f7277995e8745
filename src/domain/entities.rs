//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::error::{DomainError, DomainResult};

/// Stable backend identity of an industry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Industry record as delivered by the backend.
///
/// `category` is a descriptive label derived from depth at creation time;
/// the tree shape is defined by `parent_id` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Parent reference, None for main categories
    #[serde(default, alias = "parent")]
    pub parent_id: Option<NodeId>,
}

impl IndustryNode {
    pub fn new(id: i64, name: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            id: NodeId(id),
            name: name.into(),
            category: String::new(),
            parent_id: parent_id.map(NodeId),
        }
    }

    pub fn is_main_category(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl fmt::Display for IndustryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

/// Record to be created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIndustry {
    pub name: String,
    pub category: String,
    #[serde(rename = "parent")]
    pub parent_id: Option<NodeId>,
}

/// Transient payload carried on the drag transfer channel for one gesture.
///
/// Encoded as a tagged JSON object: `{"kind":"root","id":1}` or
/// `{"kind":"descendant","id":7,"level":2}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DragPayload {
    Root { id: NodeId },
    Descendant { id: NodeId, level: usize },
}

impl DragPayload {
    pub fn id(&self) -> NodeId {
        match self {
            DragPayload::Root { id } | DragPayload::Descendant { id, .. } => *id,
        }
    }

    pub fn source_level(&self) -> usize {
        match self {
            DragPayload::Root { .. } => 0,
            DragPayload::Descendant { level, .. } => *level,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            DragPayload::Root { id } => json!({ "kind": "root", "id": id.0 }).to_string(),
            DragPayload::Descendant { id, level } => {
                json!({ "kind": "descendant", "id": id.0, "level": level }).to_string()
            }
        }
    }

    /// Parse a raw transfer string.
    ///
    /// A descendant payload claiming level 0 is rejected: level 0 is a root.
    pub fn decode(raw: &str) -> DomainResult<Self> {
        let payload: DragPayload = serde_json::from_str(raw.trim())
            .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;
        if let DragPayload::Descendant { level: 0, .. } = payload {
            return Err(DomainError::MalformedPayload(
                "descendant payload at level 0".to_string(),
            ));
        }
        Ok(payload)
    }
}

/// Trim and check a user-supplied name against the minimum length policy.
pub fn validate_name(raw: &str, min_len: usize) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidName {
            reason: "name must not be empty".to_string(),
        });
    }
    if name.chars().count() < min_len {
        return Err(DomainError::InvalidName {
            reason: format!("name must be at least {} characters", min_len),
        });
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_descendant_payload_when_encoded_then_decodes_to_same_variant() {
        let payload = DragPayload::Descendant {
            id: NodeId(7),
            level: 2,
        };
        let raw = payload.encode();
        assert!(raw.contains("\"kind\":\"descendant\""));
        assert_eq!(DragPayload::decode(&raw).unwrap(), payload);
    }

    #[test]
    fn given_garbage_when_decoding_payload_then_malformed() {
        assert!(matches!(
            DragPayload::decode("not json"),
            Err(DomainError::MalformedPayload(_))
        ));
        assert!(DragPayload::decode(r#"{"kind":"sideways","id":1}"#).is_err());
        assert!(DragPayload::decode(r#"{"kind":"descendant","id":1}"#).is_err());
        assert!(DragPayload::decode(r#"{"kind":"descendant","id":1,"level":0}"#).is_err());
    }

    #[test]
    fn given_backend_json_with_parent_key_when_parsed_then_maps_to_parent_id() {
        let node: IndustryNode =
            serde_json::from_str(r#"{"id":3,"name":"Retail","category":"sub","parent":1}"#)
                .unwrap();
        assert_eq!(node.parent_id, Some(NodeId(1)));

        let root: IndustryNode =
            serde_json::from_str(r#"{"id":1,"name":"Trade","parent_id":null}"#).unwrap();
        assert!(root.is_main_category());
        assert_eq!(root.category, "");
    }

    #[test]
    fn given_short_or_blank_names_when_validating_then_rejected() {
        assert!(validate_name("   ", 1).is_err());
        assert!(validate_name(" a ", 2).is_err());
        assert_eq!(validate_name("  Mining ", 2).unwrap(), "Mining");
    }
}
