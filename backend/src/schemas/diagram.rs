// Wire shapes of a bowtie document, as written by the diagram editor
use crate::engine::types::{BarrierStatus, BarrierType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub position: Value, // Position in the diagram editor
    pub data: NodeDataRecord,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeDataRecord {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barrier_type: Option<BarrierType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BarrierStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical node/edge document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramDocument {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LegacyItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Flattened document used by the first Streamlit viewers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LegacyDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_event: Option<String>,
    pub threats: Vec<LegacyItem>,
    pub prevention_barriers: Vec<LegacyItem>,
    pub mitigation_barriers: Vec<LegacyItem>,
    pub consequences: Vec<LegacyItem>,
}

impl LegacyDocument {
    pub const KEYS: [&'static str; 6] = [
        "hazard",
        "top_event",
        "threats",
        "prevention_barriers",
        "mitigation_barriers",
        "consequences",
    ];
}
