// Canonical in-memory model of a bowtie diagram
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum BarrierType {
    Prevention,
    Mitigation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum BarrierStatus {
    #[default]
    Normal,
    Failed,
}

/// The role a node plays in the diagram. Only barriers carry a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Hazard,
    TopEvent,
    Threat,
    Barrier {
        barrier_type: BarrierType,
        status: BarrierStatus,
    },
    Consequence,
    DegradationFactor,
    DegradationControl,
}

impl NodeKind {
    /// Wire tag used in the `type` field of a node record.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Hazard => "hazard",
            NodeKind::TopEvent => "topEvent",
            NodeKind::Threat => "threat",
            NodeKind::Barrier { .. } => "barrier",
            NodeKind::Consequence => "consequence",
            NodeKind::DegradationFactor => "degradationFactor",
            NodeKind::DegradationControl => "degradationControl",
        }
    }

    pub fn barrier_type(&self) -> Option<BarrierType> {
        match self {
            NodeKind::Barrier { barrier_type, .. } => Some(*barrier_type),
            _ => None,
        }
    }

    pub fn is_barrier_of(&self, wanted: BarrierType) -> bool {
        self.barrier_type() == Some(wanted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub description: Option<String>,
    // Editor-owned fields, carried so a document can be written back unchanged
    pub position: Value,
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            description: None,
            position: Value::Null,
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_barrier_of(&self, wanted: BarrierType) -> bool {
        self.kind.is_barrier_of(wanted)
    }

    pub fn stored_failed(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Barrier {
                status: BarrierStatus::Failed,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Edge {
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub extra: Map<String, Value>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// The legacy five-list view of a diagram, each list in node order.
#[derive(Debug, Clone, Default)]
pub struct FlatView<'a> {
    pub hazard: Option<&'a Node>,
    pub top_event: Option<&'a Node>,
    pub threats: Vec<&'a Node>,
    pub prevention_barriers: Vec<&'a Node>,
    pub mitigation_barriers: Vec<&'a Node>,
    pub consequences: Vec<&'a Node>,
}

impl Diagram {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn nodes_of<'a>(
        &'a self,
        pred: impl Fn(&NodeKind) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |node| pred(&node.kind))
    }

    /// First hazard node. Extra hazards are tolerated but ignored.
    pub fn hazard(&self) -> Option<&Node> {
        self.single_of(NodeKind::Hazard)
    }

    /// First top-event node. Extra top events are tolerated but ignored.
    pub fn top_event(&self) -> Option<&Node> {
        self.single_of(NodeKind::TopEvent)
    }

    fn single_of(&self, kind: NodeKind) -> Option<&Node> {
        self.nodes.iter().find(|node| node.kind == kind)
    }

    /// Ids of barriers whose stored status is `failed`.
    pub fn stored_failures(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| node.stored_failed())
            .map(|node| node.id.clone())
            .collect()
    }

    pub fn flatten(&self) -> FlatView<'_> {
        let mut view = FlatView {
            hazard: self.hazard(),
            top_event: self.top_event(),
            ..Default::default()
        };

        for node in &self.nodes {
            match node.kind {
                NodeKind::Threat => view.threats.push(node),
                NodeKind::Barrier {
                    barrier_type: BarrierType::Prevention,
                    ..
                } => view.prevention_barriers.push(node),
                NodeKind::Barrier {
                    barrier_type: BarrierType::Mitigation,
                    ..
                } => view.mitigation_barriers.push(node),
                NodeKind::Consequence => view.consequences.push(node),
                _ => {}
            }
        }

        view
    }
}
