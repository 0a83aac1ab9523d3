// Ingestion boundary: raw JSON documents in, validated diagrams out
use crate::engine::types::{BarrierStatus, BarrierType, Diagram, Edge, Node, NodeKind};
use crate::schemas::diagram::{
    DiagramDocument, EdgeRecord, LegacyDocument, LegacyItem, NodeDataRecord, NodeRecord,
};
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

pub const HAZARD_ID: &str = "hazard";
pub const TOP_EVENT_ID: &str = "top_event";

#[derive(thiserror::Error, Debug)]
pub enum DiagramError {
    #[error("diagram not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("diagram is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid diagram: {0}")]
    Validation(String),

    #[error("diagram storage failed: {0}")]
    Io(#[from] std::io::Error),
}

fn invalid(msg: impl Into<String>) -> DiagramError {
    DiagramError::Validation(msg.into())
}

/// Parse a document in either the canonical or the legacy shape.
pub fn parse_diagram(bytes: &[u8]) -> Result<Diagram, DiagramError> {
    let value: Value = serde_json::from_slice(bytes)?;
    diagram_from_value(value)
}

pub fn diagram_from_value(value: Value) -> Result<Diagram, DiagramError> {
    let Some(object) = value.as_object() else {
        return Err(invalid("document must be a JSON object"));
    };

    let has_canonical_keys = object.get("nodes").is_some_and(Value::is_array)
        && object.get("edges").is_some_and(Value::is_array);

    if has_canonical_keys {
        let document: DiagramDocument =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        return validate_document(document);
    }

    if LegacyDocument::KEYS.iter().any(|key| object.contains_key(*key)) {
        log::debug!("Reading legacy flattened diagram");
        let legacy: LegacyDocument =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        return Diagram::from_legacy(legacy);
    }

    Err(invalid("document lacks required nodes/edges keys"))
}

pub fn validate_document(document: DiagramDocument) -> Result<Diagram, DiagramError> {
    let nodes = document
        .nodes
        .into_iter()
        .map(Node::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    check_unique_ids(&nodes)?;

    for kind in [NodeKind::Hazard, NodeKind::TopEvent] {
        let count = nodes.iter().filter(|node| node.kind == kind).count();
        if count > 1 {
            log::warn!("Diagram has {} {} nodes, using the first", count, kind.tag());
        }
    }

    let edges = document.edges.into_iter().map(Edge::from).collect();
    Ok(Diagram { nodes, edges })
}

fn check_unique_ids(nodes: &[Node]) -> Result<(), DiagramError> {
    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(invalid(format!("duplicate node id '{}'", node.id)));
        }
    }
    Ok(())
}

impl TryFrom<NodeRecord> for Node {
    type Error = DiagramError;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        let NodeRecord {
            id,
            node_type,
            position,
            data,
        } = record;

        if id.is_empty() {
            return Err(invalid("node id cannot be empty"));
        }

        let kind = match node_type.as_str() {
            "hazard" => NodeKind::Hazard,
            "topEvent" => NodeKind::TopEvent,
            "threat" => NodeKind::Threat,
            "barrier" => {
                let barrier_type = data.barrier_type.ok_or_else(|| {
                    invalid(format!("barrier '{}' is missing barrierType", id))
                })?;
                NodeKind::Barrier {
                    barrier_type,
                    status: data.status.unwrap_or_default(),
                }
            }
            "consequence" => NodeKind::Consequence,
            "degradationFactor" => NodeKind::DegradationFactor,
            "degradationControl" => NodeKind::DegradationControl,
            other => {
                return Err(invalid(format!(
                    "node '{}' has unknown type '{}'",
                    id, other
                )));
            }
        };

        if kind.barrier_type().is_none() && (data.barrier_type.is_some() || data.status.is_some()) {
            log::debug!("Ignoring barrier fields on {} node {}", kind.tag(), id);
        }

        let label = match data.label {
            Some(label) if !label.is_empty() => label,
            _ => return Err(invalid(format!("node '{}' is missing data.label", id))),
        };

        Ok(Node {
            id,
            kind,
            label,
            description: data.description,
            position,
            extra: data.extra,
        })
    }
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        let (barrier_type, status) = match node.kind {
            NodeKind::Barrier {
                barrier_type,
                status,
            } => (Some(barrier_type), Some(status)),
            _ => (None, None),
        };

        NodeRecord {
            id: node.id.clone(),
            node_type: node.kind.tag().to_string(),
            position: node.position.clone(),
            data: NodeDataRecord {
                label: Some(node.label.clone()),
                description: node.description.clone(),
                barrier_type,
                status,
                extra: node.extra.clone(),
            },
        }
    }
}

impl From<EdgeRecord> for Edge {
    fn from(record: EdgeRecord) -> Self {
        Edge {
            id: record.id,
            source: record.source,
            target: record.target,
            label: record.label,
            source_handle: record.source_handle,
            target_handle: record.target_handle,
            extra: record.extra,
        }
    }
}

impl From<&Edge> for EdgeRecord {
    fn from(edge: &Edge) -> Self {
        EdgeRecord {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            label: edge.label.clone(),
            source_handle: edge.source_handle.clone(),
            target_handle: edge.target_handle.clone(),
            extra: edge.extra.clone(),
        }
    }
}

impl Diagram {
    pub fn to_document(&self) -> DiagramDocument {
        DiagramDocument {
            nodes: self.nodes.iter().map(NodeRecord::from).collect(),
            edges: self.edges.iter().map(EdgeRecord::from).collect(),
        }
    }

    /// Build a graph from the flattened shape. Barriers are chained in list
    /// order and every threat (consequence) links to the shared chain.
    pub fn from_legacy(legacy: LegacyDocument) -> Result<Self, DiagramError> {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        nodes.push(Node::new(
            HAZARD_ID,
            NodeKind::Hazard,
            legacy.hazard.unwrap_or_else(|| "unknown".to_string()),
        ));
        nodes.push(Node::new(
            TOP_EVENT_ID,
            NodeKind::TopEvent,
            legacy.top_event.unwrap_or_else(|| "unknown".to_string()),
        ));
        edges.push(Edge::new(HAZARD_ID, TOP_EVENT_ID));

        let item_node = |item: LegacyItem, kind: NodeKind| Node {
            description: item.description,
            ..Node::new(item.id, kind, item.name)
        };
        let barrier = |barrier_type| NodeKind::Barrier {
            barrier_type,
            status: BarrierStatus::Normal,
        };

        let prevention: Vec<String> = legacy
            .prevention_barriers
            .iter()
            .map(|item| item.id.clone())
            .collect();
        let mitigation: Vec<String> = legacy
            .mitigation_barriers
            .iter()
            .map(|item| item.id.clone())
            .collect();

        // threat -> first prevention barrier, or straight to the top event
        let threat_entry = prevention.first().map_or(TOP_EVENT_ID, String::as_str).to_string();
        for threat in legacy.threats {
            edges.push(Edge::new(threat.id.clone(), threat_entry.clone()));
            nodes.push(item_node(threat, NodeKind::Threat));
        }
        chain_edges(&mut edges, &prevention);
        if let Some(last) = prevention.last() {
            edges.push(Edge::new(last.clone(), TOP_EVENT_ID));
        }
        nodes.extend(
            legacy
                .prevention_barriers
                .into_iter()
                .map(|item| item_node(item, barrier(BarrierType::Prevention))),
        );

        if let Some(first) = mitigation.first() {
            edges.push(Edge::new(TOP_EVENT_ID, first.clone()));
        }
        chain_edges(&mut edges, &mitigation);
        nodes.extend(
            legacy
                .mitigation_barriers
                .into_iter()
                .map(|item| item_node(item, barrier(BarrierType::Mitigation))),
        );

        let consequence_exit = mitigation.last().map_or(TOP_EVENT_ID, String::as_str).to_string();
        for consequence in legacy.consequences {
            edges.push(Edge::new(consequence_exit.clone(), consequence.id.clone()));
            nodes.push(item_node(consequence, NodeKind::Consequence));
        }

        check_unique_ids(&nodes)?;
        Ok(Diagram { nodes, edges })
    }

    pub fn to_legacy(&self) -> LegacyDocument {
        let view = self.flatten();
        let items = |nodes: &[&Node]| {
            nodes
                .iter()
                .map(|node| LegacyItem {
                    id: node.id.clone(),
                    name: node.label.clone(),
                    description: node.description.clone(),
                })
                .collect::<Vec<_>>()
        };

        LegacyDocument {
            hazard: view.hazard.map(|node| node.label.clone()),
            top_event: view.top_event.map(|node| node.label.clone()),
            threats: items(&view.threats),
            prevention_barriers: items(&view.prevention_barriers),
            mitigation_barriers: items(&view.mitigation_barriers),
            consequences: items(&view.consequences),
        }
    }
}

fn chain_edges(edges: &mut Vec<Edge>, ids: &[String]) {
    for pair in ids.windows(2) {
        edges.push(Edge::new(pair[0].clone(), pair[1].clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::BowtieGraph;
    use serde_json::json;

    #[test]
    fn rejects_malformed_json_as_parse_error() {
        let err = parse_diagram(b"{ nodes: [").unwrap_err();
        assert!(matches!(err, DiagramError::Parse(_)));
    }

    #[test]
    fn rejects_documents_without_nodes_and_edges() {
        let err = parse_diagram(br#"{"nodes": []}"#).unwrap_err();
        assert!(matches!(err, DiagramError::Validation(ref msg) if msg.contains("nodes/edges")));

        let err = parse_diagram(b"[]").unwrap_err();
        assert!(matches!(err, DiagramError::Validation(_)));
    }

    #[test]
    fn barrier_requires_barrier_type() {
        let doc = json!({
            "nodes": [{"id": "b1", "type": "barrier", "data": {"label": "Sprinkler"}}],
            "edges": []
        });
        let err = diagram_from_value(doc).unwrap_err();
        assert!(matches!(err, DiagramError::Validation(ref msg) if msg.contains("barrierType")));
    }

    #[test]
    fn unknown_type_and_missing_label_are_rejected() {
        let doc = json!({
            "nodes": [{"id": "x", "type": "gizmo", "data": {"label": "X"}}],
            "edges": []
        });
        assert!(matches!(
            diagram_from_value(doc),
            Err(DiagramError::Validation(_))
        ));

        let doc = json!({
            "nodes": [{"id": "t1", "type": "threat", "data": {}}],
            "edges": []
        });
        assert!(matches!(
            diagram_from_value(doc),
            Err(DiagramError::Validation(ref msg)) if msg.contains("label")
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let doc = json!({
            "nodes": [
                {"id": "t1", "type": "threat", "data": {"label": "A"}},
                {"id": "t1", "type": "threat", "data": {"label": "B"}}
            ],
            "edges": []
        });
        assert!(matches!(
            diagram_from_value(doc),
            Err(DiagramError::Validation(ref msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn barrier_payload_and_dangling_edges_survive_ingestion() {
        let doc = json!({
            "nodes": [
                {
                    "id": "b1",
                    "type": "barrier",
                    "position": {"x": 1.0, "y": 2.0},
                    "data": {
                        "label": "Sprinkler",
                        "barrierType": "prevention",
                        "status": "failed",
                        "owner": "ops"
                    }
                }
            ],
            "edges": [{"id": "e1", "source": "b1", "target": "nowhere"}]
        });
        let diagram = diagram_from_value(doc.clone()).unwrap();

        assert_eq!(
            diagram.nodes[0].kind,
            NodeKind::Barrier {
                barrier_type: BarrierType::Prevention,
                status: BarrierStatus::Failed,
            }
        );
        assert_eq!(diagram.edges.len(), 1);
        assert_eq!(serde_json::to_value(diagram.to_document()).unwrap(), doc);
    }

    #[test]
    fn legacy_document_becomes_linked_graph() {
        let legacy = json!({
            "hazard": "Flammable vapour",
            "top_event": "Ignition",
            "threats": [{"id": "t1", "name": "Static"}, {"id": "t2", "name": "Hot work"}],
            "prevention_barriers": [
                {"id": "p1", "name": "Bonding"},
                {"id": "p2", "name": "Permit"}
            ],
            "mitigation_barriers": [{"id": "m1", "name": "Deluge", "description": "Foam system"}],
            "consequences": [{"id": "c1", "name": "Fire"}]
        });
        let diagram = diagram_from_value(legacy).unwrap();

        let pairs: Vec<(&str, &str)> = diagram
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("hazard", "top_event"),
                ("t1", "p1"),
                ("t2", "p1"),
                ("p1", "p2"),
                ("p2", "top_event"),
                ("top_event", "m1"),
                ("m1", "c1"),
            ]
        );
        assert_eq!(
            diagram.node("m1").and_then(|n| n.description.as_deref()),
            Some("Foam system")
        );

        let back = diagram.to_legacy();
        assert_eq!(back.hazard.as_deref(), Some("Flammable vapour"));
        assert_eq!(back.prevention_barriers.len(), 2);
        assert_eq!(back.mitigation_barriers[0].name, "Deluge");
    }

    #[test]
    fn legacy_chains_follow_list_order() {
        let legacy = json!({
            "hazard": "Flammable vapour",
            "top_event": "Ignition",
            "threats": [{"id": "t1", "name": "Static"}, {"id": "t2", "name": "Hot work"}],
            "prevention_barriers": [
                {"id": "p1", "name": "Bonding"},
                {"id": "p2", "name": "Permit"}
            ],
            "mitigation_barriers": [{"id": "m1", "name": "Deluge"}],
            "consequences": [{"id": "c1", "name": "Fire"}]
        });
        let diagram = diagram_from_value(legacy).unwrap();
        let graph = BowtieGraph::new(&diagram);

        for threat in ["t1", "t2"] {
            let chain = graph.prevention_chain(threat);
            assert_eq!(chain.ids(), vec!["p1", "p2"]);
            assert!(chain.reaches_top_event);
        }
        let chain = graph.mitigation_chain("c1");
        assert_eq!(chain.ids(), vec!["m1"]);
        assert!(chain.reaches_top_event);
    }

    #[test]
    fn legacy_without_barriers_links_to_top_event() {
        let legacy = LegacyDocument {
            hazard: Some("Fire".into()),
            threats: vec![LegacyItem {
                id: "t1".into(),
                name: "Spark".into(),
                description: None,
            }],
            consequences: vec![LegacyItem {
                id: "c1".into(),
                name: "Burns".into(),
                description: None,
            }],
            ..Default::default()
        };
        let diagram = Diagram::from_legacy(legacy).unwrap();
        assert!(diagram.edges.contains(&Edge::new("t1", TOP_EVENT_ID)));
        assert!(diagram.edges.contains(&Edge::new(TOP_EVENT_ID, "c1")));
        assert_eq!(diagram.top_event().map(|n| n.label.as_str()), Some("unknown"));
    }
}
