// Per-node risk scores
use crate::engine::graph::BowtieGraph;
use crate::engine::types::{Diagram, Node, NodeKind};
use serde::Serialize;
use std::collections::HashSet;

const NEIGHBOUR_WEIGHT: u32 = 5;
const FAILED_BARRIER_SCORE: u32 = 90;
const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl From<u32> for RiskLevel {
    fn from(score: u32) -> Self {
        match score {
            80.. => RiskLevel::Critical,
            60..=79 => RiskLevel::High,
            40..=59 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRisk {
    pub id: String,
    pub score: u32,
    pub level: RiskLevel,
}

fn base_score(kind: &NodeKind) -> u32 {
    match kind {
        NodeKind::Hazard => 80,
        NodeKind::TopEvent => 90,
        NodeKind::Threat => 60,
        NodeKind::Barrier { .. } => 40,
        NodeKind::Consequence => 100,
        NodeKind::DegradationFactor | NodeKind::DegradationControl => 50,
    }
}

fn score_node(graph: &BowtieGraph<'_>, node: &Node, failed: &HashSet<String>) -> u32 {
    let is_failed = |n: &Node| matches!(n.kind, NodeKind::Barrier { .. }) && failed.contains(&n.id);

    let score = match node.kind {
        NodeKind::Barrier { .. } if is_failed(node) => FAILED_BARRIER_SCORE,
        NodeKind::Consequence if graph.has_inbound_from(&node.id, is_failed) => MAX_SCORE,
        _ => base_score(&node.kind) + NEIGHBOUR_WEIGHT * graph.degree(&node.id) as u32,
    };

    score.min(MAX_SCORE)
}

/// Risk of every node in node order, with `failed` overriding stored barrier status.
pub fn risk_scores(diagram: &Diagram, failed: &HashSet<String>) -> Vec<NodeRisk> {
    let graph = BowtieGraph::new(diagram);

    diagram
        .nodes
        .iter()
        .map(|node| {
            let score = score_node(&graph, node, failed);
            NodeRisk {
                id: node.id.clone(),
                score,
                level: RiskLevel::from(score),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{BarrierStatus, BarrierType, Edge};

    fn diagram() -> Diagram {
        let barrier = |id: &str, barrier_type| {
            Node::new(
                id,
                NodeKind::Barrier {
                    barrier_type,
                    status: BarrierStatus::Failed,
                },
                id,
            )
        };
        Diagram {
            nodes: vec![
                Node::new("t1", NodeKind::Threat, "Spark"),
                barrier("p1", BarrierType::Prevention),
                Node::new("te", NodeKind::TopEvent, "Ignition"),
                barrier("m1", BarrierType::Mitigation),
                Node::new("c1", NodeKind::Consequence, "Burns"),
                Node::new("dc", NodeKind::DegradationControl, "Audit"),
            ],
            edges: vec![
                Edge::new("t1", "p1"),
                Edge::new("p1", "te"),
                Edge::new("te", "m1"),
                Edge::new("m1", "c1"),
                Edge::new("t1", "ghost"),
            ],
        }
    }

    fn score_of(risks: &[NodeRisk], id: &str) -> u32 {
        risks.iter().find(|r| r.id == id).map(|r| r.score).unwrap()
    }

    #[test]
    fn scores_grow_with_connections() {
        let risks = risk_scores(&diagram(), &HashSet::new());
        assert_eq!(score_of(&risks, "t1"), 65);
        assert_eq!(score_of(&risks, "p1"), 50);
        assert_eq!(score_of(&risks, "te"), 100);
        assert_eq!(score_of(&risks, "dc"), 50);
        assert_eq!(risks[0].level, RiskLevel::High);
        assert_eq!(risks[5].level, RiskLevel::Medium);
    }

    #[test]
    fn failed_set_overrides_stored_status() {
        let failed: HashSet<String> = ["m1".to_string()].into();
        let risks = risk_scores(&diagram(), &failed);

        // p1 is stored as failed but not in the set
        assert_eq!(score_of(&risks, "p1"), 50);
        assert_eq!(score_of(&risks, "m1"), 90);
        assert_eq!(score_of(&risks, "c1"), 100);
        assert_eq!(risks[3].level, RiskLevel::Critical);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(RiskLevel::from(39), RiskLevel::Low);
        assert_eq!(RiskLevel::from(40), RiskLevel::Medium);
        assert_eq!(RiskLevel::from(60), RiskLevel::High);
        assert_eq!(RiskLevel::from(80), RiskLevel::Critical);
    }
}
