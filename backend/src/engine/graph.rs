// Barrier chain resolution over the diagram's node/edge graph
use crate::engine::types::{BarrierType, Diagram, Node, NodeKind};
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainEntry {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Node> for ChainEntry {
    fn from(node: &Node) -> Self {
        ChainEntry {
            id: node.id.clone(),
            label: node.label.clone(),
            description: node.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BarrierChain {
    /// Barriers in cause -> effect order.
    pub barriers: Vec<ChainEntry>,
    pub reaches_top_event: bool,
}

impl BarrierChain {
    pub fn ids(&self) -> Vec<&str> {
        self.barriers.iter().map(|entry| entry.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradationControl {
    #[serde(flatten)]
    pub control: ChainEntry,
    pub factors: Vec<ChainEntry>,
}

/// Adjacency index over a diagram. Node weights index into `diagram.nodes`,
/// edge weights are the position of the edge in `diagram.edges`.
pub struct BowtieGraph<'a> {
    diagram: &'a Diagram,
    graph: DiGraph<usize, usize>,
    node_map: HashMap<&'a str, NodeIndex>,
    top_event: Option<NodeIndex>,
}

impl<'a> BowtieGraph<'a> {
    pub fn new(diagram: &'a Diagram) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        // Add Nodes
        for (pos, node) in diagram.nodes.iter().enumerate() {
            let idx = graph.add_node(pos);
            node_map.insert(node.id.as_str(), idx);
        }

        // Add Edges, dangling ones are dropped
        for (pos, edge) in diagram.edges.iter().enumerate() {
            match (
                node_map.get(edge.source.as_str()),
                node_map.get(edge.target.as_str()),
            ) {
                (Some(&src), Some(&target)) => {
                    graph.add_edge(src, target, pos);
                }
                _ => log::debug!(
                    "Ignoring dangling edge {} -> {}",
                    edge.source,
                    edge.target
                ),
            }
        }

        let top_event = diagram
            .top_event()
            .and_then(|node| node_map.get(node.id.as_str()).copied());

        Self {
            diagram,
            graph,
            node_map,
            top_event,
        }
    }

    fn node(&self, idx: NodeIndex) -> &'a Node {
        &self.diagram.nodes[self.graph[idx]]
    }

    fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    fn is_barrier(&self, idx: NodeIndex, wanted: BarrierType) -> bool {
        self.node(idx).is_barrier_of(wanted)
    }

    /// First edge in document order leaving (or entering) `idx` that satisfies `pred`.
    fn first_edge(
        &self,
        idx: NodeIndex,
        dir: Direction,
        pred: impl Fn(&EdgeReference<'_, usize>) -> bool,
    ) -> Option<EdgeReference<'_, usize>> {
        self.graph
            .edges_directed(idx, dir)
            .filter(|edge| pred(edge))
            .min_by_key(|edge| *edge.weight())
    }

    fn has_edge(&self, from: NodeIndex, to: Option<NodeIndex>) -> bool {
        to.is_some_and(|to| self.graph.contains_edge(from, to))
    }

    /// Ordered prevention barriers from `threat_id` toward the top event.
    pub fn prevention_chain(&self, threat_id: &str) -> BarrierChain {
        let mut chain = BarrierChain::default();
        let Some(threat) = self.index_of(threat_id) else {
            return chain;
        };
        let Some(first) = self.first_edge(threat, Direction::Outgoing, |_| true) else {
            return chain;
        };

        let mut visited = HashSet::new();
        let mut next = first.target();

        while self.is_barrier(next, BarrierType::Prevention) {
            if !visited.insert(next) {
                log::debug!("Prevention chain from {} hit a cycle", threat_id);
                break;
            }
            chain.barriers.push(self.node(next).into());

            // Only barriers continue the chain; degradation links hang off it.
            let onward = self.first_edge(next, Direction::Outgoing, |edge| {
                Some(edge.target()) != self.top_event
                    && self.is_barrier(edge.target(), BarrierType::Prevention)
            });
            match onward {
                Some(edge) => next = edge.target(),
                None => {
                    chain.reaches_top_event = self.has_edge(next, self.top_event);
                    break;
                }
            }
        }

        chain
    }

    /// Ordered mitigation barriers from the top event toward `consequence_id`.
    pub fn mitigation_chain(&self, consequence_id: &str) -> BarrierChain {
        let mut chain = BarrierChain::default();
        let Some(mut current) = self.index_of(consequence_id) else {
            return chain;
        };

        let mut visited = HashSet::new();
        while let Some(edge) = self.first_edge(current, Direction::Incoming, |edge| {
            self.is_barrier(edge.source(), BarrierType::Mitigation)
        }) {
            let barrier = edge.source();
            if !visited.insert(barrier) {
                log::debug!("Mitigation chain to {} hit a cycle", consequence_id);
                break;
            }
            chain.barriers.push(self.node(barrier).into());
            current = barrier;
        }

        chain.barriers.reverse();
        chain.reaches_top_event = !chain.barriers.is_empty()
            && self
                .top_event
                .is_some_and(|top| self.graph.contains_edge(top, current));
        chain
    }

    /// One prevention chain per threat, then one mitigation chain per
    /// consequence, keyed by the starting node.
    pub fn all_chains(
        &self,
    ) -> (Vec<(&'a Node, BarrierChain)>, Vec<(&'a Node, BarrierChain)>) {
        let prevention = self
            .diagram
            .nodes_of(|kind| *kind == NodeKind::Threat)
            .map(|threat| (threat, self.prevention_chain(&threat.id)))
            .collect();
        let mitigation = self
            .diagram
            .nodes_of(|kind| *kind == NodeKind::Consequence)
            .map(|consequence| (consequence, self.mitigation_chain(&consequence.id)))
            .collect();
        (prevention, mitigation)
    }

    /// Neighbours of `idx` in either direction, in edge order, deduplicated.
    fn linked(&self, idx: NodeIndex, kind: NodeKind) -> Vec<NodeIndex> {
        let mut edges: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
            .chain(
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .map(|edge| (*edge.weight(), edge.source())),
            )
            .filter(|(_, other)| self.node(*other).kind == kind)
            .collect();
        edges.sort_by_key(|(pos, _)| *pos);

        let mut seen = HashSet::new();
        edges
            .into_iter()
            .map(|(_, other)| other)
            .filter(|other| seen.insert(*other))
            .collect()
    }

    /// Degradation controls attached to a barrier, each with the degradation
    /// factors attached to that control.
    pub fn degradation_of(&self, barrier_id: &str) -> Vec<DegradationControl> {
        let Some(barrier) = self.index_of(barrier_id) else {
            return Vec::new();
        };

        self.linked(barrier, NodeKind::DegradationControl)
            .into_iter()
            .map(|control| DegradationControl {
                control: self.node(control).into(),
                factors: self
                    .linked(control, NodeKind::DegradationFactor)
                    .into_iter()
                    .map(|factor| self.node(factor).into())
                    .collect(),
            })
            .collect()
    }

    /// Distinct neighbours of a node, either direction.
    pub fn degree(&self, id: &str) -> usize {
        let Some(idx) = self.index_of(id) else {
            return 0;
        };
        self.graph
            .neighbors_undirected(idx)
            .filter(|other| *other != idx)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Whether any edge into `target_id` starts at a node matching `pred`.
    pub fn has_inbound_from(&self, target_id: &str, pred: impl Fn(&Node) -> bool) -> bool {
        self.index_of(target_id).is_some_and(|idx| {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .any(|src| pred(self.node(src)))
        })
    }
}

pub fn resolve_prevention_chain(diagram: &Diagram, threat_id: &str) -> Vec<ChainEntry> {
    BowtieGraph::new(diagram).prevention_chain(threat_id).barriers
}

pub fn resolve_mitigation_chain(diagram: &Diagram, consequence_id: &str) -> Vec<ChainEntry> {
    BowtieGraph::new(diagram).mitigation_chain(consequence_id).barriers
}
