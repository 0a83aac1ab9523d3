// Request and response bodies of the analysis endpoints
use crate::engine::graph::{BarrierChain, BowtieGraph, ChainEntry, DegradationControl};
use crate::engine::narrative::StoryLine;
use crate::engine::risk::NodeRisk;
use crate::engine::types::{Diagram, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioRequest {
    /// Barrier ids to treat as failed. Falls back to stored barrier status.
    #[serde(default)]
    pub failed_barriers: Option<Vec<String>>,
}

impl ScenarioRequest {
    pub fn failed_set(&self, diagram: &Diagram) -> HashSet<String> {
        match &self.failed_barriers {
            Some(ids) => ids.iter().cloned().collect(),
            None => diagram.stored_failures().into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineAnalysisRequest {
    pub diagram: Value,
    #[serde(flatten)]
    pub scenario: ScenarioRequest,
}

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub lines: Vec<StoryLine>,
}

#[derive(Debug, Serialize)]
pub struct ChainBarrier {
    #[serde(flatten)]
    pub entry: ChainEntry,
    pub failed: bool,
    pub degradation_controls: Vec<DegradationControl>,
}

#[derive(Debug, Serialize)]
pub struct ChainView {
    /// Threat for prevention chains, consequence for mitigation chains.
    pub from: ChainEntry,
    pub barriers: Vec<ChainBarrier>,
    pub reaches_top_event: bool,
}

#[derive(Debug, Serialize)]
pub struct ChainsResponse {
    pub top_event: Option<ChainEntry>,
    pub prevention: Vec<ChainView>,
    pub mitigation: Vec<ChainView>,
}

impl ChainsResponse {
    pub fn build(diagram: &Diagram, failed: &HashSet<String>) -> Self {
        let graph = BowtieGraph::new(diagram);
        let (prevention, mitigation) = graph.all_chains();

        let view = |(start, chain): (&Node, BarrierChain)| ChainView {
            from: start.into(),
            reaches_top_event: chain.reaches_top_event,
            barriers: chain
                .barriers
                .into_iter()
                .map(|entry| ChainBarrier {
                    failed: failed.contains(&entry.id),
                    degradation_controls: graph.degradation_of(&entry.id),
                    entry,
                })
                .collect(),
        };

        ChainsResponse {
            top_event: diagram.top_event().map(ChainEntry::from),
            prevention: prevention.into_iter().map(view).collect(),
            mitigation: mitigation.into_iter().map(view).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RiskResponse {
    pub nodes: Vec<NodeRisk>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub story: Vec<StoryLine>,
    pub chains: ChainsResponse,
    pub risk: Vec<NodeRisk>,
}
