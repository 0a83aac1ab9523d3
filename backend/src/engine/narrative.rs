// Risk story lines for a diagram under a given set of failed barriers
use crate::engine::types::{Diagram, Node};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Context,
    Threats,
    Effective,
    Failed,
    Consequences,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryLine {
    pub kind: LineKind,
    pub text: String,
}

impl StoryLine {
    fn new(kind: LineKind, text: String) -> Self {
        Self { kind, text }
    }

    pub fn is_warning(&self) -> bool {
        self.kind == LineKind::Failed
    }
}

impl fmt::Display for StoryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_warning() {
            write!(f, "⚠️ {}", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

fn join_labels<'n>(nodes: impl IntoIterator<Item = &'n Node>) -> String {
    nodes
        .into_iter()
        .map(|node| node.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_narrative(
    diagram: &Diagram,
    failed_barrier_ids: &HashSet<String>,
) -> Vec<StoryLine> {
    let view = diagram.flatten();
    let label_or_unknown =
        |node: Option<&Node>| node.map_or(UNKNOWN, |n| n.label.as_str()).to_string();

    let mut lines = vec![StoryLine::new(
        LineKind::Context,
        format!(
            "We are managing the hazard \"{}\" to avoid the top event \"{}\".",
            label_or_unknown(view.hazard),
            label_or_unknown(view.top_event)
        ),
    )];

    if !view.threats.is_empty() {
        lines.push(StoryLine::new(
            LineKind::Threats,
            format!("Primary threats monitored: {}.", join_labels(view.threats.iter().copied())),
        ));
    }

    for (group, barriers) in [
        ("Prevention barriers", &view.prevention_barriers),
        ("Mitigation barriers", &view.mitigation_barriers),
    ] {
        if barriers.is_empty() {
            continue;
        }

        let (failed, effective): (Vec<&Node>, Vec<&Node>) = barriers
            .iter()
            .copied()
            .partition(|barrier| failed_barrier_ids.contains(&barrier.id));

        if !effective.is_empty() {
            lines.push(StoryLine::new(
                LineKind::Effective,
                format!("{} currently effective: {}.", group, join_labels(effective)),
            ));
        }
        if !failed.is_empty() {
            lines.push(StoryLine::new(
                LineKind::Failed,
                format!("{} failed: {}.", group, join_labels(failed)),
            ));
        }
    }

    if !view.consequences.is_empty() {
        lines.push(StoryLine::new(
            LineKind::Consequences,
            format!(
                "If the top event occurs, potential consequences include {}.",
                join_labels(view.consequences.iter().copied())
            ),
        ));
    }

    lines
}
