use crate::engine::graph::{BarrierChain, BowtieGraph};
use crate::engine::narrative::{UNKNOWN, build_narrative};
use crate::engine::types::{Diagram, Node};
use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use tera::Tera;

// Data structures passed to the report template
#[derive(Serialize)]
struct ReportContext {
    hazard: String,
    top_event: String,
    sections: Vec<Section>,
    story: Vec<String>,
    chains: Vec<ChainLine>,
}

#[derive(Serialize)]
struct Section {
    title: &'static str,
    items: Vec<Item>,
}

#[derive(Serialize)]
struct Item {
    label: String,
    description: Option<String>,
    failed: bool,
}

#[derive(Serialize)]
struct ChainLine {
    path: String,
    complete: bool,
}

fn chain_path(head: &str, chain: &BarrierChain, tail: &str) -> String {
    std::iter::once(head)
        .chain(chain.barriers.iter().map(|entry| entry.label.as_str()))
        .chain(std::iter::once(tail))
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Render the Markdown scenario report for `diagram` under `failed`.
pub fn render_report(diagram: &Diagram, failed: &HashSet<String>) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("report.md", include_str!("../../templates/report.md.j2"))?;

    let view = diagram.flatten();
    let label = |node: Option<&Node>| node.map_or(UNKNOWN, |n| n.label.as_str()).to_string();
    let top_event = label(view.top_event);

    let items = |nodes: &[&Node]| {
        nodes
            .iter()
            .map(|node| Item {
                label: node.label.clone(),
                description: node.description.clone(),
                failed: node.kind.barrier_type().is_some() && failed.contains(&node.id),
            })
            .collect::<Vec<_>>()
    };
    let sections = vec![
        Section {
            title: "Threats",
            items: items(&view.threats),
        },
        Section {
            title: "Prevention Barriers",
            items: items(&view.prevention_barriers),
        },
        Section {
            title: "Mitigation Barriers",
            items: items(&view.mitigation_barriers),
        },
        Section {
            title: "Consequences",
            items: items(&view.consequences),
        },
    ];

    let graph = BowtieGraph::new(diagram);
    let (prevention, mitigation) = graph.all_chains();
    let chains = prevention
        .iter()
        .map(|(threat, chain)| ChainLine {
            path: chain_path(&threat.label, chain, &top_event),
            complete: chain.reaches_top_event,
        })
        .chain(mitigation.iter().map(|(consequence, chain)| ChainLine {
            path: chain_path(&top_event, chain, &consequence.label),
            complete: chain.reaches_top_event,
        }))
        .collect();

    let context = ReportContext {
        hazard: label(view.hazard),
        top_event,
        sections,
        story: build_narrative(diagram, failed)
            .iter()
            .map(ToString::to_string)
            .collect(),
        chains,
    };

    Ok(tera.render("report.md", &tera::Context::from_serialize(&context)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{BarrierStatus, BarrierType, Edge, NodeKind};

    fn diagram() -> Diagram {
        Diagram {
            nodes: vec![
                Node::new("h", NodeKind::Hazard, "Fire"),
                Node::new("te", NodeKind::TopEvent, "Ignition"),
                Node::new("t1", NodeKind::Threat, "Spark"),
                Node::new(
                    "b1",
                    NodeKind::Barrier {
                        barrier_type: BarrierType::Prevention,
                        status: BarrierStatus::Normal,
                    },
                    "Sprinkler",
                )
                .with_description("Ceiling sprinkler heads"),
                Node::new("c1", NodeKind::Consequence, "Burns"),
            ],
            edges: vec![Edge::new("t1", "b1"), Edge::new("b1", "te"), Edge::new("te", "c1")],
        }
    }

    #[test]
    fn report_lists_sections_story_and_chains() {
        let failed: HashSet<String> = ["b1".to_string()].into();
        let report = render_report(&diagram(), &failed).unwrap();

        assert!(report.starts_with("# Bowtie Risk Report"));
        assert!(report.contains("**Hazard**: Fire"));
        assert!(report.contains("## Prevention Barriers"));
        assert!(report.contains("- Sprinkler **(failed)**: Ceiling sprinkler heads"));
        assert!(!report.contains("## Mitigation Barriers"));
        assert!(report.contains("- ⚠️ Prevention barriers failed: Sprinkler."));
        assert!(report.contains("- Spark → Sprinkler → Ignition\n"));
        assert!(report.contains("- Ignition → Burns (incomplete)"));
    }

    #[test]
    fn empty_diagram_renders_placeholders() {
        let report = render_report(&Diagram::default(), &HashSet::new()).unwrap();
        assert!(report.contains("**Top Event**: unknown"));
        assert!(report.contains("_No chains resolved._"));
    }
}
