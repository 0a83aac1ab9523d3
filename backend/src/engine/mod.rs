pub mod graph;
pub mod narrative;
pub mod report;
pub mod risk;
pub mod types;
pub mod validator;

pub use graph::{BowtieGraph, resolve_mitigation_chain, resolve_prevention_chain};
pub use narrative::build_narrative;
pub use validator::{DiagramError, parse_diagram};
