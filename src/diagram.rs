//! Mermaid diagram derivation from parsed phases.

use crate::plan::{Diagram, Phase};

/// Build the left-to-right phase-flow diagram: one node per phase in array
/// order, one edge between each consecutive pair.
pub fn generate_phase_flow_diagram(phases: &[Phase]) -> Diagram {
    let mut lines = vec!["graph LR".to_string()];

    for phase in phases {
        lines.push(format!(
            "  P{}[\"Phase {}: {}\"]",
            phase.number, phase.number, phase.name
        ));
    }
    for pair in phases.windows(2) {
        lines.push(format!("  P{} --> P{}", pair[0].number, pair[1].number));
    }

    Diagram {
        id: "phase-flow".to_string(),
        title: "Implementation Flow".to_string(),
        diagram_type: "flowchart".to_string(),
        mermaid_code: lines.join("\n"),
    }
}
