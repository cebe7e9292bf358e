//! Structural comparison of two Plan snapshots.
//!
//! Prose sections compare as concatenated text; phases match by id and
//! compare through a stable serialized form. Any two well-formed Plans are
//! diffable; there are no fatal conditions here.

use crate::plan::{Phase, Plan};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of comparing one section across two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
    Unchanged,
}

/// One section-level difference between two Plan snapshots.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionDiff {
    pub section: String,

    pub status: DiffStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

/// Compare two Plans field by field. `unchanged` entries are filtered out,
/// so identical plans diff to an empty list.
pub fn diff_plans(old: &Plan, new: &Plan) -> Vec<SectionDiff> {
    let mut diffs = vec![
        diff_field("Overview", &old.overview, &new.overview),
        diff_field("Current State", &old.current_state, &new.current_state),
        diff_field(
            "Implementation Approach",
            &old.implementation_approach,
            &new.implementation_approach,
        ),
        diff_field(
            "Key Discoveries",
            &discoveries_text(old),
            &discoveries_text(new),
        ),
        diff_field(
            "Scope Exclusions",
            &exclusions_text(old),
            &exclusions_text(new),
        ),
    ];

    for phase in &new.phases {
        let section = format!("Phase {}: {}", phase.number, phase.name);
        match old.phases.iter().find(|p| p.id == phase.id) {
            Some(old_phase) => diffs.push(diff_field(
                &section,
                &phase_to_string(old_phase),
                &phase_to_string(phase),
            )),
            None => diffs.push(SectionDiff {
                section,
                status: DiffStatus::Added,
                old_value: None,
                new_value: Some(phase_to_string(phase)),
            }),
        }
    }
    for phase in &old.phases {
        if !new.phases.iter().any(|p| p.id == phase.id) {
            diffs.push(SectionDiff {
                section: format!("Phase {}: {}", phase.number, phase.name),
                status: DiffStatus::Removed,
                old_value: Some(phase_to_string(phase)),
                new_value: None,
            });
        }
    }

    diffs.push(diff_field(
        "Testing Strategy",
        &testing_text(old),
        &testing_text(new),
    ));

    diffs.retain(|d| d.status != DiffStatus::Unchanged);
    diffs
}

fn diff_field(section: &str, old: &str, new: &str) -> SectionDiff {
    let (status, old_value, new_value) = if old.is_empty() && !new.is_empty() {
        (DiffStatus::Added, None, Some(new.to_string()))
    } else if !old.is_empty() && new.is_empty() {
        (DiffStatus::Removed, Some(old.to_string()), None)
    } else if old != new {
        (
            DiffStatus::Changed,
            Some(old.to_string()),
            Some(new.to_string()),
        )
    } else {
        (DiffStatus::Unchanged, None, None)
    };
    SectionDiff {
        section: section.to_string(),
        status,
        old_value,
        new_value,
    }
}

fn discoveries_text(plan: &Plan) -> String {
    plan.key_discoveries
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn exclusions_text(plan: &Plan) -> String {
    plan.scope_exclusions
        .iter()
        .map(|e| format!("{}: {}", e.title, e.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

fn testing_text(plan: &Plan) -> String {
    let strategy = &plan.testing_strategy;
    strategy
        .unit
        .iter()
        .chain(strategy.integration.iter())
        .chain(strategy.manual.iter())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

// Stable text form of a phase for comparison and diff payloads.
fn phase_to_string(phase: &Phase) -> String {
    let mut parts = vec![phase.overview.clone()];
    for change in &phase.changes {
        parts.push(format!(
            "{} ({}): {}",
            change.component_name, change.file_path, change.description
        ));
    }
    parts.push("Automated:".to_string());
    for criterion in &phase.success_criteria.automated {
        match &criterion.command {
            Some(command) => parts.push(format!("  - {} [{}]", criterion.text, command)),
            None => parts.push(format!("  - {}", criterion.text)),
        }
    }
    parts.push("Manual:".to_string());
    for criterion in &phase.success_criteria.manual {
        parts.push(format!("  - {}", criterion.text));
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_markdown_to_plan;
    use std::path::Path;

    fn plan_of(markdown: &str) -> Plan {
        parse_markdown_to_plan(markdown, Path::new("/plans/t.md"), Path::new("/p"), 1).plan
    }

    const BASE: &str = "\
# T

## Overview

Initial overview.

## Phase 1: Setup

### Changes Required

#### 1. Config

**File**: `src/config.rs`

Load settings once.

### Success Criteria

#### Automated Verification

- config tests pass: `cargo test config`
";

    #[test]
    fn test_identical_plans_diff_empty() {
        let plan = plan_of(BASE);
        assert!(diff_plans(&plan, &plan).is_empty());
    }

    #[test]
    fn test_added_phase_yields_one_added_entry() {
        let old = plan_of(BASE);
        let new = plan_of(&format!(
            "{BASE}\n## Phase 2: Polish\n\n### Changes Required\n\n#### 1. Style\n\n**File**: `src/style.rs`\n\nRound the corners.\n"
        ));
        let diffs = diff_plans(&old, &new);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].section, "Phase 2: Polish");
        assert_eq!(diffs[0].status, DiffStatus::Added);
        let added = diffs[0].new_value.as_deref().unwrap();
        assert!(added.contains("Style (src/style.rs): Round the corners."));
        assert!(diffs[0].old_value.is_none());
    }

    #[test]
    fn test_removed_phase_yields_one_removed_entry() {
        let old = plan_of(&format!(
            "{BASE}\n## Phase 2: Polish\n\n### Changes Required\n\n#### 1. Style\n\n**File**: `src/style.rs`\n\nRound the corners.\n"
        ));
        let new = plan_of(BASE);
        let diffs = diff_plans(&old, &new);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].status, DiffStatus::Removed);
        assert!(diffs[0].old_value.is_some());
        assert!(diffs[0].new_value.is_none());
    }

    #[test]
    fn test_changed_overview_and_phase_body() {
        let old = plan_of(BASE);
        let new = plan_of(&BASE.replace("Initial overview.", "Reworked overview.")
            .replace("Load settings once.", "Load settings lazily."));
        let diffs = diff_plans(&old, &new);
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].section, "Overview");
        assert_eq!(diffs[0].status, DiffStatus::Changed);
        assert_eq!(diffs[0].old_value.as_deref(), Some("Initial overview."));
        assert_eq!(diffs[1].section, "Phase 1: Setup");
        assert_eq!(diffs[1].status, DiffStatus::Changed);
    }

    #[test]
    fn test_section_added_when_old_empty() {
        let old = plan_of("# T\n\n## Phase 1: Setup\n\nbody\n");
        let new = plan_of("# T\n\n## Overview\n\nNow present.\n\n## Phase 1: Setup\n\nbody\n");
        let diffs = diff_plans(&old, &new);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].section, "Overview");
        assert_eq!(diffs[0].status, DiffStatus::Added);
    }

    #[test]
    fn test_criteria_serialize_with_bracketed_command() {
        let plan = plan_of(BASE);
        let text = phase_to_string(&plan.phases[0]);
        assert!(text.contains("  - config tests pass: [cargo test config]"));
        assert!(text.contains("Automated:"));
        assert!(text.contains("Manual:"));
    }
}
