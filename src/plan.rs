//! Typed plan document model.
//!
//! The JSON shape is the contract with rendering and feedback collaborators:
//! camelCase keys, `schemaVersion` literal 1, optional fields omitted when
//! absent, fully round-trippable through serde_json.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Current plan document schema revision.
pub const SCHEMA_VERSION: u32 = 1;

/// Immutable result of one parse call. Never mutated in place: a new Plan
/// wholly replaces the prior one in whatever store the caller keeps.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Document schema revision, always [`SCHEMA_VERSION`].
    pub schema_version: u32,

    pub meta: PlanMeta,

    /// Body of the top-level Overview section.
    #[serde(default)]
    pub overview: String,

    /// Body of the Current State section, minus any Key Discoveries subtree.
    #[serde(default)]
    pub current_state: String,

    #[serde(default)]
    pub key_discoveries: Vec<KeyDiscovery>,

    /// Entries of the "What We're NOT Doing" section.
    #[serde(default)]
    pub scope_exclusions: Vec<ScopeExclusion>,

    #[serde(default)]
    pub implementation_approach: String,

    #[serde(default)]
    pub phases: Vec<Phase>,

    /// Derived diagrams, recomputed on every parse.
    #[serde(default)]
    pub diagrams: Vec<Diagram>,

    #[serde(default)]
    pub testing_strategy: TestingStrategy,

    #[serde(default)]
    pub references: Vec<String>,

    /// Unrecognized level-2 sections, preserved verbatim so no authored
    /// content is silently dropped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_sections: Vec<AdditionalSection>,
}

/// Document identity and provenance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanMeta {
    /// First H1 heading, else the file basename.
    pub title: String,

    /// Leading YYYY-MM-DD from the basename, else the parse date.
    pub date: String,

    /// ENG-/TASK- ticket reference from the basename, uppercased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_ref: Option<String>,

    pub markdown_path: String,

    pub project_dir: String,

    /// Monotonic version supplied by the caller (prior stored version + 1).
    pub version: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// One bullet from the Key Discoveries sub-section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyDiscovery {
    pub text: String,

    /// Trailing `file:line` reference, stripped from the bullet text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_ref: Option<String>,
}

/// One "we are not doing X -- because Y" entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScopeExclusion {
    pub title: String,

    /// Empty when the bullet had no separator.
    #[serde(default)]
    pub reason: String,
}

/// An ordered unit of work within a Plan.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// Derived id, `phase-{number}`.
    pub id: String,

    pub number: u32,

    pub name: String,

    /// Body of the phase's own Overview sub-section.
    #[serde(default)]
    pub overview: String,

    /// Direct body text plus unrecognized sub-sections, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// "1a.", "1b." style sub-headings under the phase.
    #[serde(default)]
    pub sub_items: Vec<SubItem>,

    #[serde(default)]
    pub changes: Vec<Change>,

    #[serde(default)]
    pub success_criteria: SuccessCriteria,
}

/// A lettered sub-item of a phase.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubItem {
    /// Derived id, `{phaseId}-{letter}`.
    pub id: String,

    pub letter: String,

    pub name: String,

    #[serde(default)]
    pub content: String,
}

/// A described modification to one file/component within a phase.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub component_name: String,

    /// Empty when no file token was found in the change body.
    #[serde(default)]
    pub file_path: String,

    #[serde(default)]
    pub description: String,

    /// Last fenced code block in the change section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_language: Option<String>,
}

/// Automated and manual completion conditions for a phase.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessCriteria {
    #[serde(default)]
    pub automated: Vec<Criterion>,

    #[serde(default)]
    pub manual: Vec<Criterion>,
}

/// One verifiable completion condition.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    /// Derived id, `{category}-{n}`, 1-based per extraction call.
    pub id: String,

    pub text: String,

    /// Trailing backtick-quoted command split off the bullet text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// A derived diagram, recomputed on every parse.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: String,

    pub title: String,

    #[serde(rename = "type")]
    pub diagram_type: String,

    pub mermaid_code: String,
}

/// Bullet lists from the Testing Strategy section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestingStrategy {
    #[serde(default)]
    pub unit: Vec<String>,

    #[serde(default)]
    pub integration: Vec<String>,

    #[serde(default)]
    pub manual: Vec<String>,
}

/// An unrecognized level-2 section carried through verbatim.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalSection {
    pub heading: String,

    pub content: String,
}
