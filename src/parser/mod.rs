//! Markdown-to-Plan assembly.
//!
//! The assembler never fails on unexpected structure: every recognized
//! deviation degrades to best-effort extraction plus a warning, and missing
//! sections leave their fields empty.

pub mod changes;
pub mod criteria;
pub mod fields;
pub mod phase;

use crate::diagram::generate_phase_flow_diagram;
use crate::lexer;
use crate::plan::{AdditionalSection, Plan, PlanMeta, SCHEMA_VERSION};
use crate::section::{collect_until_level, find_section, split_into_sections, tokens_to_markdown};
use chrono::Utc;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Per-invocation accumulator for non-fatal parse diagnostics, appended in
/// encounter order.
#[derive(Debug, Default)]
pub struct ParseContext {
    pub warnings: Vec<String>,
}

impl ParseContext {
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("parse warning: {message}");
        self.warnings.push(message);
    }
}

/// A parsed plan plus the deviations recorded along the way.
#[derive(Debug)]
pub struct ParseResult {
    pub plan: Plan,
    pub warnings: Vec<String>,
}

// The named level-2 sections with dedicated Plan fields. Anything else at
// level 2 either becomes a phase or lands in additionalSections.
struct SectionPatterns {
    overview: Regex,
    current_state: Regex,
    key_discoveries: Regex,
    scope: Regex,
    approach: Regex,
    testing: Regex,
    references: Regex,
}

impl SectionPatterns {
    fn compile() -> Option<Self> {
        Some(Self {
            overview: Regex::new(r"(?i)^Overview$").ok()?,
            current_state: Regex::new(r"(?i)^Current\s+State").ok()?,
            key_discoveries: Regex::new(r"(?i)Key\s+Discover").ok()?,
            scope: Regex::new(r"(?i)What\s+We.*NOT\s+Doing").ok()?,
            approach: Regex::new(r"(?i)Implementation\s+Approach").ok()?,
            testing: Regex::new(r"(?i)Testing\s+Strategy").ok()?,
            references: Regex::new(r"(?i)^References$").ok()?,
        })
    }

    fn recognizes(&self, heading: &str) -> bool {
        self.overview.is_match(heading)
            || self.current_state.is_match(heading)
            || self.scope.is_match(heading)
            || self.approach.is_match(heading)
            || self.testing.is_match(heading)
            || self.references.is_match(heading)
    }
}

/// Parse one markdown document into an immutable Plan.
///
/// `version` is passed through from the caller, which owns prior-version
/// lookup. Identical input yields identical output apart from timestamps.
pub fn parse_markdown_to_plan(
    markdown: &str,
    markdown_path: &Path,
    project_dir: &Path,
    version: u32,
) -> ParseResult {
    let mut ctx = ParseContext::default();
    let sections = split_into_sections(lexer::tokenize(markdown));

    let basename = markdown_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let title = sections
        .iter()
        .find(|s| s.level == 1)
        .map(|s| s.heading.clone())
        .unwrap_or_else(|| {
            markdown_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    let date =
        date_from_basename(&basename).unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
    let ticket_ref = ticket_from_basename(&basename);

    let mut overview = String::new();
    let mut current_state = String::new();
    let mut key_discoveries = Vec::new();
    let mut scope_exclusions = Vec::new();
    let mut implementation_approach = String::new();
    let mut testing_strategy = Default::default();
    let mut references = Vec::new();
    let mut additional_sections = Vec::new();

    let phases = phase::parse_phases(&sections, &mut ctx);

    if let Some(patterns) = SectionPatterns::compile() {
        overview = find_section(&sections, &patterns.overview, Some(2))
            .map(|idx| tokens_to_markdown(&sections[idx].tokens))
            .unwrap_or_default();

        // Current State, with its Key Discoveries subtree split out.
        if let Some(cs_idx) = find_section(&sections, &patterns.current_state, Some(2)) {
            let subs = collect_until_level(&sections, cs_idx, 2);
            match subs
                .iter()
                .position(|s| patterns.key_discoveries.is_match(&s.heading))
            {
                Some(kd_pos) => {
                    key_discoveries = fields::parse_key_discoveries(&subs[kd_pos].tokens);
                    let mut before_kd = sections[cs_idx].tokens.clone();
                    for sub in &subs[..kd_pos] {
                        before_kd.extend(sub.tokens.iter().cloned());
                    }
                    current_state = tokens_to_markdown(&before_kd);
                }
                None => current_state = tokens_to_markdown(&sections[cs_idx].tokens),
            }
        }

        scope_exclusions = find_section(&sections, &patterns.scope, Some(2))
            .map(|idx| fields::parse_scope_exclusions(&sections[idx].tokens))
            .unwrap_or_default();

        implementation_approach = find_section(&sections, &patterns.approach, Some(2))
            .map(|idx| tokens_to_markdown(&sections[idx].tokens))
            .unwrap_or_default();

        testing_strategy = find_section(&sections, &patterns.testing, Some(2))
            .map(|idx| fields::parse_testing_strategy(collect_until_level(&sections, idx, 2)))
            .unwrap_or_default();

        references = find_section(&sections, &patterns.references, Some(2))
            .map(|idx| fields::parse_references(&sections[idx].tokens))
            .unwrap_or_default();

        // Unrecognized level-2 sections are carried verbatim, nested
        // sub-headings included, so nothing authored goes missing.
        for (idx, section) in sections.iter().enumerate() {
            if section.level != 2 || patterns.recognizes(&section.heading) {
                continue;
            }
            let consumed_as_phase = phases.iter().any(|p| p.name == section.heading)
                || phase::try_match_phase_heading(&section.heading).is_some();
            if consumed_as_phase {
                continue;
            }

            let mut content = tokens_to_markdown(&section.tokens);
            for sub in collect_until_level(&sections, idx, 2) {
                content.push_str(&format!(
                    "\n\n{} {}\n\n{}",
                    "#".repeat(sub.level as usize),
                    sub.heading,
                    tokens_to_markdown(&sub.tokens)
                ));
            }
            additional_sections.push(AdditionalSection {
                heading: section.heading.clone(),
                content: content.trim().to_string(),
            });
        }
    }

    let diagrams = if phases.is_empty() {
        Vec::new()
    } else {
        vec![generate_phase_flow_diagram(&phases)]
    };

    let now = Utc::now();
    let plan = Plan {
        schema_version: SCHEMA_VERSION,
        meta: PlanMeta {
            title,
            date,
            ticket_ref,
            markdown_path: markdown_path.display().to_string(),
            project_dir: project_dir.display().to_string(),
            version,
            created_at: now,
            updated_at: now,
        },
        overview,
        current_state,
        key_discoveries,
        scope_exclusions,
        implementation_approach,
        phases,
        diagrams,
        testing_strategy,
        references,
        additional_sections,
    };

    ParseResult {
        plan,
        warnings: ctx.warnings,
    }
}

fn date_from_basename(basename: &str) -> Option<String> {
    let re = Regex::new(r"^(\d{4}-\d{2}-\d{2})").ok()?;
    Some(re.captures(basename)?.get(1)?.as_str().to_string())
}

fn ticket_from_basename(basename: &str) -> Option<String> {
    let re = Regex::new(r"(?i)(?:ENG|TASK)-\d+").ok()?;
    Some(re.find(basename)?.as_str().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "\
# Widget Dashboard Implementation Plan

## Overview

Build a widget dashboard with draggable panels.

## Current State

The app ships a static layout with hardcoded panels.

### Key Discoveries

- Dashboard config is static (`src/config/dashboard.ts:15`)
- Panels rerender on every store tick (`src/lib/Panel.svelte:42`)

## What We're NOT Doing

- Mobile responsive layout -- Not in scope for v1
- Theming -- design input pending

## Implementation Approach

Introduce a grid-based layout engine and port panels one by one.

## Phase 1: Grid Layout Engine

### Overview

Stand up the grid primitives.

### Changes Required

#### 1. Grid Component

**File**: `src/lib/components/Grid.svelte`

**Changes**: Add a CSS grid wrapper.

```css
.grid { grid-template-columns: repeat(12, 1fr); }
```

#### 2. Layout Store

**File**: `src/lib/stores/layout.ts`

Track panel positions.

### Success Criteria

#### Automated Verification

- unit tests pass: `npm test -- grid`
- types check: `npm run check`

#### Manual Verification

- panels snap to columns
- no overlap after drag

## Phase 2: Widget System

### Changes Required

#### 1. Widget Registry

**File**: `src/lib/widgets/registry.ts`

Register widget factories.

## Testing Strategy

### Unit Tests

- grid math
- store updates

### Integration Tests

- full dashboard load

### Manual Testing

- drag a widget
- resize a widget
- reload persistence

## References

- docs/adr-004-dashboard.md
- https://example.com/grid-spec
";

    fn parse(markdown: &str, path: &str) -> ParseResult {
        parse_markdown_to_plan(markdown, Path::new(path), Path::new("/project"), 1)
    }

    #[test]
    fn test_canonical_document_end_to_end() {
        let result = parse(CANONICAL, "/plans/dashboard.md");
        let plan = &result.plan;

        assert_eq!(plan.meta.title, "Widget Dashboard Implementation Plan");
        assert!(plan.overview.contains("widget dashboard"));
        assert!(plan.current_state.contains("static layout"));
        assert!(!plan.current_state.contains("Key Discoveries"));
        assert_eq!(plan.key_discoveries.len(), 2);
        assert_eq!(
            plan.key_discoveries[0].code_ref.as_deref(),
            Some("src/config/dashboard.ts:15")
        );
        assert_eq!(plan.scope_exclusions.len(), 2);
        assert_eq!(plan.scope_exclusions[0].title, "Mobile responsive layout");
        assert_eq!(plan.scope_exclusions[0].reason, "Not in scope for v1");
        assert!(plan.implementation_approach.contains("grid-based layout"));

        assert_eq!(plan.phases.len(), 2);
        let phase1 = &plan.phases[0];
        assert_eq!(phase1.number, 1);
        assert_eq!(phase1.name, "Grid Layout Engine");
        assert!(phase1.overview.contains("grid primitives"));
        assert_eq!(phase1.changes.len(), 2);
        assert_eq!(phase1.changes[0].component_name, "Grid Component");
        assert_eq!(phase1.changes[0].file_path, "src/lib/components/Grid.svelte");
        assert!(phase1.changes[0]
            .code_snippet
            .as_deref()
            .unwrap_or_default()
            .contains("grid-template-columns"));
        assert_eq!(phase1.success_criteria.automated.len(), 2);
        assert_eq!(
            phase1.success_criteria.automated[0].command.as_deref(),
            Some("npm test -- grid")
        );
        assert_eq!(phase1.success_criteria.manual.len(), 2);

        assert_eq!(plan.diagrams.len(), 1);
        let mermaid = &plan.diagrams[0].mermaid_code;
        assert!(mermaid.contains("P1"));
        assert!(mermaid.contains("P2"));
        assert!(mermaid.contains("P1 --> P2"));

        assert_eq!(plan.testing_strategy.unit.len(), 2);
        assert_eq!(plan.testing_strategy.integration.len(), 1);
        assert_eq!(plan.testing_strategy.manual.len(), 3);
        assert_eq!(plan.references.len(), 2);

        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_reparse_is_deterministic_apart_from_timestamps() {
        let a = parse(CANONICAL, "/plans/dashboard.md").plan;
        let b = parse(CANONICAL, "/plans/dashboard.md").plan;
        assert_eq!(a.phases, b.phases);
        assert_eq!(a.overview, b.overview);
        assert_eq!(a.current_state, b.current_state);
        assert_eq!(a.diagrams, b.diagrams);
        assert_eq!(a.additional_sections, b.additional_sections);
    }

    #[test]
    fn test_minimal_document_parses_clean() {
        let markdown = "\
# Fix Login Bug

## Phase 1: Patch Session Check

### Changes Required

#### 1. Auth Guard

**File**: `src/auth.ts`

Treat expired tokens as anonymous.
";
        let result = parse(markdown, "/plans/fix-login.md");
        let plan = &result.plan;
        assert_eq!(plan.meta.title, "Fix Login Bug");
        assert_eq!(plan.phases.len(), 1);
        assert_eq!(plan.phases[0].changes.len(), 1);
        assert_eq!(plan.phases[0].changes[0].file_path, "src/auth.ts");
        assert!(plan.phases[0].success_criteria.automated.is_empty());
        assert!(plan.phases[0].success_criteria.manual.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_title_falls_back_to_basename() {
        let result = parse("plain text, no headings\n", "/plans/2025-03-01-notes.md");
        assert_eq!(result.plan.meta.title, "2025-03-01-notes");
        assert!(result.plan.phases.is_empty());
        assert!(result.plan.diagrams.is_empty());
    }

    #[test]
    fn test_date_and_ticket_from_basename() {
        let result = parse("# T\n", "/plans/2025-06-01-eng-1234-cache.md");
        assert_eq!(result.plan.meta.date, "2025-06-01");
        assert_eq!(result.plan.meta.ticket_ref.as_deref(), Some("ENG-1234"));
    }

    #[test]
    fn test_date_falls_back_to_today() {
        let result = parse("# T\n", "/plans/cache.md");
        assert_eq!(
            result.plan.meta.date,
            Utc::now().format("%Y-%m-%d").to_string()
        );
        assert!(result.plan.meta.ticket_ref.is_none());
    }

    #[test]
    fn test_additional_sections_preserved() {
        let markdown = "\
# T

## Overview

ov

## Rollback Strategy

Revert the feature flag.

### Data Migration

Down-migrate with the saved snapshot.
";
        let result = parse(markdown, "/plans/t.md");
        let extra = &result.plan.additional_sections;
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].heading, "Rollback Strategy");
        assert!(extra[0].content.contains("Revert the feature flag."));
        assert!(extra[0].content.contains("### Data Migration"));
        assert!(extra[0].content.contains("Down-migrate"));
    }

    #[test]
    fn test_dialect_warnings_surface_in_order() {
        let markdown = "\
# T

## Step 1: Setup ORM

### File Changes

- **src/db/schema.ts**: define tables

## Step 2: Wire Queries

### File Changes

- **src/db/queries.ts**: add query layer
";
        let result = parse(markdown, "/plans/t.md");
        assert_eq!(result.plan.phases.len(), 2);
        assert_eq!(result.plan.phases[0].changes.len(), 1);
        assert!(result.warnings.iter().any(|w| w.contains("step")));
        assert!(result.warnings.iter().any(|w| w.contains("list format")));
        // Phase 1's variant warning precedes its extraction warnings.
        let step_pos = result
            .warnings
            .iter()
            .position(|w| w.contains("Step 1"))
            .unwrap();
        let list_pos = result
            .warnings
            .iter()
            .position(|w| w.contains("list format"))
            .unwrap();
        assert!(step_pos < list_pos);
    }

    #[test]
    fn test_version_passes_through() {
        let versioned =
            parse_markdown_to_plan("# T\n", Path::new("/plans/t.md"), Path::new("/p"), 7);
        assert_eq!(versioned.plan.meta.version, 7);
        assert_eq!(versioned.plan.schema_version, 1);
    }
}
