//! Phase heading classification and per-phase extraction.
//!
//! Heading recognition is an ordered table of independent matcher rules so
//! the cascade priority stays auditable and each rule tests on its own; new
//! authoring dialects slot in as new table rows.

use crate::parser::changes::{changes_from_headings, changes_from_list};
use crate::parser::criteria::{parse_criteria, CriterionKind};
use crate::parser::ParseContext;
use crate::plan::{Change, Phase, SubItem, SuccessCriteria};
use crate::section::{collect_until_level, tokens_to_markdown, Section};
use regex::Regex;

/// How a heading was recognized as a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseVariant {
    Canonical,
    Dash,
    Step,
    Task,
    Unnumbered,
}

impl PhaseVariant {
    pub fn label(self) -> &'static str {
        match self {
            PhaseVariant::Canonical => "canonical",
            PhaseVariant::Dash => "dash",
            PhaseVariant::Step => "step",
            PhaseVariant::Task => "task",
            PhaseVariant::Unnumbered => "unnumbered",
        }
    }
}

/// A successful phase-heading classification.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseHeadingMatch {
    pub number: u32,
    pub name: String,
    pub variant: PhaseVariant,
}

/// Ordered heading rules; first hit wins.
const HEADING_RULES: [(PhaseVariant, &str); 4] = [
    (PhaseVariant::Canonical, r"(?i)^Phase\s+(\d+):\s*(.+)"),
    (PhaseVariant::Dash, r"(?i)^Phase\s+(\d+)\s*[-–—]\s*(.+)"),
    (PhaseVariant::Step, r"(?i)^Step\s+(\d+):\s*(.+)"),
    (PhaseVariant::Task, r"(?i)^Task\s+(\d+):\s*(.+)"),
];

/// Try the heading rule cascade against one heading.
pub fn try_match_phase_heading(heading: &str) -> Option<PhaseHeadingMatch> {
    HEADING_RULES.iter().find_map(|(variant, pattern)| {
        let re = Regex::new(pattern).ok()?;
        let caps = re.captures(heading)?;
        Some(PhaseHeadingMatch {
            number: caps.get(1)?.as_str().parse().ok()?,
            name: caps.get(2)?.as_str().trim().to_string(),
            variant: *variant,
        })
    })
}

/// Top-level section headings that must never be promoted to phases.
const KNOWN_SECTION_PATTERNS: [&str; 10] = [
    r"(?i)^Overview$",
    r"(?i)^Current\s+State",
    r"(?i)What\s+We.*NOT\s+Doing",
    r"(?i)Implementation\s+Approach",
    r"(?i)Testing\s+Strategy",
    r"(?i)^References$",
    r"(?i)^Context$",
    r"(?i)^Verification$",
    r"(?i)^Version$",
    r"(?i)^Summary$",
];

pub fn known_section_patterns() -> Vec<Regex> {
    KNOWN_SECTION_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
}

struct PhasePatterns {
    changes_heading: Regex,
    changes_canonical: Regex,
    criteria_heading: Regex,
    criteria_canonical: Regex,
    automated: Regex,
    manual: Regex,
    numbered: Regex,
    phase_overview: Regex,
    recognized: Regex,
    sub_item: Regex,
}

impl PhasePatterns {
    fn compile() -> Option<Self> {
        Some(Self {
            changes_heading: Regex::new(
                r"(?i)^(?:Changes\s+Required|Changes|File\s+Changes|Modifications):?$",
            )
            .ok()?,
            changes_canonical: Regex::new(r"(?i)^Changes\s+Required").ok()?,
            criteria_heading: Regex::new(r"(?i)^(?:Success\s+Criteria|Criteria|Verification):?$")
                .ok()?,
            criteria_canonical: Regex::new(r"(?i)^Success\s+Criteria").ok()?,
            automated: Regex::new(r"(?i)Automated\s+Verification").ok()?,
            manual: Regex::new(r"(?i)Manual\s+Verification").ok()?,
            numbered: Regex::new(r"^\d+\.\s").ok()?,
            phase_overview: Regex::new(r"(?i)^Overview$").ok()?,
            recognized: Regex::new(
                r"(?i)^(Overview|Changes\s+Required|Changes|File\s+Changes|Modifications|Automated\s+Verification|Manual\s+Verification|Success\s+Criteria|Criteria|Verification):?$",
            )
            .ok()?,
            sub_item: Regex::new(r"(?i)^(\d+)([a-z])\.\s+(.+)").ok()?,
        })
    }
}

/// Parse phases across the full section list in document order.
///
/// Explicit headings are matched by the rule cascade at level 2 (canonical)
/// or level 3 (tolerated, warned). An unmatched level-2 heading off the
/// denylist is still promoted when its subtree carries a changes heading, a
/// criteria heading, or a numbered sub-heading. The auto-number counter is
/// resynchronized to `matched + 1` after every phase so later explicit
/// numbering realigns subsequent auto-numbers.
pub fn parse_phases(sections: &[Section], ctx: &mut ParseContext) -> Vec<Phase> {
    let Some(patterns) = PhasePatterns::compile() else {
        return Vec::new();
    };
    let known = known_section_patterns();

    let mut phases: Vec<Phase> = Vec::new();
    let mut auto_number: u32 = 1;

    for (idx, section) in sections.iter().enumerate() {
        if section.level != 2 && section.level != 3 {
            continue;
        }

        let mut matched = try_match_phase_heading(&section.heading);

        if matched.is_some() {
            if section.level == 3 {
                ctx.warn(format!(
                    "Phase \"{}\" uses h3 instead of h2 — accepted but non-canonical",
                    section.heading
                ));
            }
        } else {
            // Unnumbered heuristic applies to level-2 headings only.
            if section.level != 2 {
                continue;
            }
            if known.iter().any(|re| re.is_match(&section.heading)) {
                continue;
            }
            if !looks_like_phase(sections, idx, &patterns) {
                continue;
            }
            matched = Some(PhaseHeadingMatch {
                number: auto_number,
                name: section.heading.clone(),
                variant: PhaseVariant::Unnumbered,
            });
        }

        let Some(matched) = matched else { continue };

        match matched.variant {
            PhaseVariant::Canonical => {}
            PhaseVariant::Unnumbered => ctx.warn(format!(
                "Unnumbered heading \"{}\" treated as Phase {}",
                section.heading, matched.number
            )),
            other => ctx.warn(format!(
                "Phase \"{}\" uses non-canonical format ({}) — accepted",
                section.heading,
                other.label()
            )),
        }

        let number = matched.number;
        if phases.iter().any(|p| p.number == number) {
            // Retained in document order; ids collide and the first wins for
            // id-based lookups.
            ctx.warn(format!(
                "Duplicate phase number {} for \"{}\" — kept in document order",
                number, section.heading
            ));
        }
        let id = format!("phase-{number}");
        auto_number = number + 1;

        let subtree = collect_until_level(sections, idx, section.level);

        let overview = subtree
            .iter()
            .find(|s| patterns.phase_overview.is_match(&s.heading))
            .map(|s| tokens_to_markdown(&s.tokens))
            .unwrap_or_default();

        let changes = extract_changes(sections, idx, subtree, number, &patterns, ctx);
        let success_criteria = extract_criteria(sections, idx, subtree, number, &patterns, ctx);
        let (content, sub_items) =
            extract_body(section, subtree, number, &id, &patterns);

        phases.push(Phase {
            id,
            number,
            name: matched.name,
            overview,
            content,
            sub_items,
            changes,
            success_criteria,
        });
    }

    phases
}

// Unnumbered-phase heuristic: the subtree must look like phase content.
fn looks_like_phase(sections: &[Section], idx: usize, patterns: &PhasePatterns) -> bool {
    let subtree = collect_until_level(sections, idx, 2);
    let has_changes = subtree
        .iter()
        .any(|s| patterns.changes_heading.is_match(&s.heading));
    let has_criteria = subtree.iter().any(|s| {
        patterns.criteria_heading.is_match(&s.heading)
            || patterns.automated.is_match(&s.heading)
            || patterns.manual.is_match(&s.heading)
    });
    let has_numbered = subtree
        .iter()
        .any(|s| (s.level == 3 || s.level == 4) && patterns.numbered.is_match(&s.heading));
    has_changes || has_criteria || has_numbered
}

fn extract_changes(
    sections: &[Section],
    phase_idx: usize,
    subtree: &[Section],
    number: u32,
    patterns: &PhasePatterns,
    ctx: &mut ParseContext,
) -> Vec<Change> {
    let Some(pos) = subtree
        .iter()
        .position(|s| patterns.changes_heading.is_match(&s.heading))
    else {
        return Vec::new();
    };
    let changes_section = &subtree[pos];

    if !patterns.changes_canonical.is_match(&changes_section.heading) {
        ctx.warn(format!(
            "Phase {}: \"{}\" used instead of \"Changes Required\" — accepted",
            number, changes_section.heading
        ));
    }

    // Heading-based first; bullet-list fallback only when that found nothing.
    let change_subs = collect_until_level(sections, phase_idx + 1 + pos, changes_section.level);
    let mut changes = changes_from_headings(change_subs, ctx);
    if changes.is_empty() {
        changes = changes_from_list(&changes_section.tokens, ctx);
    }
    changes
}

fn extract_criteria(
    sections: &[Section],
    phase_idx: usize,
    subtree: &[Section],
    number: u32,
    patterns: &PhasePatterns,
    ctx: &mut ParseContext,
) -> SuccessCriteria {
    let criteria_pos = subtree
        .iter()
        .position(|s| patterns.criteria_heading.is_match(&s.heading));
    let criteria_subs: &[Section] = match criteria_pos {
        Some(pos) => collect_until_level(sections, phase_idx + 1 + pos, subtree[pos].level),
        None => &[],
    };

    if let Some(pos) = criteria_pos {
        let heading = &subtree[pos].heading;
        if !patterns.criteria_canonical.is_match(heading) {
            ctx.warn(format!(
                "Phase {}: \"{}\" used instead of \"Success Criteria\" — accepted",
                number, heading
            ));
        }
    }

    let find = |pattern: &Regex| {
        criteria_subs
            .iter()
            .find(|s| pattern.is_match(&s.heading))
            .or_else(|| subtree.iter().find(|s| pattern.is_match(&s.heading)))
    };

    let automated = find(&patterns.automated)
        .map(|s| parse_criteria(&s.tokens, CriterionKind::Automated))
        .unwrap_or_default();
    let mut manual = find(&patterns.manual)
        .map(|s| parse_criteria(&s.tokens, CriterionKind::Manual))
        .unwrap_or_default();

    // A bare criteria section with no Automated/Manual split: everything is
    // treated as a manual criterion.
    if let Some(pos) = criteria_pos {
        if automated.is_empty() && manual.is_empty() && criteria_subs.is_empty() {
            manual = parse_criteria(&subtree[pos].tokens, CriterionKind::Manual);
        }
    }

    SuccessCriteria { automated, manual }
}

fn extract_body(
    section: &Section,
    subtree: &[Section],
    number: u32,
    phase_id: &str,
    patterns: &PhasePatterns,
) -> (Option<String>, Vec<SubItem>) {
    let mut content_parts: Vec<String> = Vec::new();
    let mut sub_items: Vec<SubItem> = Vec::new();

    let direct = tokens_to_markdown(&section.tokens);
    if !direct.is_empty() {
        content_parts.push(direct);
    }

    for sub in subtree {
        if patterns.recognized.is_match(&sub.heading) {
            continue;
        }

        let sub_item = patterns.sub_item.captures(&sub.heading).and_then(|caps| {
            if caps.get(1)?.as_str().parse::<u32>().ok()? != number {
                return None;
            }
            let letter = caps.get(2)?.as_str().to_lowercase();
            Some(SubItem {
                id: format!("{phase_id}-{letter}"),
                letter,
                name: caps.get(3)?.as_str().trim().to_string(),
                content: tokens_to_markdown(&sub.tokens),
            })
        });

        match sub_item {
            Some(item) => sub_items.push(item),
            None => content_parts.push(format!(
                "### {}\n\n{}",
                sub.heading,
                tokens_to_markdown(&sub.tokens)
            )),
        }
    }

    let joined = content_parts.join("\n\n").trim().to_string();
    ((!joined.is_empty()).then_some(joined), sub_items)
}
