//! Extraction of the named top-level plan sections.

use crate::lexer::Token;
use crate::plan::{KeyDiscovery, ScopeExclusion, TestingStrategy};
use crate::section::Section;
use regex::Regex;

/// Key Discoveries bullets, with a trailing `` `file:line` `` reference
/// (optionally parenthesized) split off the text.
pub fn parse_key_discoveries(tokens: &[Token]) -> Vec<KeyDiscovery> {
    let Some(code_ref) = Regex::new(r"\(?`([^`]+:\d+[^`]*)`\)?$").ok() else {
        return Vec::new();
    };

    let mut discoveries = Vec::new();
    for token in tokens {
        let Token::List { items, .. } = token else {
            continue;
        };
        for item in items {
            let text = item.trim();
            match code_ref
                .captures(text)
                .and_then(|caps| Some((caps.get(0)?.start(), caps.get(1)?.as_str().to_string())))
            {
                Some((split_at, reference)) => discoveries.push(KeyDiscovery {
                    text: text[..split_at].trim().to_string(),
                    code_ref: Some(reference),
                }),
                None => discoveries.push(KeyDiscovery {
                    text: text.to_string(),
                    code_ref: None,
                }),
            }
        }
    }
    discoveries
}

/// "What We're NOT Doing" bullets, split into title and reason on ` -- ` or
/// an em/en dash. No separator means an empty reason.
pub fn parse_scope_exclusions(tokens: &[Token]) -> Vec<ScopeExclusion> {
    let Some(separator) = Regex::new(r"\s*--\s*|\s*[—–]\s*").ok() else {
        return Vec::new();
    };

    let mut exclusions = Vec::new();
    for token in tokens {
        let Token::List { items, .. } = token else {
            continue;
        };
        for item in items {
            let text = item.trim();
            let parts: Vec<&str> = separator.split(text).collect();
            if parts.len() >= 2 {
                exclusions.push(ScopeExclusion {
                    title: parts[0].trim().to_string(),
                    reason: parts[1..].join(" -- ").trim().to_string(),
                });
            } else {
                exclusions.push(ScopeExclusion {
                    title: text.to_string(),
                    reason: String::new(),
                });
            }
        }
    }
    exclusions
}

/// Unit / Integration-or-E2E / Manual bullet lists from the Testing Strategy
/// subtree.
pub fn parse_testing_strategy(sub_sections: &[Section]) -> TestingStrategy {
    let (Ok(unit), Ok(integration), Ok(manual)) = (
        Regex::new(r"(?i)Unit\s+Tests?"),
        Regex::new(r"(?i)Integration\s+Tests?|E2E\s+Tests?"),
        Regex::new(r"(?i)Manual\s+Test"),
    ) else {
        return TestingStrategy::default();
    };

    let items_of = |pattern: &Regex| -> Vec<String> {
        sub_sections
            .iter()
            .find(|s| pattern.is_match(&s.heading))
            .map(|s| list_items(&s.tokens))
            .unwrap_or_default()
    };

    TestingStrategy {
        unit: items_of(&unit),
        integration: items_of(&integration),
        manual: items_of(&manual),
    }
}

/// References as list items, falling back to bullet-stripped paragraph lines.
pub fn parse_references(tokens: &[Token]) -> Vec<String> {
    let bullet = Regex::new(r"^[-*]\s*").ok();

    let mut references = Vec::new();
    for token in tokens {
        match token {
            Token::List { items, .. } => {
                references.extend(items.iter().map(|item| item.trim().to_string()));
            }
            Token::Paragraph { raw } => {
                for line in raw.lines() {
                    let line = match &bullet {
                        Some(re) => re.replace(line.trim(), "").trim().to_string(),
                        None => line.trim().to_string(),
                    };
                    if !line.is_empty() {
                        references.push(line);
                    }
                }
            }
            _ => {}
        }
    }
    references
}

fn list_items(tokens: &[Token]) -> Vec<String> {
    let mut items = Vec::new();
    for token in tokens {
        if let Token::List { items: entries, .. } = token {
            items.extend(entries.iter().map(|item| item.trim().to_string()));
        }
    }
    items
}
