//! Per-phase file-change extraction.
//!
//! Two strategies, tried in order by the phase parser: heading-based change
//! sections ("#### 1. Name" blocks) and, when those yield nothing, bullet
//! lists mapping file paths to descriptions.

use crate::lexer::Token;
use crate::parser::ParseContext;
use crate::plan::Change;
use crate::section::{tokens_to_markdown, Section};
use regex::Regex;
use std::path::Path;

/// A file-path token recognized inside a change paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePathMatch {
    pub file_path: String,
    /// Paragraph text with the file token removed.
    pub rest: String,
}

/// Recognize `**File**:`/`**Path**:` (anywhere) or plain `File:`/`Path:`
/// (at the start) followed by a backtick-quoted path and an optional `(new)`
/// suffix.
pub fn extract_file_path(raw: &str) -> Option<FilePathMatch> {
    let bold = Regex::new(r"(?i)\*\*(?:File|Path)\*\*:\s*`([^`]+)`\s*(?:\(new\))?\s*").ok()?;
    if let Some(caps) = bold.captures(raw) {
        let whole = caps.get(0)?;
        let mut rest = String::with_capacity(raw.len());
        rest.push_str(&raw[..whole.start()]);
        rest.push_str(&raw[whole.end()..]);
        return Some(FilePathMatch {
            file_path: caps.get(1)?.as_str().to_string(),
            rest: rest.trim().to_string(),
        });
    }

    let plain = Regex::new(r"(?i)^(?:File|Path):\s*`([^`]+)`\s*(?:\(new\))?\s*").ok()?;
    if let Some(caps) = plain.captures(raw) {
        let whole = caps.get(0)?;
        return Some(FilePathMatch {
            file_path: caps.get(1)?.as_str().to_string(),
            rest: raw[whole.end()..].trim().to_string(),
        });
    }

    None
}

/// Strategy A: one change per "`<N>. <name>`" sub-heading at level 3 or 4.
pub fn changes_from_headings(sections: &[Section], ctx: &mut ParseContext) -> Vec<Change> {
    let (Ok(numbered_name), Ok(component_prefix), Ok(changes_label)) = (
        Regex::new(r"^\d+\.\s*(.+)"),
        Regex::new(r"(?i)^(?:New\s+component:\s*|Update\s+)"),
        Regex::new(r"(?is)\*\*Changes?\*\*:\s*(.*)"),
    ) else {
        return Vec::new();
    };

    let mut changes = Vec::new();
    for section in sections {
        if section.level != 3 && section.level != 4 {
            continue;
        }
        let Some(name_caps) = numbered_name.captures(&section.heading) else {
            continue;
        };
        if section.level == 3 {
            ctx.warn(format!(
                "Change \"{}\" uses h3 instead of h4 — accepted but non-canonical",
                section.heading
            ));
        }

        let component_name = component_prefix
            .replace(name_caps[1].trim(), "")
            .trim()
            .to_string();

        let mut file_path = String::new();
        let mut code_snippet = None;
        let mut code_language = None;
        let mut lines: Vec<String> = Vec::new();

        for token in &section.tokens {
            match token {
                Token::Paragraph { raw } => {
                    if let Some(found) = extract_file_path(raw) {
                        file_path = found.file_path;
                        if !found.rest.is_empty() {
                            lines.push(found.rest);
                        }
                    } else if let Some(caps) = changes_label.captures(raw) {
                        lines.push(caps[1].trim().to_string());
                    } else {
                        lines.push(raw.trim().to_string());
                    }
                }
                Token::Code { text, language, .. } => {
                    code_snippet = Some(text.clone());
                    code_language = language.clone();
                }
                Token::List { .. } => {
                    lines.push(tokens_to_markdown(std::slice::from_ref(token)));
                }
                _ => {}
            }
        }

        let description = lines
            .into_iter()
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        changes.push(Change {
            component_name,
            file_path,
            description,
            code_snippet,
            code_language,
        });
    }
    changes
}

/// Strategy B: bullet items of the form `**path.ext**: description` or
/// `` `path.ext`: description ``. Used only when strategy A found nothing.
pub fn changes_from_list(tokens: &[Token], ctx: &mut ParseContext) -> Vec<Change> {
    let (Ok(bold_path), Ok(backtick_path)) = (
        Regex::new(r"(?s)^\*\*([^*]+\.[a-zA-Z]+)\*\*:\s*(.*)"),
        Regex::new(r"(?s)^`([^`]+\.[a-zA-Z]+)`:\s*(.*)"),
    ) else {
        return Vec::new();
    };

    let mut changes = Vec::new();
    for token in tokens {
        let Token::List { items, .. } = token else {
            continue;
        };
        for item in items {
            let text = item.trim();
            let Some(caps) = bold_path
                .captures(text)
                .or_else(|| backtick_path.captures(text))
            else {
                continue;
            };
            let file_path = caps[1].to_string();
            changes.push(Change {
                component_name: base_name(&file_path),
                file_path,
                description: caps[2].trim().to_string(),
                code_snippet: None,
                code_language: None,
            });
        }
    }

    if !changes.is_empty() {
        ctx.warn("Changes parsed from list format — non-canonical");
    }
    changes
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
