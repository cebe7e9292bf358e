//! Heading-delimited section segmentation and lookup.

use crate::lexer::Token;
use regex::Regex;

/// A contiguous run of content following one heading.
///
/// Rebuilt on every parse; sections preserve source order and raw text so
/// bodies can be reconstructed verbatim.
#[derive(Debug, Clone)]
pub struct Section {
    /// Heading text without markup symbols.
    pub heading: String,
    /// Heading depth, 1-6.
    pub level: u8,
    /// Block tokens between this heading and the next heading of any level.
    pub tokens: Vec<Token>,
}

/// Group a flat token stream into heading-delimited sections.
///
/// Tokens preceding the first heading are discarded.
pub fn split_into_sections(tokens: Vec<Token>) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for token in tokens {
        match token {
            Token::Heading { level, text, .. } => sections.push(Section {
                heading: text,
                level,
                tokens: Vec::new(),
            }),
            other => {
                if let Some(current) = sections.last_mut() {
                    current.tokens.push(other);
                }
            }
        }
    }
    sections
}

/// Reassemble block tokens into markdown text, blank-line separated.
pub fn tokens_to_markdown(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(Token::raw)
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

/// Index of the first section whose heading matches `pattern`, optionally
/// constrained to an exact level.
pub fn find_section(sections: &[Section], pattern: &Regex, level: Option<u8>) -> Option<usize> {
    sections.iter().position(|s| {
        pattern.is_match(&s.heading) && level.map_or(true, |l| s.level == l)
    })
}

/// The contiguous run of sections after `start` with level strictly greater
/// than `level`: the descendant subtree of the section at `start`.
pub fn collect_until_level(sections: &[Section], start: usize, level: u8) -> &[Section] {
    let mut end = start + 1;
    while end < sections.len() && sections[end].level > level {
        end += 1;
    }
    &sections[start + 1..end]
}
