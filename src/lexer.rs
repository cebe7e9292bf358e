//! Block-level markdown tokenization.
//!
//! Wraps the tree-sitter-md grammar and flattens its nested section tree into
//! a flat stream of block tokens. Downstream extraction only inspects heading,
//! paragraph, code, and list semantics; every other block kind is carried as
//! raw text so section bodies reconstruct without loss.

use tracing::warn;
use tree_sitter::Node;

/// One block-level token from the markdown source.
///
/// The parser depends on this union, never on the lexer's own node shapes, so
/// the tokenizer can be swapped without touching the extraction cascade.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An ATX or setext heading with its depth (1-6) and inline text.
    Heading { level: u8, text: String, raw: String },
    /// A paragraph, kept raw so inline markers stay matchable.
    Paragraph { raw: String },
    /// A fenced or indented code block.
    Code {
        text: String,
        language: Option<String>,
        raw: String,
    },
    /// A bullet or ordered list; one entry per top-level item, marker stripped.
    List { items: Vec<String>, raw: String },
    /// Any other block (quote, table, break). Carried for reconstruction only.
    Other { raw: String },
}

impl Token {
    /// Raw source text of the block, trailing whitespace trimmed.
    pub fn raw(&self) -> &str {
        match self {
            Token::Heading { raw, .. }
            | Token::Paragraph { raw }
            | Token::Code { raw, .. }
            | Token::List { raw, .. }
            | Token::Other { raw } => raw,
        }
    }
}

/// Tokenize markdown into block tokens.
///
/// Never fails: if the grammar cannot be loaded or the parse yields no tree,
/// an empty stream is returned and the condition is logged.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut parser = tree_sitter::Parser::new();
    if parser
        .set_language(&tree_sitter_md::LANGUAGE.into())
        .is_err()
    {
        warn!("markdown grammar failed to load; returning empty token stream");
        return Vec::new();
    }

    let Some(tree) = parser.parse(source, None) else {
        warn!("markdown tokenizer produced no tree; returning empty token stream");
        return Vec::new();
    };

    let mut tokens = Vec::new();
    collect_blocks(tree.root_node(), source, &mut tokens);
    tokens
}

// tree-sitter-md nests blocks inside `section` nodes keyed by heading level;
// recurse through those so tokens come out in flat document order.
fn collect_blocks(node: Node, source: &str, out: &mut Vec<Token>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "section" => collect_blocks(child, source, out),
            "atx_heading" => out.push(atx_heading(child, source)),
            "setext_heading" => out.push(setext_heading(child, source)),
            "paragraph" => out.push(Token::Paragraph {
                raw: raw_text(child, source),
            }),
            "fenced_code_block" => out.push(fenced_code(child, source)),
            "indented_code_block" => out.push(indented_code(child, source)),
            "list" => out.push(list(child, source)),
            "block_quote" | "pipe_table" | "html_block" | "thematic_break"
            | "link_reference_definition" => out.push(Token::Other {
                raw: raw_text(child, source),
            }),
            _ => {}
        }
    }
}

fn raw_text(node: Node, source: &str) -> String {
    source[node.byte_range()].trim_end().to_string()
}

fn atx_heading(node: Node, source: &str) -> Token {
    let mut level = 1u8;
    let mut text = String::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "atx_h1_marker" => level = 1,
            "atx_h2_marker" => level = 2,
            "atx_h3_marker" => level = 3,
            "atx_h4_marker" => level = 4,
            "atx_h5_marker" => level = 5,
            "atx_h6_marker" => level = 6,
            "inline" => text = source[child.byte_range()].trim().to_string(),
            _ => {}
        }
    }
    Token::Heading {
        level,
        text,
        raw: raw_text(node, source),
    }
}

fn setext_heading(node: Node, source: &str) -> Token {
    let mut level = 1u8;
    let mut text = String::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "setext_h1_underline" => level = 1,
            "setext_h2_underline" => level = 2,
            "paragraph" => text = source[child.byte_range()].trim().to_string(),
            _ => {}
        }
    }
    Token::Heading {
        level,
        text,
        raw: raw_text(node, source),
    }
}

fn fenced_code(node: Node, source: &str) -> Token {
    let mut language = None;
    let mut text = String::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "info_string" => {
                let info = source[child.byte_range()].trim();
                if !info.is_empty() {
                    language = Some(info.to_string());
                }
            }
            "code_fence_content" => {
                text = source[child.byte_range()]
                    .trim_end_matches('\n')
                    .to_string();
            }
            _ => {}
        }
    }
    Token::Code {
        text,
        language,
        raw: raw_text(node, source),
    }
}

fn indented_code(node: Node, source: &str) -> Token {
    let raw = raw_text(node, source);
    let text = raw
        .lines()
        .map(|line| line.strip_prefix("    ").or_else(|| line.strip_prefix('\t')).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n");
    Token::Code {
        text,
        language: None,
        raw,
    }
}

fn list(node: Node, source: &str) -> Token {
    let mut items = Vec::new();
    let mut cursor = node.walk();
    for item in node.children(&mut cursor) {
        if item.kind() != "list_item" {
            continue;
        }
        // Item text is everything past the marker, nested content included.
        let mut marker_end = item.start_byte();
        let mut item_cursor = item.walk();
        for part in item.children(&mut item_cursor) {
            if part.kind().starts_with("list_marker") {
                marker_end = part.end_byte();
                break;
            }
        }
        items.push(source[marker_end..item.end_byte()].trim().to_string());
    }
    Token::List {
        items,
        raw: raw_text(node, source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_headings_and_paragraphs() {
        let tokens = tokenize("# Title\n\nSome intro text.\n\n## Overview\n\nBody.\n");
        assert_eq!(
            tokens[0],
            Token::Heading {
                level: 1,
                text: "Title".to_string(),
                raw: "# Title".to_string(),
            }
        );
        assert_eq!(
            tokens[1],
            Token::Paragraph {
                raw: "Some intro text.".to_string()
            }
        );
        assert!(matches!(
            &tokens[2],
            Token::Heading { level: 2, text, .. } if text == "Overview"
        ));
    }

    #[test]
    fn test_tokenize_fenced_code() {
        let tokens = tokenize("# T\n\n```typescript\nconst x = 1;\n```\n");
        let code = tokens
            .iter()
            .find(|t| matches!(t, Token::Code { .. }))
            .expect("code token");
        match code {
            Token::Code { text, language, .. } => {
                assert_eq!(text, "const x = 1;");
                assert_eq!(language.as_deref(), Some("typescript"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_tokenize_list_items() {
        let tokens = tokenize("# T\n\n- first item\n- second item: `cmd`\n");
        let list = tokens
            .iter()
            .find(|t| matches!(t, Token::List { .. }))
            .expect("list token");
        match list {
            Token::List { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], "first item");
                assert_eq!(items[1], "second item: `cmd`");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_tokenize_ordered_list() {
        let tokens = tokenize("# T\n\n1. one\n2. two\n");
        match tokens.iter().find(|t| matches!(t, Token::List { .. })) {
            Some(Token::List { items, .. }) => {
                assert_eq!(items, &vec!["one".to_string(), "two".to_string()]);
            }
            _ => panic!("expected list token"),
        }
    }

    #[test]
    fn test_blockquote_preserved_as_other() {
        let tokens = tokenize("# T\n\n> quoted note\n");
        assert!(tokens
            .iter()
            .any(|t| matches!(t, Token::Other { raw } if raw.contains("quoted note"))));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }
}
