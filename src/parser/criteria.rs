//! Bullet-list to success-criterion conversion.

use crate::lexer::Token;
use crate::plan::Criterion;
use regex::Regex;

/// Which criteria bucket an extraction call feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionKind {
    Automated,
    Manual,
}

impl CriterionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CriterionKind::Automated => "automated",
            CriterionKind::Manual => "manual",
        }
    }
}

/// Convert every bullet item in `tokens` into a criterion.
///
/// An item ending in a backtick-quoted command is split into text and
/// command, keeping a trailing colon on the text. Ids restart at 1 for each
/// call.
pub fn parse_criteria(tokens: &[Token], kind: CriterionKind) -> Vec<Criterion> {
    let Some(command_re) = Regex::new(r":\s*`([^`]+)`\s*$").ok() else {
        return Vec::new();
    };

    let mut criteria = Vec::new();
    for token in tokens {
        let Token::List { items, .. } = token else {
            continue;
        };
        for item in items {
            let text = item.trim();
            let id = format!("{}-{}", kind.as_str(), criteria.len() + 1);
            match command_re.captures(text).and_then(|caps| {
                Some((caps.get(0)?.start(), caps.get(1)?.as_str().to_string()))
            }) {
                Some((split_at, command)) => criteria.push(Criterion {
                    id,
                    text: format!("{}:", text[..split_at].trim_end()),
                    command: Some(command),
                }),
                None => criteria.push(Criterion {
                    id,
                    text: text.to_string(),
                    command: None,
                }),
            }
        }
    }
    criteria
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn list_tokens(markdown: &str) -> Vec<Token> {
        // Heading keeps the lexer from discarding the list as preamble.
        tokenize(&format!("# T\n\n{markdown}"))
            .into_iter()
            .filter(|t| matches!(t, Token::List { .. }))
            .collect()
    }

    #[test]
    fn test_item_with_trailing_command_is_split() {
        let tokens = list_tokens("- Tests pass: `npm test -- grid`\n");
        let criteria = parse_criteria(&tokens, CriterionKind::Automated);
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].id, "automated-1");
        assert_eq!(criteria[0].text, "Tests pass:");
        assert_eq!(criteria[0].command.as_deref(), Some("npm test -- grid"));
    }

    #[test]
    fn test_item_without_command_keeps_full_text() {
        let tokens = list_tokens("- Layout looks right on wide screens\n");
        let criteria = parse_criteria(&tokens, CriterionKind::Manual);
        assert_eq!(criteria[0].id, "manual-1");
        assert_eq!(criteria[0].text, "Layout looks right on wide screens");
        assert!(criteria[0].command.is_none());
    }

    #[test]
    fn test_ids_restart_per_extraction_call() {
        let tokens = list_tokens("- a\n- b\n");
        let first = parse_criteria(&tokens, CriterionKind::Manual);
        let second = parse_criteria(&tokens, CriterionKind::Manual);
        assert_eq!(first[1].id, "manual-2");
        assert_eq!(second[0].id, "manual-1");
    }

    #[test]
    fn test_non_list_tokens_are_ignored() {
        let tokens = tokenize("# T\n\njust a paragraph\n");
        assert!(parse_criteria(&tokens, CriterionKind::Manual).is_empty());
    }
}
