// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Splits template source into literal text and classified tag tokens.
//!
//! The tokenizer is tolerant: an open marker without a close marker, or a tag
//! body that matches none of the tag grammars, is passed through as text.

use crate::ast::Span;
use crate::error::Error;

/// Delimiter pair that opens and closes a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    open: String,
    close: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            open: "<{".to_string(),
            close: "}>".to_string(),
        }
    }
}

impl Syntax {
    /// Creates a custom delimiter pair. Both markers must be non-empty and
    /// differ from each other.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Result<Self, Error> {
        let open = open.into();
        let close = close.into();
        if open.is_empty() || close.is_empty() {
            return Err(Error::parse("tag delimiters must not be empty", None));
        }
        if open == close {
            return Err(Error::parse(
                format!("open and close delimiters must differ, both are `{open}`"),
                None,
            ));
        }
        Ok(Self { open, close })
    }

    /// Marker that opens a tag.
    pub fn open(&self) -> &str {
        &self.open
    }

    /// Marker that closes a tag.
    pub fn close(&self) -> &str {
        &self.close
    }
}

/// One lexical unit: a run of text or a classified tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Classification and payload.
    pub kind: TokenKind,
    /// Byte range in the source.
    pub span: Span,
    /// Source text of the token, delimiters included for tags.
    pub raw: String,
}

/// Token classification. Expression payloads are the trimmed tag argument.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Literal text, including unrecognized tags.
    Text(String),
    /// `path` or `path | "default"`.
    Variable {
        /// Dotted lookup path.
        path: String,
        /// Text between the quotes after the pipe.
        default: Option<String>,
    },
    /// `if <condition>`.
    If(String),
    /// `elseif <condition>`.
    ElseIf(String),
    /// `else`.
    Else,
    /// `/if`.
    EndIf,
    /// Loop header, everything after the `for` keyword.
    For(String),
    /// `/for`.
    EndFor,
    /// `switch <subject>`.
    Switch(String),
    /// `case <expression>`.
    Case(String),
    /// `default`.
    Default,
    /// `/switch`.
    EndSwitch,
}

impl TokenKind {
    /// Tag keyword used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Text(_) => "text",
            TokenKind::Variable { .. } => "variable",
            TokenKind::If(_) => "if",
            TokenKind::ElseIf(_) => "elseif",
            TokenKind::Else => "else",
            TokenKind::EndIf => "/if",
            TokenKind::For(_) => "for",
            TokenKind::EndFor => "/for",
            TokenKind::Switch(_) => "switch",
            TokenKind::Case(_) => "case",
            TokenKind::Default => "default",
            TokenKind::EndSwitch => "/switch",
        }
    }
}

/// Tokenizes `source` with the default `<{ ... }>` delimiters.
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_with(source, &Syntax::default())
}

/// Tokenizes `source` with a custom delimiter pair.
pub fn tokenize_with(source: &str, syntax: &Syntax) -> Vec<Token> {
    let open = syntax.open.as_str();
    let close = syntax.close.as_str();
    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    while cursor < source.len() {
        let Some(tag_start) = find_from(source, open, cursor) else {
            push_text(&mut tokens, source, cursor, source.len());
            break;
        };
        push_text(&mut tokens, source, cursor, tag_start);

        let body_start = tag_start + open.len();
        // A close marker only counts if it appears before the next open marker.
        let segment_end = find_from(source, open, body_start).unwrap_or(source.len());
        let Some(body_end) = find_from(&source[..segment_end], close, body_start) else {
            push_text(&mut tokens, source, tag_start, segment_end);
            cursor = segment_end;
            continue;
        };

        let tag_end = body_end + close.len();
        let span = Span::new(tag_start, tag_end);
        let raw = &source[tag_start..tag_end];
        let kind = classify_tag(source[body_start..body_end].trim()).unwrap_or_else(|| {
            tracing::trace!(tag = raw, "unrecognized tag passed through as text");
            TokenKind::Text(raw.to_string())
        });
        tokens.push(Token {
            kind,
            span,
            raw: raw.to_string(),
        });
        cursor = tag_end;
    }

    tokens
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack
        .get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|idx| idx + from)
}

fn push_text(tokens: &mut Vec<Token>, source: &str, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let text = &source[start..end];
    tokens.push(Token {
        kind: TokenKind::Text(text.to_string()),
        span: Span::new(start, end),
        raw: text.to_string(),
    });
}

/// Matches a trimmed tag body against the tag grammars in priority order.
fn classify_tag(tag: &str) -> Option<TokenKind> {
    if let Some(expr) = keyword_argument(tag, "if") {
        return Some(TokenKind::If(expr.to_string()));
    }
    if let Some(expr) = keyword_argument(tag, "elseif") {
        return Some(TokenKind::ElseIf(expr.to_string()));
    }
    match tag {
        "else" => return Some(TokenKind::Else),
        "/if" => return Some(TokenKind::EndIf),
        _ => {}
    }
    if let Some(header) = keyword_argument(tag, "for") {
        return Some(TokenKind::For(header.to_string()));
    }
    if tag == "/for" {
        return Some(TokenKind::EndFor);
    }
    if let Some(expr) = keyword_argument(tag, "switch") {
        return Some(TokenKind::Switch(expr.to_string()));
    }
    if let Some(expr) = keyword_argument(tag, "case") {
        return Some(TokenKind::Case(expr.to_string()));
    }
    match tag {
        "default" => return Some(TokenKind::Default),
        "/switch" => return Some(TokenKind::EndSwitch),
        _ => {}
    }
    parse_variable(tag)
}

/// Returns the argument of `<keyword> <argument>`; the keyword must be
/// followed by whitespace and a non-empty argument.
fn keyword_argument<'a>(tag: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = tag.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let argument = rest.trim();
    (!argument.is_empty()).then_some(argument)
}

/// `<dotted.path>` optionally followed by `| "<default>"`.
fn parse_variable(tag: &str) -> Option<TokenKind> {
    let path_len = tag
        .find(|ch: char| !(is_word_char(ch) || ch == '.'))
        .unwrap_or(tag.len());
    let path = &tag[..path_len];
    if !is_dotted_path(path) {
        return None;
    }

    let rest = tag[path_len..].trim();
    if rest.is_empty() {
        return Some(TokenKind::Variable {
            path: path.to_string(),
            default: None,
        });
    }

    let quoted = rest.strip_prefix('|')?.trim();
    let default = quoted.strip_prefix('"')?.strip_suffix('"')?;
    Some(TokenKind::Variable {
        path: path.to_string(),
        default: Some(default.to_string()),
    })
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub(crate) fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_word_char)
}

fn is_dotted_path(path: &str) -> bool {
    path.split('.').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind.clone()).collect()
    }

    fn text(value: &str) -> TokenKind {
        TokenKind::Text(value.to_string())
    }

    #[test]
    fn splits_text_and_tags() {
        let tokens = tokenize("Hi <{ user.name }>!");
        assert_eq!(
            kinds(&tokens),
            vec![
                text("Hi "),
                TokenKind::Variable {
                    path: "user.name".into(),
                    default: None
                },
                text("!"),
            ]
        );
        assert_eq!(tokens[1].span, Span::new(3, 18));
        assert_eq!(tokens[1].raw, "<{ user.name }>");
    }

    #[test]
    fn classifies_control_tags() {
        let tokens = tokenize(
            "<{if a > 1}><{elseif b}><{else}><{/if}><{for i, v in items}><{/for}>\
             <{switch x}><{case 1}><{default}><{/switch}>",
        );
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::If("a > 1".into()),
                TokenKind::ElseIf("b".into()),
                TokenKind::Else,
                TokenKind::EndIf,
                TokenKind::For("i, v in items".into()),
                TokenKind::EndFor,
                TokenKind::Switch("x".into()),
                TokenKind::Case("1".into()),
                TokenKind::Default,
                TokenKind::EndSwitch,
            ]
        );
    }

    #[test]
    fn variable_with_default_literal() {
        let tokens = tokenize(r#"<{ user.missing | "N/A" }>"#);
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Variable {
                path: "user.missing".into(),
                default: Some("N/A".into()),
            }]
        );
    }

    #[test]
    fn unknown_tags_pass_through_verbatim() {
        let tokens = tokenize("a<{ frobnicate the widget }>b<{@x}>");
        assert_eq!(
            kinds(&tokens),
            vec![
                text("a"),
                text("<{ frobnicate the widget }>"),
                text("b"),
                text("<{@x}>"),
            ]
        );
    }

    #[test]
    fn unclosed_marker_is_text_up_to_next_open() {
        let tokens = tokenize("x <{ broken <{ name }> tail <{ never");
        assert_eq!(
            kinds(&tokens),
            vec![
                text("x "),
                text("<{ broken "),
                TokenKind::Variable {
                    path: "name".into(),
                    default: None
                },
                text(" tail "),
                text("<{ never"),
            ]
        );
    }

    #[test]
    fn keywords_need_an_argument() {
        // `if` alone is a plain identifier, as is `for`.
        let tokens = tokenize("<{ if }><{for}>");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Variable {
                    path: "if".into(),
                    default: None
                },
                TokenKind::Variable {
                    path: "for".into(),
                    default: None
                },
            ]
        );
    }

    #[test]
    fn malformed_paths_are_not_variables() {
        for tag in ["<{a..b}>", "<{.a}>", "<{a.}>", "<{a | N/A}>", "<{}>"] {
            assert_eq!(kinds(&tokenize(tag)), vec![text(tag)], "{tag}");
        }
    }

    #[test]
    fn raw_text_reassembles_source() {
        let source = "a <{ x }> b <{ if y }><{ nope <{/if}> <{ tail";
        let rebuilt: String = tokenize(source).iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn custom_syntax() {
        let syntax = Syntax::new("[[", "]]").unwrap();
        let tokens = tokenize_with("<{ a }>[[ b ]]", &syntax);
        assert_eq!(
            kinds(&tokens),
            vec![
                text("<{ a }>"),
                TokenKind::Variable {
                    path: "b".into(),
                    default: None
                },
            ]
        );
        assert!(Syntax::new("%%", "%%").is_err());
        assert!(Syntax::new("", "}}").is_err());
    }
}
