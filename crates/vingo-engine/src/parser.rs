// SPDX-License-Identifier: Apache-2.0 OR MIT
use crate::ast::{
    Block, ForNode, IfBranch, IfNode, Node, Span, SwitchCase, SwitchNode, TextNode, VariableNode,
};
use crate::error::Error;
use crate::expr::Condition;
use crate::lexer::{self, Token, TokenKind};

/// Builds the node tree for a token stream.
///
/// Each `if`, `for` and `switch` consumes tokens up to and including its own
/// closing tag before returning to the enclosing body, so nesting is handled
/// entirely by recursion. Closing or branch tags that do not belong to the
/// construct being parsed are rejected.
pub fn compile(tokens: &[Token]) -> Result<Vec<Node>, Error> {
    let mut parser = Parser::new(tokens);
    let block = parser.parse_block(|_| false)?;
    debug_assert!(parser.is_eof());
    Ok(block.nodes)
}

/// Tokenizes and compiles `source` with the default delimiters.
#[cfg(test)]
pub fn parse(source: &str) -> Result<Vec<Node>, Error> {
    compile(&lexer::tokenize(source))
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek_token(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parses nodes until end of input or a token accepted by `stop`, which
    /// is left unconsumed.
    fn parse_block(&mut self, stop: fn(&TokenKind) -> bool) -> Result<Block, Error> {
        let mut block = Block::default();
        while let Some(token) = self.peek_token() {
            if stop(&token.kind) {
                break;
            }
            self.pos += 1;
            let node = match &token.kind {
                TokenKind::Text(text) => Node::Text(TextNode::new(token.span, text.as_str())),
                TokenKind::Variable { path, default } => Node::Variable(VariableNode::new(
                    token.span,
                    path.as_str(),
                    default.clone(),
                )),
                TokenKind::If(expr) => Node::If(self.parse_if(token, expr)?),
                TokenKind::For(header) => Node::For(self.parse_for(token, header)?),
                TokenKind::Switch(subject) => Node::Switch(self.parse_switch(token, subject)?),
                other => {
                    return Err(Error::parse_with_span(
                        format!("unexpected `{}` tag `{}`", other.describe(), token.raw),
                        token.span,
                    ));
                }
            };
            block.push(node);
        }
        Ok(block)
    }

    /// Consumes the boundary token that ended a construct body.
    fn expect_boundary(&mut self, open: &Token) -> Result<&'a Token, Error> {
        self.next_token().ok_or_else(|| {
            Error::parse_with_span(
                format!(
                    "unclosed `{}` opened by `{}`",
                    open.kind.describe(),
                    open.raw
                ),
                open.span,
            )
        })
    }

    /// An `elseif` after `else` still appends a branch, and a repeated
    /// `else` replaces the earlier else body.
    fn parse_if(&mut self, open: &Token, expr: &str) -> Result<IfNode, Error> {
        let mut branches = Vec::new();
        let mut else_block: Option<Block> = None;
        let mut current = Some((open.span, condition(expr, open.span)?));

        loop {
            let block = self.parse_block(is_if_boundary)?;
            match current.take() {
                Some((span, condition)) => branches.push(IfBranch {
                    span,
                    condition,
                    block,
                }),
                None => else_block = Some(block),
            }

            let token = self.expect_boundary(open)?;
            match &token.kind {
                TokenKind::ElseIf(expr) => {
                    current = Some((token.span, condition(expr, token.span)?));
                }
                TokenKind::Else => {}
                _ => {
                    return Ok(IfNode {
                        span: Span::new(open.span.start, token.span.end),
                        branches,
                        else_block,
                    });
                }
            }
        }
    }

    fn parse_for(&mut self, open: &Token, header: &str) -> Result<ForNode, Error> {
        let (bindings, list_expr) = split_for_header(header).ok_or_else(|| {
            Error::parse_with_span(
                format!("loop header `{header}` must have the form `item in list`"),
                open.span,
            )
        })?;

        // The first comma separates an optional index name from the item name.
        let (index_var, item_var) = match bindings.split_once(',') {
            Some((index, item)) => {
                let index = index.trim();
                ((!index.is_empty()).then_some(index), item.trim())
            }
            None => (None, bindings),
        };
        for name in index_var.iter().chain(Some(&item_var)) {
            if !lexer::is_identifier(name) {
                return Err(Error::parse_with_span(
                    format!("invalid loop variable `{name}` in `{}`", open.raw),
                    open.span,
                ));
            }
        }

        let block = self.parse_block(|kind| matches!(kind, TokenKind::EndFor))?;
        let close = self.expect_boundary(open)?;
        Ok(ForNode {
            span: Span::new(open.span.start, close.span.end),
            index_var: index_var.map(str::to_string),
            item_var: item_var.to_string(),
            list_expr: list_expr.to_string(),
            block,
        })
    }

    /// Nodes that appear before the first `case` form a default body, as does
    /// every `default` section; the last non-empty one wins.
    fn parse_switch(&mut self, open: &Token, subject: &str) -> Result<SwitchNode, Error> {
        let mut cases = Vec::new();
        let mut default = None;
        let mut current: Option<(Span, Condition)> = None;

        loop {
            let block = self.parse_block(is_switch_boundary)?;
            match current.take() {
                Some((span, condition)) => cases.push(SwitchCase {
                    span,
                    condition,
                    block,
                }),
                None if !block.is_empty() => default = Some(block),
                None => {}
            }

            let token = self.expect_boundary(open)?;
            match &token.kind {
                TokenKind::Case(expr) => {
                    current = Some((token.span, condition(expr, token.span)?));
                }
                TokenKind::Default => {}
                _ => {
                    return Ok(SwitchNode {
                        span: Span::new(open.span.start, token.span.end),
                        subject: subject.to_string(),
                        cases,
                        default,
                    });
                }
            }
        }
    }
}

fn condition(expr: &str, span: Span) -> Result<Condition, Error> {
    Condition::parse(expr).map_err(|err| err.or_span(span))
}

fn is_if_boundary(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::ElseIf(_) | TokenKind::Else | TokenKind::EndIf)
}

fn is_switch_boundary(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Case(_) | TokenKind::Default | TokenKind::EndSwitch
    )
}

/// Splits `bindings in list` at the first standalone `in`.
fn split_for_header(header: &str) -> Option<(&str, &str)> {
    let mut search = 0;
    while let Some(found) = header[search..].find("in") {
        let at = search + found;
        let end = at + 2;
        let before = header[..at].chars().next_back();
        let after = header[end..].chars().next();
        if before.is_some_and(char::is_whitespace) && after.map_or(true, char::is_whitespace) {
            let bindings = header[..at].trim();
            let list = header[end..].trim();
            return (!bindings.is_empty() && !list.is_empty()).then_some((bindings, list));
        }
        search = end;
    }
    None
}
