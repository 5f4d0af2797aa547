// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Syntax tree produced by the parser.

use std::fmt;

use crate::expr::Condition;

/// Byte offsets into the original template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// First byte of the range.
    pub start: usize,
    /// One past the last byte of the range.
    pub end: usize,
}

impl Span {
    /// Range `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A sequential block of nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    /// Nodes in source order.
    pub nodes: Vec<Node>,
}

impl Block {
    /// Appends a node.
    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Whether the block has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Node types produced by the parser. Container nodes own their children.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Node {
    /// Literal text.
    Text(TextNode),
    /// Variable interpolation.
    Variable(VariableNode),
    /// Conditional chain.
    If(IfNode),
    /// Loop over a list.
    For(ForNode),
    /// Multi-way branch on a subject value.
    Switch(SwitchNode),
}

impl Node {
    /// Source range of the node, closing tag included for containers.
    pub fn span(&self) -> Span {
        match self {
            Node::Text(node) => node.span,
            Node::Variable(node) => node.span,
            Node::If(node) => node.span,
            Node::For(node) => node.span,
            Node::Switch(node) => node.span,
        }
    }
}

/// Literal text emitted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    /// Source range.
    pub span: Span,
    /// Text to emit.
    pub text: String,
}

impl TextNode {
    /// Text node covering `span`.
    pub fn new(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }
}

/// `<{ path.to.value | "default" }>`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableNode {
    /// Source range of the tag.
    pub span: Span,
    /// Dotted lookup path.
    pub path: String,
    /// Literal emitted when the path does not resolve.
    pub default: Option<String>,
    /// Named output filters. The tag grammar does not produce any yet.
    pub filters: Vec<String>,
}

impl VariableNode {
    /// Variable node without filters.
    pub fn new(span: Span, path: impl Into<String>, default: Option<String>) -> Self {
        Self {
            span,
            path: path.into(),
            default,
            filters: Vec::new(),
        }
    }
}

/// `if` / `elseif`* / `else`? chain.
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    /// Source range from the `if` tag to `/if`.
    pub span: Span,
    /// `if` followed by each `elseif`, in order.
    pub branches: Vec<IfBranch>,
    /// Body rendered when no branch holds.
    pub else_block: Option<Block>,
}

/// One conditional branch of an [`IfNode`].
#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    /// Source range of the branch tag.
    pub span: Span,
    /// Compiled branch condition.
    pub condition: Condition,
    /// Body rendered when the condition holds.
    pub block: Block,
}

/// `for item in list` or `for index, item in list`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    /// Source range from the `for` tag to `/for`.
    pub span: Span,
    /// Name bound to the 0-based position, if declared.
    pub index_var: Option<String>,
    /// Name bound to each item.
    pub item_var: String,
    /// Path or literal producing the list.
    pub list_expr: String,
    /// Body rendered once per item.
    pub block: Block,
}

/// `switch subject` with its `case` and `default` bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchNode {
    /// Source range from the `switch` tag to `/switch`.
    pub span: Span,
    /// Operand whose value the cases are matched against.
    pub subject: String,
    /// Cases in declaration order; the first match wins.
    pub cases: Vec<SwitchCase>,
    /// Body rendered when no case matches.
    pub default: Option<Block>,
}

/// One `case` of a [`SwitchNode`].
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// Source range of the `case` tag.
    pub span: Span,
    /// Compiled case expression.
    pub condition: Condition,
    /// Body rendered when the case matches.
    pub block: Block,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(node) => write!(f, "Text({:?})", node.text),
            Node::Variable(node) => write!(f, "Variable({})", node.path),
            Node::If(node) => write!(f, "If({} branches)", node.branches.len()),
            Node::For(node) => write!(f, "For({} in {})", node.item_var, node.list_expr),
            Node::Switch(node) => write!(f, "Switch({})", node.subject),
        }
    }
}
