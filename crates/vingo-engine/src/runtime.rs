// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Tree-walking renderer.
//!
//! Rendering never fails. Lookups that miss produce empty output (or the
//! variable's default), non-list loop sources produce zero iterations, and a
//! condition that cannot be evaluated counts as false.

use crate::ast::{ForNode, IfNode, Node, SwitchNode, VariableNode};
use crate::context::Scope;
use crate::expr::{self, Condition};
use crate::value::Value;

/// Renders `nodes` in order, appending to `out`.
pub fn render_nodes(nodes: &[Node], scope: &Scope<'_>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&text.text),
            Node::Variable(variable) => render_variable(variable, scope, out),
            Node::If(node) => render_if(node, scope, out),
            Node::For(node) => render_for(node, scope, out),
            Node::Switch(node) => render_switch(node, scope, out),
        }
    }
}

/// A nil value counts as missing so that the default applies to absent
/// optional data.
fn render_variable(node: &VariableNode, scope: &Scope<'_>, out: &mut String) {
    match expr::lookup(&node.path, scope) {
        Some(value) if !value.is_nil() => out.push_str(&value.to_string()),
        _ => {
            if let Some(default) = &node.default {
                out.push_str(default);
            }
        }
    }
}

fn render_if(node: &IfNode, scope: &Scope<'_>, out: &mut String) {
    for branch in &node.branches {
        if holds(&branch.condition, scope) {
            render_nodes(&branch.block.nodes, scope, out);
            return;
        }
    }
    if let Some(block) = &node.else_block {
        render_nodes(&block.nodes, scope, out);
    }
}

fn render_for(node: &ForNode, scope: &Scope<'_>, out: &mut String) {
    let Some(source) = expr::lookup(&node.list_expr, scope) else {
        return;
    };
    let Some(items) = source.as_list() else {
        tracing::trace!(
            list = node.list_expr.as_str(),
            kind = source.type_name(),
            "loop source is not a list"
        );
        return;
    };

    for (position, item) in items.iter().enumerate() {
        let index = Value::from(position);
        let indexed;
        let base = match &node.index_var {
            Some(name) => {
                indexed = scope.bind(name, &index);
                &indexed
            }
            None => scope,
        };
        let iteration = base.bind(&node.item_var, item);
        render_nodes(&node.block.nodes, &iteration, out);
    }
}

fn render_switch(node: &SwitchNode, scope: &Scope<'_>, out: &mut String) {
    let subject = expr::lookup(&node.subject, scope).unwrap_or_default();
    let selected = node
        .cases
        .iter()
        .find(|case| expr::matches_case(&case.condition, &subject, scope))
        .map(|case| &case.block)
        .or(node.default.as_ref());
    if let Some(block) = selected {
        render_nodes(&block.nodes, scope, out);
    }
}

fn holds(condition: &Condition, scope: &Scope<'_>) -> bool {
    condition.evaluate(scope).unwrap_or_else(|err| {
        tracing::debug!(
            condition = condition.source(),
            error = %err,
            "condition evaluation failed, treating as false"
        );
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::parser;
    use crate::value::Record;

    fn render(source: &str, ctx: &Context) -> String {
        let nodes = parser::parse(source).unwrap_or_else(|err| panic!("{source}: {err}"));
        let mut out = String::new();
        render_nodes(&nodes, &Scope::new(ctx), &mut out);
        out
    }

    #[test]
    fn plain_text_is_verbatim() {
        let source = "<p>no tags here {{ at all }}</p>\n";
        assert_eq!(render(source, &Context::new()), source);
    }

    #[test]
    fn variables_and_defaults() {
        let ctx = Context::new()
            .with("user", Record::new("User").with_field("name", "Ada"))
            .with("nickname", Value::Nil);
        assert_eq!(render("Hi <{ user.name }>!", &ctx), "Hi Ada!");
        assert_eq!(render(r#"<{ user.missing | "N/A" }>"#, &ctx), "N/A");
        assert_eq!(render("[<{ user.missing }>]", &ctx), "[]");
        assert_eq!(render(r#"<{ nickname | "anon" }>"#, &ctx), "anon");
    }

    #[test]
    fn if_chain_picks_first_true_branch() {
        let source = "<{if x > 10}>big<{elseif x > 3}>medium<{else}>small<{/if}>";
        assert_eq!(render(source, &Context::new().with("x", 5)), "medium");
        assert_eq!(render(source, &Context::new().with("x", 50)), "big");
        assert_eq!(render(source, &Context::new().with("x", 1)), "small");
        assert_eq!(render("<{if x > 10}>big<{/if}>", &Context::new().with("x", 1)), "");
    }

    #[test]
    fn failing_condition_is_false() {
        let ctx = Context::new().with("flag", true);
        assert_eq!(render("<{if flag > false}>yes<{else}>no<{/if}>", &ctx), "no");
    }

    #[test]
    fn loop_binds_index_and_item() {
        let ctx = Context::new().with("items", vec!["a", "b"]);
        assert_eq!(
            render("<{for i, v in items}><{i}>:<{v}>,<{/for}>", &ctx),
            "0:a,1:b,"
        );
    }

    #[test]
    fn loop_bindings_do_not_leak() {
        let ctx = Context::new().with("v", "outer").with("items", vec![1, 2]);
        assert_eq!(
            render("<{for v in items}><{v}><{/for}>|<{v}>", &ctx),
            "12|outer"
        );
    }

    #[test]
    fn loop_over_missing_or_scalar_is_empty() {
        let ctx = Context::new().with("name", "Ada");
        assert_eq!(render("<{for c in name}>x<{/for}>", &ctx), "");
        assert_eq!(render("<{for c in nothing}>x<{/for}>", &ctx), "");
    }

    #[test]
    fn nested_loops_see_outer_bindings() {
        let ctx = Context::new().with(
            "rows",
            Value::from(serde_json::json!([{"cells": [1, 2]}, {"cells": [3]}])),
        );
        let source = "<{for r, row in rows}><{for cell in row.cells}><{r}>.<{cell}> <{/for}><{/for}>";
        assert_eq!(render(source, &ctx), "0.1 0.2 1.3 ");
    }

    #[test]
    fn switch_matches_across_kinds() {
        let quoted = r#"<{switch n}><{case "5"}>five<{/switch}>"#;
        assert_eq!(render(quoted, &Context::new().with("n", 5)), "five");
        let bare = "<{switch n}><{case 6}>six<{/switch}>";
        assert_eq!(render(bare, &Context::new().with("n", "6")), "six");
    }

    #[test]
    fn default_runs_when_every_case_is_falsy() {
        let source = r#"<{switch n}><{case 0}>zero<{case false}>no<{case ""}>blank<{default}>other<{/switch}>"#;
        assert_eq!(render(source, &Context::new().with("n", 7)), "other");
        assert_eq!(render(source, &Context::new().with("n", 0)), "zero");
    }

    #[test]
    fn switch_case_can_reference_subject() {
        let source = "<{switch age}><{case __switch__ >= 18}>adult<{default}>minor<{/switch}>";
        assert_eq!(render(source, &Context::new().with("age", 30)), "adult");
        assert_eq!(render(source, &Context::new().with("age", 12)), "minor");
    }

    #[test]
    fn unmatched_literal_case_is_taken_when_truthy() {
        let source = r#"<{switch role}><{case "admin"}>A<{/switch}>"#;
        assert_eq!(render(source, &Context::new().with("role", "guest")), "A");
        let source = "<{switch role}><{case admin}>A<{case editor}>E<{/switch}>";
        assert_eq!(render(source, &Context::new().with("role", "editor")), "A");
    }

    #[test]
    fn switch_without_match_or_default_is_empty() {
        let source = "<{switch n}><{case 0}>zero<{/switch}>";
        assert_eq!(render(source, &Context::new().with("n", 7)), "");
    }

    #[test]
    fn missing_subject_does_not_match_empty_case() {
        let source = r#"<{switch nobody}><{case ""}>blank<{default}>other<{/switch}>"#;
        assert_eq!(render(source, &Context::new()), "other");
    }
}
