// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Condition expressions used by `if`, `elseif` and `case` tags.
//!
//! The grammar is deliberately small: simple comparisons chained with `and` /
//! `or`, folded strictly left to right. `a or b and c` means `(a or b) and c`.
//! There is no grouping and no arithmetic.

use std::borrow::Cow;
use std::fmt;

use smallvec::SmallVec;

use crate::context::{Context, Scope};
use crate::error::Error;
use crate::value::Value;

/// Name under which a switch subject is visible to its case expressions.
pub const SWITCH_SUBJECT: &str = "__switch__";

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    Greater,
    /// `<`
    Less,
    /// `>=`
    GreaterOrEqual,
    /// `<=`
    LessOrEqual,
}

impl Operator {
    /// Operator as written in templates.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
        }
    }

    fn is_ordering(self) -> bool {
        !matches!(self, Operator::Equal | Operator::NotEqual)
    }

    fn holds<T: PartialOrd + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            Operator::Equal => left == right,
            Operator::NotEqual => left != right,
            Operator::Greater => left > right,
            Operator::Less => left < right,
            Operator::GreaterOrEqual => left >= right,
            Operator::LessOrEqual => left <= right,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connective between two clauses of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    /// `and`
    And,
    /// `or`
    Or,
}

/// One clause of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// A lone operand tested for truthiness.
    Truthy(String),
    /// `left op right`.
    Compare {
        /// Left operand text.
        left: String,
        /// Operator between the operands.
        op: Operator,
        /// Right operand text.
        right: String,
    },
}

impl Comparison {
    fn parse(clause: &str) -> Result<Self, Error> {
        let Some((at, op)) = find_operator(clause) else {
            return Ok(Comparison::Truthy(clause.to_string()));
        };
        let left = clause[..at].trim();
        let right = clause[at + op.as_str().len()..].trim();
        if left.is_empty() {
            return Err(Error::parse(
                format!("comparison `{clause}` has no left-hand operand"),
                None,
            ));
        }
        if right.is_empty() {
            return Err(Error::parse(
                format!("comparison `{clause}` has no right-hand operand"),
                None,
            ));
        }
        Ok(Comparison::Compare {
            left: left.to_string(),
            op,
            right: right.to_string(),
        })
    }

    fn evaluate(&self, scope: &Scope<'_>) -> Result<bool, Error> {
        match self {
            Comparison::Truthy(operand) => Ok(resolve(operand, scope).is_truthy()),
            Comparison::Compare { left, op, right } => {
                let left = resolve(left, scope);
                let right = resolve(right, scope);
                compare_values(&left, &right, *op)
            }
        }
    }
}

/// Compiled condition expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    head: Option<Comparison>,
    tail: SmallVec<[(Logic, Comparison); 2]>,
}

impl Condition {
    /// Parses `text`. An empty expression is valid and always false.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let source = text.trim();
        let mut clauses: Vec<(Option<Logic>, &str)> = Vec::new();
        let mut pending: Option<Logic> = None;
        let mut clause: Option<(usize, usize)> = None;

        for (start, end) in word_spans(source) {
            let logic = match &source[start..end] {
                "and" => Logic::And,
                "or" => Logic::Or,
                _ => {
                    let begin = clause.map_or(start, |(begin, _)| begin);
                    clause = Some((begin, end));
                    continue;
                }
            };
            let Some((begin, finish)) = clause.take() else {
                return Err(Error::parse(
                    format!("`{}` in `{source}` has no left-hand condition", &source[start..end]),
                    None,
                ));
            };
            clauses.push((pending, &source[begin..finish]));
            pending = Some(logic);
        }

        match clause {
            Some((begin, finish)) => clauses.push((pending, &source[begin..finish])),
            None if pending.is_some() => {
                return Err(Error::parse(
                    format!("condition `{source}` ends with a dangling logical operator"),
                    None,
                ));
            }
            None => {}
        }

        let mut head = None;
        let mut tail = SmallVec::new();
        for (logic, text) in clauses {
            let comparison = Comparison::parse(text)?;
            match logic {
                None => head = Some(comparison),
                Some(logic) => tail.push((logic, comparison)),
            }
        }

        Ok(Self {
            source: source.to_string(),
            head,
            tail,
        })
    }

    /// Condition text as written, trimmed.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether any clause uses a comparison operator.
    pub fn has_operator(&self) -> bool {
        self.clauses()
            .any(|clause| matches!(clause, Comparison::Compare { .. }))
    }

    fn clauses(&self) -> impl Iterator<Item = &Comparison> {
        self.head
            .iter()
            .chain(self.tail.iter().map(|(_, clause)| clause))
    }

    /// Evaluates every clause in order and folds the results left to right.
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<bool, Error> {
        let Some(head) = &self.head else {
            return Ok(false);
        };
        let mut result = head.evaluate(scope)?;
        for (logic, clause) in &self.tail {
            let next = clause.evaluate(scope)?;
            result = match logic {
                Logic::And => result && next,
                Logic::Or => result || next,
            };
        }
        Ok(result)
    }

}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses and evaluates `expr` against `context` in one step.
pub fn evaluate(expr: &str, context: &Context) -> Result<bool, Error> {
    Condition::parse(expr)?.evaluate(&Scope::new(context))
}

/// One-shot form of [`matches_case`]. Only parse errors are reported.
pub fn evaluate_against_value(expr: &str, subject: &Value, context: &Context) -> Result<bool, Error> {
    let case = Condition::parse(expr)?;
    Ok(matches_case(&case, subject, &Scope::new(context)))
}

/// Decides whether a switch `case` matches `subject`.
///
/// A case with a comparison operator is evaluated as a condition with the
/// subject bound to [`SWITCH_SUBJECT`]. Otherwise the case text is read as a
/// literal and compared for equality, then by textual form, and finally
/// evaluated as a condition with the subject bound, whatever that yields. A
/// bare non-empty literal is truthy, so it matches any subject that an earlier
/// case did not take. A `Nil` subject has no textual form and skips straight
/// to the condition.
pub fn matches_case(case: &Condition, subject: &Value, scope: &Scope<'_>) -> bool {
    let bound = scope.bind(SWITCH_SUBJECT, subject);

    if !case.has_operator() && !subject.is_nil() {
        let expected = literal(case.source());
        if compare_values(subject, &expected, Operator::Equal).unwrap_or(false) {
            return true;
        }
        if subject.to_string() == expected.to_string() {
            return true;
        }
    }

    case.evaluate(&bound).unwrap_or_else(|err| {
        tracing::debug!(case = case.source(), error = %err, "case evaluation failed");
        false
    })
}

/// Compares two resolved operands.
///
/// Numbers (including numeric strings) compare numerically, two booleans
/// support only equality, and everything else compares by textual form.
/// Ordering booleans or composite values is an evaluation error.
pub fn compare_values(left: &Value, right: &Value, op: Operator) -> Result<bool, Error> {
    if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
        return Ok(op.holds(&l, &r));
    }
    if let (Some(l), Some(r)) = (left.as_bool(), right.as_bool()) {
        return if op.is_ordering() {
            Err(Error::evaluation(format!(
                "unsupported comparison `{op}` between bool values"
            )))
        } else {
            Ok(op.holds(&l, &r))
        };
    }
    if op.is_ordering() && (left.is_composite() || right.is_composite()) {
        return Err(Error::evaluation(format!(
            "unsupported comparison `{op}` between {} and {}",
            left.type_name(),
            right.type_name()
        )));
    }
    Ok(op.holds(left.to_string().as_str(), right.to_string().as_str()))
}

/// Resolves an operand: quoted string, integer, float, `true`/`false`, then a
/// dotted-path lookup. `None` means a path that is not present.
pub fn lookup<'a>(operand: &str, scope: &Scope<'a>) -> Option<Cow<'a, Value>> {
    let operand = operand.trim();
    if operand.is_empty() {
        return None;
    }
    if let Some(literal) = parse_literal(operand) {
        return Some(Cow::Owned(literal));
    }
    scope.lookup_path(operand).map(Cow::Borrowed)
}

/// Like [`lookup`], but an unresolved path becomes a bare string.
pub fn resolve<'a>(operand: &str, scope: &Scope<'a>) -> Cow<'a, Value> {
    lookup(operand, scope).unwrap_or_else(|| Cow::Owned(literal(operand)))
}

/// Reads `text` as a literal without consulting any context.
pub fn literal(text: &str) -> Value {
    let text = text.trim();
    parse_literal(text).unwrap_or_else(|| Value::Str(text.to_string()))
}

fn parse_literal(text: &str) -> Option<Value> {
    if let Some(unquoted) = unquote(text) {
        return Some(Value::Str(unquoted));
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::Int(int));
    }
    if let Ok(float) = text.parse::<f64>() {
        return Some(Value::Float(float));
    }
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Double-quoted strings honour backslash escapes; single-quoted strings are
/// taken verbatim.
fn unquote(text: &str) -> Option<String> {
    if text.len() < 2 {
        return None;
    }
    if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return Some(inner.to_string());
    }
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Some(out)
}

/// Byte ranges of whitespace-separated words. Quoted runs never split.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && open == '"' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        if ch.is_whitespace() {
            if let Some(begin) = start.take() {
                spans.push((begin, idx));
            }
            continue;
        }
        if start.is_none() {
            start = Some(idx);
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
        }
    }
    if let Some(begin) = start {
        spans.push((begin, text.len()));
    }
    spans
}

/// First comparison operator outside of quotes.
fn find_operator(clause: &str) -> Option<(usize, Operator)> {
    let bytes = clause.as_bytes();
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (idx, &byte) in bytes.iter().enumerate() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if byte == b'\\' && open == b'"' {
                escaped = true;
            } else if byte == open {
                quote = None;
            }
            continue;
        }
        let next = bytes.get(idx + 1).copied();
        let op = match (byte, next) {
            (b'"' | b'\'', _) => {
                quote = Some(byte);
                continue;
            }
            (b'=', Some(b'=')) => Operator::Equal,
            (b'!', Some(b'=')) => Operator::NotEqual,
            (b'>', Some(b'=')) => Operator::GreaterOrEqual,
            (b'<', Some(b'=')) => Operator::LessOrEqual,
            (b'>', _) => Operator::Greater,
            (b'<', _) => Operator::Less,
            _ => continue,
        };
        return Some((idx, op));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    fn ctx() -> Context {
        Context::new()
            .with("x", 5)
            .with("name", "Ada")
            .with("count", "10")
            .with("flag", false)
            .with("items", Value::from(vec!["a", "b"]))
            .with("empty", Value::List(Vec::new()))
            .with("user", Record::new("User").with_field("admin", true))
    }

    fn eval(expr: &str) -> bool {
        evaluate(expr, &ctx()).unwrap_or_else(|err| panic!("{expr}: {err}"))
    }

    #[test]
    fn comparisons_on_numbers_and_strings() {
        assert!(eval("x > 3"));
        assert!(eval("x >= 5"));
        assert!(!eval("x < 5"));
        assert!(eval("x == 5.0"));
        assert!(eval("count > 9"));
        assert!(eval("name == \"Ada\""));
        assert!(eval("name != 'Bob'"));
        assert!(eval("\"apple\" < \"banana\""));
        assert!(eval("user.admin == true"));
    }

    #[test]
    fn chains_fold_left_to_right_without_precedence() {
        // Standard precedence would read this as `true or (false and false)`.
        assert!(!eval("true or false and false"));
        assert!(eval("false and false or true"));
        assert!(eval("x > 1 and name == \"Ada\""));
    }

    #[test]
    fn truthiness_of_single_operands() {
        assert!(eval("items"));
        assert!(!eval("empty"));
        assert!(!eval("flag"));
        assert!(eval("user"));
        assert!(!eval("0"));
        assert!(!eval("\"\""));
        assert!(!eval(""));
        // Unknown paths fall back to the bare word, which is a non-empty string.
        assert!(eval("nobody.home"));
    }

    #[test]
    fn quoted_keywords_and_operators_do_not_split() {
        let ctx = Context::new().with("dish", "salt and pepper").with("op", "a>b");
        assert!(evaluate("dish == \"salt and pepper\"", &ctx).unwrap());
        assert!(evaluate("op == \"a>b\"", &ctx).unwrap());
    }

    #[test]
    fn ordering_booleans_is_an_error() {
        let err = evaluate("true > false", &ctx()).unwrap_err();
        assert!(matches!(err, Error::Evaluation { .. }));
        assert!(eval("flag != true"));
    }

    #[test]
    fn ordering_collections_is_an_error() {
        let err = evaluate("items > 1", &Context::new().with("items", vec!["a"])).unwrap_err();
        assert!(err.to_string().contains("between list and int"));
    }

    #[test]
    fn malformed_conditions_fail_to_parse() {
        for expr in ["x >", "== 3", "x > 1 and", "or x"] {
            let err = Condition::parse(expr).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "{expr}");
        }
    }

    #[test]
    fn resolution_prefers_literals() {
        let ctx = Context::new().with("true", "shadowed").with("7", "seven");
        let scope = Scope::new(&ctx);
        assert_eq!(resolve("true", &scope).into_owned(), Value::Bool(true));
        assert_eq!(resolve("7", &scope).into_owned(), Value::Int(7));
        assert_eq!(resolve("2.5", &scope).into_owned(), Value::Float(2.5));
        assert_eq!(
            resolve("\"a\\tb\"", &scope).into_owned(),
            Value::from("a\tb")
        );
        assert_eq!(resolve("missing", &scope).into_owned(), Value::from("missing"));
        assert!(lookup("missing", &scope).is_none());
    }

    #[test]
    fn case_matching_uses_literal_then_text_then_condition() {
        let ctx = ctx();
        let scope = Scope::new(&ctx);
        let case = |text: &str| Condition::parse(text).unwrap();

        assert!(matches_case(&case("\"5\""), &Value::Int(5), &scope));
        assert!(matches_case(&case("5"), &Value::from("5"), &scope));
        assert!(matches_case(&case("admin"), &Value::from("admin"), &scope));

        assert!(matches_case(&case("__switch__ > 3"), &Value::Int(5), &scope));
        assert!(!matches_case(&case("__switch__ > 9"), &Value::Int(5), &scope));

        // A bare path that exists in the data is tested for truthiness.
        assert!(matches_case(&case("user.admin"), &Value::from("x"), &scope));
        assert!(!matches_case(&case("flag"), &Value::from("x"), &scope));
    }

    #[test]
    fn unmatched_case_falls_back_to_its_truthiness() {
        let ctx = ctx();
        let scope = Scope::new(&ctx);
        let case = |text: &str| Condition::parse(text).unwrap();
        let editor = Value::from("editor");

        // Non-empty literals and unknown bare words are truthy strings.
        assert!(matches_case(&case("\"admin\""), &editor, &scope));
        assert!(matches_case(&case("guest"), &editor, &scope));
        // Falsy literals still reject.
        assert!(!matches_case(&case("0"), &editor, &scope));
        assert!(!matches_case(&case("false"), &editor, &scope));
        assert!(!matches_case(&case("\"\""), &editor, &scope));
        assert!(!matches_case(&case("empty"), &editor, &scope));
    }

    #[test]
    fn nil_subject_skips_textual_comparison() {
        let ctx = ctx();
        let scope = Scope::new(&ctx);
        let case = |text: &str| Condition::parse(text).unwrap();

        assert!(!matches_case(&case("\"\""), &Value::Nil, &scope));
        assert!(!matches_case(&case("flag"), &Value::Nil, &scope));
        assert!(matches_case(&case("items"), &Value::Nil, &scope));
    }

    #[test]
    fn one_shot_case_matching() {
        assert!(evaluate_against_value("true", &Value::Bool(true), &Context::new()).unwrap());
        assert!(
            evaluate_against_value("\"admin\"", &Value::from("editor"), &Context::new()).unwrap()
        );
        assert!(evaluate_against_value("x >", &Value::Nil, &Context::new()).is_err());
    }
}
