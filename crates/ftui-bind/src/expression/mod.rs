#![forbid(unsafe_code)]

//! Binding expressions: `{field}` tokens mixed with operators or text.
//!
//! # Design
//!
//! [`parse`] splits the input into literal fragments interleaved with
//! field tokens and picks one of three shapes:
//!
//! | Input                     | Shape                         | Triggers      |
//! |---------------------------|-------------------------------|---------------|
//! | `{f}` / `!{f}`            | direct field read (+ negate)  | `[f]`         |
//! | every fragment operators  | [`Program`] (interpreted)     | token fields  |
//! | anything else             | [`Template`] (string concat)  | token fields  |
//!
//! Negation only applies to the single-token shortcut. In a composite
//! expression a leading `!` is an ordinary operator.
//!
//! # Invariants
//!
//! 1. Composite triggers are the token fields deduplicated in order of
//!    first appearance.
//! 2. An input with no tokens compiles to a constant with no triggers.
//! 3. Every [`ExpressionError`] carries the raw input.
//!
//! # Failure Modes
//!
//! | Condition                        | Kind                               |
//! |----------------------------------|------------------------------------|
//! | empty input                      | [`ExpressionErrorKind::Empty`]      |
//! | `{` without `}`, nested or stray | [`ExpressionErrorKind::Unbalanced`] |
//! | `{}` or a token that cleans away | [`ExpressionErrorKind::EmptyToken`] |
//! | operator sequence fails to parse | [`ExpressionErrorKind::Malformed`]  |
//! | nesting past [`MAX_NESTING`]     | [`ExpressionErrorKind::TooDeep`]    |

mod program;

use std::fmt;
use std::rc::Rc;

pub use program::{BinaryOp, Expr, MAX_NESTING, Program, UnaryOp};
use program::{CompileError, OPERATOR_CHARS, Token, lex_fragment};

use crate::property::Accessor;
use crate::record::ObservableRecord;

/// Why an expression failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionErrorKind {
    Empty,
    Unbalanced,
    EmptyToken,
    Malformed(String),
    /// The operator tree nests deeper than [`MAX_NESTING`].
    TooDeep,
}

impl fmt::Display for ExpressionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("expression is empty"),
            Self::Unbalanced => f.write_str("unbalanced braces"),
            Self::EmptyToken => f.write_str("empty field token"),
            Self::Malformed(reason) => write!(f, "malformed expression: {reason}"),
            Self::TooDeep => write!(f, "expression nests deeper than {MAX_NESTING} levels"),
        }
    }
}

/// A compile failure with the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionError {
    pub input: String,
    pub kind: ExpressionErrorKind,
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to parse binding value '{}': {}", self.input, self.kind)
    }
}

impl std::error::Error for ExpressionError {}

/// Result of [`parse`].
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    pub accessor: Accessor,
    pub negate: bool,
    pub triggers: Vec<String>,
}

/// One piece of a string template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Field(String),
}

/// A compiled string template such as `{firstName} {lastName}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<TemplatePart>,
}

impl Template {
    #[must_use]
    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Concatenate literals and field display strings. Absent fields
    /// render as the empty string.
    #[must_use]
    pub fn render(&self, record: &dyn ObservableRecord) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => out.push_str(text),
                TemplatePart::Field(field) => {
                    if record.has(field) {
                        out.push_str(&record.get(field).to_display_string());
                    }
                }
            }
        }
        out
    }
}

/// Strip the characters that may not appear in a field, attribute or
/// event name, then trim.
#[must_use]
pub fn clean_name(raw: &str) -> String {
    const STRIP: [char; 14] = [
        '|', ';', '"', '\'', '{', '}', '[', ']', '<', '>', '(', ')', '+', ',',
    ];
    raw.chars()
        .filter(|c| !STRIP.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Whether a literal fragment consists of operators, digits and spaces
/// with at least one operator.
fn is_operator_fragment(fragment: &str) -> bool {
    let mut has_operator = false;
    for ch in fragment.chars() {
        if OPERATOR_CHARS.contains(&ch) {
            has_operator = true;
        } else if !ch.is_ascii_digit() && ch != ' ' {
            return false;
        }
    }
    has_operator
}

#[derive(Debug)]
enum Piece {
    Literal(String),
    Field(String),
}

fn split_pieces(input: &str) -> Result<Vec<Piece>, ExpressionErrorKind> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut token: Option<String> = None;
    for ch in input.chars() {
        match ch {
            '{' if token.is_none() => {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                token = Some(String::new());
            }
            '{' => return Err(ExpressionErrorKind::Unbalanced),
            '}' => {
                let raw = token.take().ok_or(ExpressionErrorKind::Unbalanced)?;
                let field = clean_name(&raw);
                if field.is_empty() {
                    return Err(ExpressionErrorKind::EmptyToken);
                }
                pieces.push(Piece::Field(field));
            }
            _ => match token.as_mut() {
                Some(raw) => raw.push(ch),
                None => literal.push(ch),
            },
        }
    }
    if token.is_some() {
        return Err(ExpressionErrorKind::Unbalanced);
    }
    pieces.push(Piece::Literal(literal));
    Ok(pieces)
}

/// Compile a binding expression.
///
/// ```
/// use ftui_bind::expression::parse;
///
/// let Ok(compiled) = parse("!{enabled}") else { unreachable!() };
/// assert!(compiled.negate);
/// assert_eq!(compiled.triggers, ["enabled"]);
/// assert_eq!(compiled.accessor.field(), Some("enabled"));
/// ```
pub fn parse(input: &str) -> Result<CompiledExpression, ExpressionError> {
    let fail = |kind| ExpressionError {
        input: input.to_string(),
        kind,
    };
    if input.trim().is_empty() {
        return Err(fail(ExpressionErrorKind::Empty));
    }
    let pieces = split_pieces(input).map_err(fail)?;

    // Pieces always alternate literal, field, literal, ...; three pieces
    // means exactly one token.
    if let [Piece::Literal(prefix), Piece::Field(field), Piece::Literal(suffix)] =
        pieces.as_slice()
        && suffix.is_empty()
        && (prefix.is_empty() || prefix == "!")
    {
        return Ok(CompiledExpression {
            accessor: Accessor::Field(field.clone()),
            negate: prefix == "!",
            triggers: vec![field.clone()],
        });
    }

    let mut triggers: Vec<String> = Vec::new();
    for piece in &pieces {
        if let Piece::Field(field) = piece
            && !triggers.contains(field)
        {
            triggers.push(field.clone());
        }
    }

    let literals = pieces.iter().filter_map(|piece| match piece {
        Piece::Literal(text) if !text.is_empty() => Some(text.as_str()),
        _ => None,
    });
    let mut any_literal = false;
    let mut all_operators = true;
    for text in literals {
        any_literal = true;
        all_operators &= is_operator_fragment(text);
    }
    let as_logic = all_operators && (any_literal || triggers.is_empty());

    let accessor = if as_logic && any_literal {
        let mut tokens = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Literal(text) => lex_fragment(&text, &mut tokens)
                    .map_err(|reason| fail(ExpressionErrorKind::Malformed(reason)))?,
                Piece::Field(field) => tokens.push(Token::Field(field)),
            }
        }
        let program = Program::compile(tokens).map_err(|err| {
            fail(match err {
                CompileError::Malformed(reason) => ExpressionErrorKind::Malformed(reason),
                CompileError::TooDeep => ExpressionErrorKind::TooDeep,
            })
        })?;
        Accessor::Expression(Rc::new(program))
    } else {
        let parts = pieces
            .into_iter()
            .filter_map(|piece| match piece {
                Piece::Literal(text) if text.is_empty() => None,
                Piece::Literal(text) => Some(TemplatePart::Literal(text)),
                Piece::Field(field) => Some(TemplatePart::Field(field)),
            })
            .collect();
        Accessor::Template(Rc::new(Template { parts }))
    };

    Ok(CompiledExpression {
        accessor,
        negate: false,
        triggers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Record;
    use crate::value::Value;

    fn compiled(input: &str) -> CompiledExpression {
        match parse(input) {
            Ok(compiled) => compiled,
            Err(err) => panic!("{input}: {err}"),
        }
    }

    fn kind(input: &str) -> ExpressionErrorKind {
        match parse(input) {
            Ok(_) => panic!("{input} should fail"),
            Err(err) => {
                assert_eq!(err.input, input);
                err.kind
            }
        }
    }

    #[test]
    fn single_token_is_field_read() {
        let c = compiled("{name}");
        assert_eq!(c.accessor.field(), Some("name"));
        assert!(!c.negate);
        assert_eq!(c.triggers, ["name"]);
    }

    #[test]
    fn negated_single_token() {
        let c = compiled("!{enabled}");
        assert_eq!(c.accessor.field(), Some("enabled"));
        assert!(c.negate);
        assert_eq!(c.triggers, ["enabled"]);
    }

    #[test]
    fn token_names_are_cleaned() {
        let c = compiled("{ first'Name; }");
        assert_eq!(c.accessor.field(), Some("firstName"));
    }

    #[test]
    fn template_concatenates() {
        let record = Record::with_fields([
            ("firstName", Value::from("Joe")),
            ("lastName", Value::from("Smith")),
        ]);
        let c = compiled("{firstName} {lastName}");
        assert!(matches!(c.accessor, Accessor::Template(_)));
        assert!(!c.negate);
        assert_eq!(c.triggers, ["firstName", "lastName"]);
        assert_eq!(c.accessor.evaluate(&*record), Value::from("Joe Smith"));
    }

    #[test]
    fn template_renders_missing_field_empty() {
        let record = Record::with_fields([("a", Value::from(1))]);
        let c = compiled("Total: {a}/{b} items");
        assert_eq!(c.accessor.evaluate(&*record), Value::from("Total: 1/ items"));
    }

    #[test]
    fn operators_compile_to_program() {
        let record = Record::with_fields([("a", Value::from(5)), ("b", Value::from(2))]);
        let c = compiled("{a} > {b}");
        assert!(matches!(c.accessor, Accessor::Expression(_)));
        assert_eq!(c.accessor.evaluate(&*record), Value::from(true));
        let c = compiled("({a} + {b}) * 2");
        assert_eq!(c.accessor.evaluate(&*record), Value::from(14));
    }

    #[test]
    fn composite_negation_is_an_operator() {
        let record = Record::with_fields([("a", Value::from(true)), ("b", Value::from(false))]);
        let c = compiled("!{a} && !{b}");
        assert!(!c.negate);
        assert_eq!(c.accessor.evaluate(&*record), Value::from(false));
    }

    #[test]
    fn adjacent_tokens_form_template() {
        let record = Record::with_fields([("a", Value::from("x")), ("b", Value::from("y"))]);
        let c = compiled("{a}{b}");
        assert!(matches!(c.accessor, Accessor::Template(_)));
        assert_eq!(c.accessor.evaluate(&*record), Value::from("xy"));
    }

    #[test]
    fn triggers_deduplicate_in_order() {
        let c = compiled("{b} + {a} + {b}");
        assert_eq!(c.triggers, ["b", "a"]);
    }

    #[test]
    fn constant_expressions() {
        let record = Record::new();
        let text = compiled("hello");
        assert!(text.triggers.is_empty());
        assert_eq!(text.accessor.evaluate(&*record), Value::from("hello"));
        let arithmetic = compiled("1 + 2");
        assert!(arithmetic.triggers.is_empty());
        assert_eq!(arithmetic.accessor.evaluate(&*record), Value::from(3));
    }

    #[test]
    fn malformed_inputs() {
        assert_eq!(kind(""), ExpressionErrorKind::Empty);
        assert_eq!(kind("   "), ExpressionErrorKind::Empty);
        assert_eq!(kind("{a"), ExpressionErrorKind::Unbalanced);
        assert_eq!(kind("a}"), ExpressionErrorKind::Unbalanced);
        assert_eq!(kind("{a{b}}"), ExpressionErrorKind::Unbalanced);
        assert_eq!(kind("{}"), ExpressionErrorKind::EmptyToken);
        assert_eq!(kind("{ ; }"), ExpressionErrorKind::EmptyToken);
        assert!(matches!(kind("{a} = {b}"), ExpressionErrorKind::Malformed(_)));
        assert!(matches!(kind("{a} + "), ExpressionErrorKind::Malformed(_)));
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let depth = 200_000;
        let input = format!("{}{{a}}{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(kind(&input), ExpressionErrorKind::TooDeep);

        let at_limit = format!("{}{{a}}{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(parse(&at_limit).is_ok());
        let negations = format!("{}{{a}}", "!".repeat(MAX_NESTING + 1));
        assert_eq!(kind(&negations), ExpressionErrorKind::TooDeep);
    }

    #[test]
    fn error_display_carries_input() {
        let Err(err) = parse("{a} >") else {
            panic!("expected failure");
        };
        assert!(err.to_string().contains("{a} >"));
    }

    #[test]
    fn operator_fragment_classification() {
        assert!(is_operator_fragment(" > "));
        assert!(is_operator_fragment(" + 1 "));
        assert!(is_operator_fragment("("));
        assert!(!is_operator_fragment(" "));
        assert!(!is_operator_fragment("12"));
        assert!(!is_operator_fragment(" px"));
        assert!(!is_operator_fragment(""));
    }
}
