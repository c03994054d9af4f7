#![forbid(unsafe_code)]

//! Operator expressions over record fields.
//!
//! Operator fragments and field tokens are lexed into one token stream,
//! parsed once by precedence climbing into a [`Program`], and evaluated
//! against a record on every render.
//!
//! Precedence, loosest first:
//!
//! | Level | Operators              |
//! |-------|------------------------|
//! | 1     | `\|\|`                 |
//! | 2     | `&&`                   |
//! | 3     | `\|`                   |
//! | 4     | `&`                    |
//! | 5     | `==` `!=` `===` `!==`  |
//! | 6     | `<` `>` `<=` `>=`      |
//! | 7     | `+` `-`                |
//! | 8     | `*` `/` `%`            |
//! | 9     | unary `!` `-` `+`      |
//!
//! Parsing rejects trees deeper than [`MAX_NESTING`] levels, which bounds
//! the recursion of both parsing and evaluation.

use std::cmp::Ordering;
use std::fmt;

use crate::record::ObservableRecord;
use crate::value::Value;

/// Deepest expression tree a binding may compile to.
pub const MAX_NESTING: usize = 64;

/// Why a token stream failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompileError {
    Malformed(String),
    TooDeep,
}

impl From<String> for CompileError {
    fn from(reason: String) -> Self {
        Self::Malformed(reason)
    }
}

/// Characters an operator fragment may contain besides digits and spaces.
pub(crate) const OPERATOR_CHARS: [char; 13] = [
    '=', '>', '<', '!', '&', '|', '+', '-', '*', '/', '%', '(', ')',
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Field(String),
    Op(&'static str),
    LParen,
    RParen,
}

/// Lex one operator fragment, appending to `out`.
pub(crate) fn lex_fragment(fragment: &str, out: &mut Vec<Token>) -> Result<(), String> {
    const OPS: [&str; 18] = [
        "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "<", ">", "!", "&", "|", "+", "-", "*",
        "/", "%",
    ];
    let mut rest = fragment;
    while let Some(ch) = rest.chars().next() {
        if ch.is_whitespace() {
            rest = &rest[ch.len_utf8()..];
        } else if ch.is_ascii_digit() {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let number = rest[..end]
                .parse::<f64>()
                .map_err(|_| format!("bad number literal '{}'", &rest[..end]))?;
            out.push(Token::Number(number));
            rest = &rest[end..];
        } else if ch == '(' {
            out.push(Token::LParen);
            rest = &rest[1..];
        } else if ch == ')' {
            out.push(Token::RParen);
            rest = &rest[1..];
        } else if let Some(op) = OPS.iter().find(|op| rest.starts_with(**op)) {
            out.push(Token::Op(*op));
            rest = &rest[op.len()..];
        } else if ch == '=' {
            return Err("assignment is not allowed in a binding expression".to_string());
        } else {
            return Err(format!("unexpected character '{ch}'"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitAnd,
    LooseEq,
    LooseNe,
    StrictEq,
    StrictNe,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    fn from_token(op: &str) -> Option<(Self, u8)> {
        let pair = match op {
            "||" => (Self::Or, 1),
            "&&" => (Self::And, 2),
            "|" => (Self::BitOr, 3),
            "&" => (Self::BitAnd, 4),
            "==" => (Self::LooseEq, 5),
            "!=" => (Self::LooseNe, 5),
            "===" => (Self::StrictEq, 5),
            "!==" => (Self::StrictNe, 5),
            "<" => (Self::Lt, 6),
            ">" => (Self::Gt, 6),
            "<=" => (Self::Le, 6),
            ">=" => (Self::Ge, 6),
            "+" => (Self::Add, 7),
            "-" => (Self::Sub, 7),
            "*" => (Self::Mul, 8),
            "/" => (Self::Div, 8),
            "%" => (Self::Rem, 8),
            _ => return None,
        };
        Some(pair)
    }
}

/// Expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Field read; absent fields evaluate to the empty string.
    Field(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn evaluate(&self, record: &dyn ObservableRecord) -> Value {
        match self {
            Self::Number(n) => Value::Number(*n),
            Self::Field(field) => {
                if record.has(field) {
                    record.get(field)
                } else {
                    Value::String(String::new())
                }
            }
            Self::Unary(op, operand) => {
                let v = operand.evaluate(record);
                match op {
                    UnaryOp::Not => Value::Bool(!v.truthy()),
                    UnaryOp::Neg => Value::Number(-v.to_number()),
                    UnaryOp::Plus => Value::Number(v.to_number()),
                }
            }
            Self::Binary(BinaryOp::Or, lhs, rhs) => {
                let l = lhs.evaluate(record);
                if l.truthy() { l } else { rhs.evaluate(record) }
            }
            Self::Binary(BinaryOp::And, lhs, rhs) => {
                let l = lhs.evaluate(record);
                if l.truthy() { rhs.evaluate(record) } else { l }
            }
            Self::Binary(op, lhs, rhs) => {
                apply_binary(*op, lhs.evaluate(record), rhs.evaluate(record))
            }
        }
    }
}

fn apply_binary(op: BinaryOp, l: Value, r: Value) -> Value {
    match op {
        BinaryOp::Add => match (&l, &r) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(l.to_display_string() + &r.to_display_string())
            }
            _ => Value::Number(l.to_number() + r.to_number()),
        },
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        BinaryOp::Rem => Value::Number(l.to_number() % r.to_number()),
        BinaryOp::BitOr => Value::Number(f64::from(l.to_int32() | r.to_int32())),
        BinaryOp::BitAnd => Value::Number(f64::from(l.to_int32() & r.to_int32())),
        BinaryOp::LooseEq => Value::Bool(l.loose_eq(&r)),
        BinaryOp::LooseNe => Value::Bool(!l.loose_eq(&r)),
        BinaryOp::StrictEq => Value::Bool(l.strict_eq(&r)),
        BinaryOp::StrictNe => Value::Bool(!l.strict_eq(&r)),
        BinaryOp::Lt => Value::Bool(l.compare(&r) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(l.compare(&r) == Some(Ordering::Greater)),
        BinaryOp::Le => Value::Bool(matches!(
            l.compare(&r),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Ge => Value::Bool(matches!(
            l.compare(&r),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Or => {
            if l.truthy() {
                l
            } else {
                r
            }
        }
        BinaryOp::And => {
            if l.truthy() {
                r
            } else {
                l
            }
        }
    }
}

/// A compiled operator expression.
#[derive(Clone, PartialEq)]
pub struct Program {
    root: Expr,
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Program").field(&self.root).finish()
    }
}

impl Program {
    /// Parse a full token stream.
    pub(crate) fn compile(tokens: Vec<Token>) -> Result<Self, CompileError> {
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let (root, _) = parser.expression(0)?;
        if let Some(token) = parser.peek() {
            return Err(format!("unexpected trailing token {token:?}").into());
        }
        Ok(Self { root })
    }

    /// The parsed tree.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.root
    }

    /// Evaluate against `record`.
    #[must_use]
    pub fn evaluate(&self, record: &dyn ObservableRecord) -> Value {
        self.root.evaluate(record)
    }
}

/// A subtree together with its height.
type Node = (Expr, usize);

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Open prefix operators and parentheses on the call stack.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn descend(&mut self) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(CompileError::TooDeep);
        }
        Ok(())
    }

    fn expression(&mut self, min_prec: u8) -> Result<Node, CompileError> {
        let (mut lhs, mut height) = self.unary()?;
        loop {
            let Some(Token::Op(op)) = self.peek() else {
                break;
            };
            let Some((binary, prec)) = BinaryOp::from_token(op) else {
                return Err(format!("'{op}' is not a binary operator").into());
            };
            if prec <= min_prec {
                break;
            }
            self.pos += 1;
            let (rhs, rhs_height) = self.expression(prec)?;
            height = height.max(rhs_height) + 1;
            if height > MAX_NESTING {
                return Err(CompileError::TooDeep);
            }
            lhs = Expr::Binary(binary, Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, height))
    }

    fn unary(&mut self) -> Result<Node, CompileError> {
        let op = match self.peek() {
            Some(Token::Op("!")) => UnaryOp::Not,
            Some(Token::Op("-")) => UnaryOp::Neg,
            Some(Token::Op("+")) => UnaryOp::Plus,
            _ => return self.primary(),
        };
        self.pos += 1;
        self.descend()?;
        let (operand, height) = self.unary()?;
        self.depth -= 1;
        if height + 1 > MAX_NESTING {
            return Err(CompileError::TooDeep);
        }
        Ok((Expr::Unary(op, Box::new(operand)), height + 1))
    }

    fn primary(&mut self) -> Result<Node, CompileError> {
        match self.next() {
            Some(Token::Number(n)) => Ok((Expr::Number(n), 1)),
            Some(Token::Field(field)) => Ok((Expr::Field(field), 1)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.expression(0)?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("missing ')'".to_string().into()),
                }
            }
            Some(Token::RParen) => Err("unexpected ')'".to_string().into()),
            Some(Token::Op(op)) => Err(format!("unexpected operator '{op}'").into()),
            None => Err("unexpected end of expression".to_string().into()),
        }
    }
}
