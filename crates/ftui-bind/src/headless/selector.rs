#![forbid(unsafe_code)]

//! Minimal selector engine for the headless tree.
//!
//! Supported grammar:
//!
//! ```text
//! list      := complex ( ',' complex )*
//! complex   := compound ( combinator compound )*
//! combinator:= ' ' | '>'
//! compound  := ( tag | '*' )? ( '#' id | '.' class | '[' attr ( '=' value )? ']'
//!              | ':nth-of-type(' n ')' )*
//! ```
//!
//! Matching walks right to left, backtracking over ancestors for the
//! descendant combinator.

use std::fmt;

use super::{Arena, NodeId};

/// A parse failure with the offending selector text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorError {
    pub selector: String,
    pub reason: &'static str,
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid selector '{}': {}", self.selector, self.reason)
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    universal: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
    nth_of_type: Option<usize>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.nth_of_type.is_none()
    }

    fn matches(&self, arena: &Arena, node: NodeId) -> bool {
        let data = arena.node(node);
        if let Some(tag) = &self.tag
            && !data.tag.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && data.attributes.get("id") != Some(id)
        {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = data.attributes.get("class").map_or("", String::as_str);
            let has_all = self
                .classes
                .iter()
                .all(|class| class_attr.split_whitespace().any(|c| c == class));
            if !has_all {
                return false;
            }
        }
        for (name, expected) in &self.attributes {
            match (data.attributes.get(name), expected) {
                (None, _) => return false,
                (Some(actual), Some(expected)) if actual != expected => return false,
                _ => {}
            }
        }
        if let Some(n) = self.nth_of_type
            && arena.position_of_type(node) != Some(n)
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// Compounds left to right; `combinators[i]` joins `compounds[i]` and
    /// `compounds[i + 1]`.
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, arena: &Arena, node: NodeId) -> bool {
        self.matches_at(arena, node, self.compounds.len() - 1)
    }

    fn matches_at(&self, arena: &Arena, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(arena, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => arena
                .node(node)
                .parent
                .is_some_and(|parent| self.matches_at(arena, parent, index - 1)),
            Combinator::Descendant => {
                let mut current = arena.node(node).parent;
                while let Some(ancestor) = current {
                    if self.matches_at(arena, ancestor, index - 1) {
                        return true;
                    }
                    current = arena.node(ancestor).parent;
                }
                false
            }
        }
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    /// Parse `input`. The empty selector is rejected; callers treat it as
    /// "the root itself" before parsing.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let fail = |reason| SelectorError {
            selector: input.to_string(),
            reason,
        };
        let mut alternatives = Vec::new();
        for part in split_top_level(input) {
            let part = part.trim();
            if part.is_empty() {
                return Err(fail("empty selector"));
            }
            alternatives.push(parse_complex(part).map_err(fail)?);
        }
        Ok(Self { alternatives })
    }

    /// Whether `node` matches any alternative.
    pub(crate) fn matches(&self, arena: &Arena, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(arena, node))
    }
}

fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn parse_complex(input: &str) -> Result<Complex, &'static str> {
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pending: Option<Combinator> = None;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            if !compounds.is_empty() && pending.is_none() {
                pending = Some(Combinator::Descendant);
            }
            pos += 1;
            continue;
        }
        if ch == '>' {
            if compounds.is_empty() || pending == Some(Combinator::Child) {
                return Err("dangling child combinator");
            }
            pending = Some(Combinator::Child);
            pos += 1;
            continue;
        }

        let (compound, next) = parse_compound(&chars, pos)?;
        if compound.is_empty() {
            return Err("unexpected character");
        }
        if let Some(combinator) = pending.take() {
            combinators.push(combinator);
        } else if !compounds.is_empty() {
            return Err("missing combinator");
        }
        compounds.push(compound);
        pos = next;
    }

    if pending == Some(Combinator::Child) {
        return Err("dangling child combinator");
    }
    if compounds.is_empty() {
        return Err("empty selector");
    }
    Ok(Complex {
        compounds,
        combinators,
    })
}

fn read_ident(chars: &[char], mut pos: usize) -> (String, usize) {
    let start = pos;
    while pos < chars.len() && is_ident_char(chars[pos]) {
        pos += 1;
    }
    (chars[start..pos].iter().collect(), pos)
}

fn parse_compound(chars: &[char], mut pos: usize) -> Result<(Compound, usize), &'static str> {
    let mut compound = Compound::default();

    if chars[pos] == '*' {
        compound.universal = true;
        pos += 1;
    } else if is_ident_char(chars[pos]) {
        let (tag, next) = read_ident(chars, pos);
        compound.tag = Some(tag);
        pos = next;
    }

    while pos < chars.len() {
        match chars[pos] {
            '#' => {
                let (id, next) = read_ident(chars, pos + 1);
                if id.is_empty() {
                    return Err("empty id");
                }
                compound.id = Some(id);
                pos = next;
            }
            '.' => {
                let (class, next) = read_ident(chars, pos + 1);
                if class.is_empty() {
                    return Err("empty class");
                }
                compound.classes.push(class);
                pos = next;
            }
            '[' => {
                let close = chars[pos..]
                    .iter()
                    .position(|&c| c == ']')
                    .ok_or("unterminated attribute selector")?;
                let body: String = chars[pos + 1..pos + close].iter().collect();
                let (name, value) = match body.split_once('=') {
                    Some((name, value)) => (
                        name.trim().to_string(),
                        Some(value.trim().trim_matches(&['"', '\''][..]).to_string()),
                    ),
                    None => (body.trim().to_string(), None),
                };
                if name.is_empty() {
                    return Err("empty attribute name");
                }
                compound.attributes.push((name, value));
                pos += close + 1;
            }
            ':' => {
                let (pseudo, next) = read_ident(chars, pos + 1);
                if pseudo != "nth-of-type" || chars.get(next) != Some(&'(') {
                    return Err("unsupported pseudo-class");
                }
                let close = chars[next..]
                    .iter()
                    .position(|&c| c == ')')
                    .ok_or("unterminated pseudo-class")?;
                let arg: String = chars[next + 1..next + close].iter().collect();
                let n = arg
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or("nth-of-type expects a positive integer")?;
                compound.nth_of_type = Some(n);
                pos = next + close + 1;
            }
            _ => break,
        }
    }
    Ok((compound, pos))
}
