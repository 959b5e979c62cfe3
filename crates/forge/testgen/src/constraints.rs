//! Constraint checker
//!
//! Parses the bounds a problem states in its constraints text and checks
//! generated inputs against them. Recognized line shapes:
//!
//! ```text
//! 2 <= nums.length <= 10^4        length of an array or string
//! -10⁹ ≤ target ≤ 10⁹             a number parameter
//! -100 <= nums[i] < 100           every element (any nesting depth)
//! 1 <= words[i].length <= 20      length of every element
//! 1 <= m, n <= 200                several targets share a bound
//! 0 <= k                          one-sided bounds, either direction
//! ```
//!
//! Lines that do not parse, or that name something other than a
//! parameter, are ignored: the checker only rejects what it understands.

use forge_types::{Parameter, TestCase};
use serde_json::Value;
use std::fmt;

// ── Bounds ───────────────────────────────────────────────────────────

/// What a bound constrains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `x`
    Value,
    /// `x.length`
    Length,
    /// `x[i]`, `x[i][j]`
    Elements,
    /// `x[i].length`
    ElementLength,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limit {
    pub value: f64,
    pub inclusive: bool,
}

/// One parsed bound on one parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub param_index: usize,
    pub param_name: String,
    pub target: Target,
    pub lower: Option<Limit>,
    pub upper: Option<Limit>,
    /// The constraints line the bound came from
    pub line: String,
}

impl Bound {
    fn admits(&self, x: f64) -> bool {
        let above = self.lower.map_or(true, |l| {
            if l.inclusive {
                x >= l.value
            } else {
                x > l.value
            }
        });
        let below = self.upper.map_or(true, |u| {
            if u.inclusive {
                x <= u.value
            } else {
                x < u.value
            }
        });
        above && below
    }

    /// The measured quantities of an argument this bound applies to
    fn measure(&self, arg: &Value) -> Vec<f64> {
        match self.target {
            Target::Value => arg.as_f64().into_iter().collect(),
            Target::Length => length_of(arg).into_iter().collect(),
            Target::Elements => {
                let mut out = Vec::new();
                collect_numbers(arg, &mut out);
                out
            }
            Target::ElementLength => arg
                .as_array()
                .map(|items| items.iter().filter_map(length_of).collect())
                .unwrap_or_default(),
        }
    }
}

fn length_of(value: &Value) -> Option<f64> {
    match value {
        Value::Array(items) => Some(items.len() as f64),
        Value::String(s) => Some(s.chars().count() as f64),
        _ => None,
    }
}

fn collect_numbers(value: &Value, out: &mut Vec<f64>) {
    if let Value::Array(items) = value {
        for item in items {
            match item {
                Value::Number(n) => out.extend(n.as_f64()),
                Value::Array(_) => collect_numbers(item, out),
                _ => {}
            }
        }
    }
}

/// A case that breaks a stated bound
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub line: String,
    pub param_name: String,
    pub measured: f64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` violated by {} (measured {})",
            self.line, self.param_name, self.measured
        )
    }
}

// ── Constraint Set ───────────────────────────────────────────────────

/// All bounds parsed from one problem's constraints text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    bounds: Vec<Bound>,
}

impl Constraints {
    pub fn parse(text: &str, parameters: &[Parameter]) -> Self {
        let bounds = text
            .lines()
            .flat_map(|line| parse_line(line, parameters))
            .collect();
        Self { bounds }
    }

    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Check every bound against a case's inputs
    pub fn check(&self, case: &TestCase) -> Result<(), Violation> {
        for bound in &self.bounds {
            let Some(arg) = case.input.get(bound.param_index) else {
                continue;
            };
            if let Some(bad) = bound.measure(arg).into_iter().find(|x| !bound.admits(*x)) {
                return Err(Violation {
                    line: bound.line.clone(),
                    param_name: bound.param_name.clone(),
                    measured: bad,
                });
            }
        }
        Ok(())
    }
}

// ── Line Parsing ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn is_less(self) -> bool {
        matches!(self, Op::Lt | Op::Le)
    }

    fn inclusive(self) -> bool {
        matches!(self, Op::Le | Op::Ge)
    }
}

fn clean_line(line: &str) -> String {
    let mut text = line.trim();
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = text.strip_prefix(bullet) {
            text = rest.trim_start();
        }
    }
    text.replace(['`', '$'], "")
        .replace('≤', "<=")
        .replace('≥', ">=")
        .replace("\\leq", "<=")
        .replace("\\le", "<=")
        .replace("\\geq", ">=")
        .replace("\\ge", ">=")
        .replace("\\times", "*")
}

fn split_ops(text: &str) -> (Vec<String>, Vec<Op>) {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = vec![String::new()];
    let mut ops = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '<' || c == '>' {
            let eq = chars.get(i + 1) == Some(&'=');
            ops.push(match (c, eq) {
                ('<', true) => Op::Le,
                ('<', false) => Op::Lt,
                (_, true) => Op::Ge,
                (_, false) => Op::Gt,
            });
            segments.push(String::new());
            i += if eq { 2 } else { 1 };
        } else {
            if let Some(current) = segments.last_mut() {
                current.push(c);
            }
            i += 1;
        }
    }
    (segments, ops)
}

fn parse_line(line: &str, parameters: &[Parameter]) -> Vec<Bound> {
    let cleaned = clean_line(line);
    let (segments, ops) = split_ops(&cleaned);

    let (targets, lower, upper) = match (segments.as_slice(), ops.as_slice()) {
        ([lo, mid, hi], [a, b]) if a.is_less() && b.is_less() => (
            mid,
            eval_number(lo).map(|v| Limit { value: v, inclusive: a.inclusive() }),
            eval_number(hi).map(|v| Limit { value: v, inclusive: b.inclusive() }),
        ),
        ([hi, mid, lo], [a, b]) if !a.is_less() && !b.is_less() => (
            mid,
            eval_number(lo).map(|v| Limit { value: v, inclusive: b.inclusive() }),
            eval_number(hi).map(|v| Limit { value: v, inclusive: a.inclusive() }),
        ),
        ([left, right], [op]) => match (eval_number(left), eval_number(right)) {
            (Some(v), None) => {
                let limit = Some(Limit { value: v, inclusive: op.inclusive() });
                if op.is_less() {
                    (right, limit, None)
                } else {
                    (right, None, limit)
                }
            }
            (None, Some(v)) => {
                let limit = Some(Limit { value: v, inclusive: op.inclusive() });
                if op.is_less() {
                    (left, None, limit)
                } else {
                    (left, limit, None)
                }
            }
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    if lower.is_none() && upper.is_none() {
        return Vec::new();
    }
    // a two-sided line with one unparseable side is not trusted at all
    if ops.len() == 2 && (lower.is_none() || upper.is_none()) {
        return Vec::new();
    }

    targets
        .split(',')
        .filter_map(|t| parse_target(t.trim()))
        .filter_map(|(name, target)| {
            let param_index = parameters.iter().position(|p| p.name == name)?;
            Some(Bound {
                param_index,
                param_name: name,
                target,
                lower,
                upper,
                line: line.trim().to_string(),
            })
        })
        .collect()
}

fn parse_target(text: &str) -> Option<(String, Target)> {
    let name_len = text
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_alphanumeric() || *c == '_' || (*i == 0 && *c == '$'))
        .count();
    let name = &text[..name_len];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let mut rest = &text[name_len..];
    let mut indexed = false;
    while let Some(inner) = rest.strip_prefix('[') {
        let close = inner.find(']')?;
        rest = &inner[close + 1..];
        indexed = true;
    }

    let target = match (indexed, rest.trim()) {
        (false, "") => Target::Value,
        (false, ".length") => Target::Length,
        (true, "") => Target::Elements,
        (true, ".length") => Target::ElementLength,
        _ => return None,
    };
    Some((name.to_string(), target))
}

// ── Number Expressions ───────────────────────────────────────────────

fn superscript_digit(c: char) -> Option<char> {
    let digit = match c {
        '⁰' => '0',
        '¹' => '1',
        '²' => '2',
        '³' => '3',
        '⁴' => '4',
        '⁵' => '5',
        '⁶' => '6',
        '⁷' => '7',
        '⁸' => '8',
        '⁹' => '9',
        '⁻' => '-',
        _ => return None,
    };
    Some(digit)
}

/// Evaluate `-10^9`, `10⁴`, `2 * 10^5`, `2^31 - 1`, `1,000`, `1e5`
pub fn eval_number(text: &str) -> Option<f64> {
    let mut chars = Vec::new();
    let mut in_superscript = false;
    for c in text.chars() {
        if c.is_whitespace() || c == ',' || c == '_' {
            continue;
        }
        match superscript_digit(c) {
            Some(d) => {
                if !in_superscript {
                    chars.push('^');
                }
                chars.push(d);
                in_superscript = true;
            }
            None => {
                chars.push(c);
                in_superscript = false;
            }
        }
    }
    let mut parser = ExprParser { chars, pos: 0 };
    let value = parser.expr()?;
    (parser.pos == parser.chars.len() && value.is_finite()).then_some(value)
}

struct ExprParser {
    chars: Vec<char>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expr(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(c @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if c == '+' { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.unary()?;
        while let Some('*' | '×' | 'x') = self.peek() {
            self.pos += 1;
            value *= self.unary()?;
        }
        Some(value)
    }

    fn unary(&mut self) -> Option<f64> {
        if self.peek() == Some('-') {
            self.pos += 1;
            return Some(-self.unary()?);
        }
        self.power()
    }

    fn power(&mut self) -> Option<f64> {
        let base = self.number()?;
        if self.peek() == Some('^') {
            self.pos += 1;
            let exp = self.unary()?;
            return Some(base.powf(exp));
        }
        Some(base)
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '-' || c == '+')
                && self.pos > start
                && matches!(self.chars.get(self.pos - 1), Some('e' | 'E'));
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse().ok()
    }
}
