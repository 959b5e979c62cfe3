//! Detects a secondary solution that is a copy of the primary.
//!
//! Two sources are the same solution when they match textually (comments
//! stripped, whitespace collapsed) or structurally (token streams equal
//! once identifiers are renamed by order of first appearance).

use std::collections::HashMap;

/// How two solutions were found to coincide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sameness {
    Textual,
    Structural,
}

impl std::fmt::Display for Sameness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Textual => f.write_str("textually identical"),
            Self::Structural => f.write_str("identical up to renaming"),
        }
    }
}

/// Compare two solution sources
pub fn compare_solutions(primary: &str, secondary: &str) -> Option<Sameness> {
    let a = tokenize(primary);
    let b = tokenize(secondary);
    if a == b {
        return Some(Sameness::Textual);
    }
    if canonicalize(&a) == canonicalize(&b) {
        return Some(Sameness::Structural);
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Keyword(String),
    Literal(String),
    Punct(char),
}

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "default", "delete", "do", "else",
    "false", "finally", "for", "function", "if", "in", "instanceof", "let", "new", "null", "of",
    "return", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void",
    "while", "Math", "Infinity", "Array", "Map", "Set", "Object", "Number", "String", "JSON",
];

/// Split a source into tokens, dropping comments and whitespace. Equal
/// token streams mean equal sources modulo layout and comments.
fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c.is_whitespace() {
            i += 1;
        } else if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && next == Some('*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i += 2;
        } else if c == '"' || c == '\'' || c == '`' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i += 1;
            let end = i.min(chars.len());
            tokens.push(Token::Literal(chars[start..end].iter().collect()));
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            tokens.push(Token::Literal(chars[start..i].iter().collect()));
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if KEYWORDS.contains(&word.as_str()) {
                tokens.push(Token::Keyword(word));
            } else {
                tokens.push(Token::Ident(word));
            }
        } else {
            tokens.push(Token::Punct(c));
            i += 1;
        }
    }
    tokens
}

/// Rename identifiers by first appearance
fn canonicalize(tokens: &[Token]) -> Vec<Token> {
    let mut names: HashMap<&str, usize> = HashMap::new();
    tokens
        .iter()
        .map(|token| match token {
            Token::Ident(name) => {
                let next = names.len();
                let id = *names.entry(name.as_str()).or_insert(next);
                Token::Ident(format!("${id}"))
            }
            other => other.clone(),
        })
        .collect()
}
