//! Script programs: a function body plus the named values bound in its scope

use crate::{ExecutionError, SandboxResult};
use serde_json::Value;
use std::time::Duration;

/// The prelude evaluated ahead of every program
pub const PRELUDE: &str = include_str!("prelude.js");

/// A value bound to a name in the script's scope
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// JSON data; tagged node graphs anywhere inside are inflated into
    /// live nodes
    Value(Value),
    /// A JavaScript expression evaluated after the prelude
    Expression(String),
}

impl Binding {
    /// Bind the function `name` defined by `source` (a declaration,
    /// `var` assignment or any statements that define it)
    pub fn function(source: &str, name: &str) -> Self {
        Self::Expression(format!(
            "(function () {{\n{source}\n;return {name};\n}})()"
        ))
    }

    fn render(&self) -> SandboxResult<String> {
        match self {
            Self::Value(value) => {
                let text = serde_json::to_string(value)
                    .map_err(|e| ExecutionError::Internal(e.to_string()))?;
                let literal = serde_json::to_string(&text)
                    .map_err(|e| ExecutionError::Internal(e.to_string()))?;
                Ok(format!("__forge_inflate(JSON.parse({literal}))"))
            }
            Self::Expression(source) => Ok(format!("({source})")),
        }
    }
}

/// One execution of a function body
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Function body; its `return` value is the result
    pub body: String,
    pub bindings: Vec<(String, Binding)>,
    pub timeout: Duration,
}

impl ExecutionRequest {
    pub fn new(body: impl Into<String>, timeout: Duration) -> Self {
        Self {
            body: body.into(),
            bindings: Vec::new(),
            timeout,
        }
    }

    pub fn bind(mut self, name: impl Into<String>, binding: Binding) -> Self {
        self.bindings.push((name.into(), binding));
        self
    }

    pub fn bind_value(self, name: impl Into<String>, value: Value) -> Self {
        self.bind(name, Binding::Value(value))
    }

    /// Assemble the full program text. The program evaluates to a JSON
    /// envelope string: `{"ok": true, "value": ..}` or
    /// `{"ok": false, "error": ".."}`.
    pub fn to_program(&self) -> SandboxResult<String> {
        let mut names = Vec::with_capacity(self.bindings.len());
        let mut values = Vec::with_capacity(self.bindings.len());
        for (name, binding) in &self.bindings {
            if !is_identifier(name) || name.starts_with("__forge") {
                return Err(ExecutionError::Internal(format!(
                    "invalid binding name: {name:?}"
                )));
            }
            names.push(name.as_str());
            values.push(binding.render()?);
        }

        Ok(format!(
            "{PRELUDE}\n\
             (function () {{\n\
             try {{\n\
             var __forge_result = (function ({params}) {{\n{body}\n}})({args});\n\
             var __forge_out = __forge_export(__forge_result);\n\
             return JSON.stringify({{ ok: true, value: __forge_out === undefined ? null : __forge_out }});\n\
             }} catch (e) {{\n\
             var __forge_msg = (e && e.name && e.message !== undefined) ? e.name + \": \" + e.message : String(e);\n\
             return JSON.stringify({{ ok: false, error: __forge_msg }});\n\
             }}\n\
             }})()\n",
            params = names.join(", "),
            body = self.body,
            args = values.join(", "),
        ))
    }
}

/// Wrap a source as a function body, for syntax checking
pub(crate) fn as_function_body(source: &str) -> String {
    format!("(function () {{\n{source}\n}});")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
