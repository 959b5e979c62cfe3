//! Interpreter limits

use serde::{Deserialize, Serialize};

/// Limits applied to every interpreter instance.
///
/// The wall-clock timeout is per request; these limits stop a runaway
/// script that is no longer being awaited from spinning forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Maximum iterations of any single loop
    #[serde(default = "default_loop_iteration_limit")]
    pub loop_iteration_limit: u64,

    /// Maximum call depth
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: usize,
}

fn default_loop_iteration_limit() -> u64 {
    50_000_000
}

fn default_recursion_limit() -> usize {
    1024
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            loop_iteration_limit: default_loop_iteration_limit(),
            recursion_limit: default_recursion_limit(),
        }
    }
}

impl SandboxConfig {
    pub fn with_loop_iteration_limit(mut self, limit: u64) -> Self {
        self.loop_iteration_limit = limit;
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SandboxConfig = serde_json::from_str(r#"{"recursion_limit": 64}"#).unwrap();
        assert_eq!(config.recursion_limit, 64);
        assert_eq!(config.loop_iteration_limit, 50_000_000);
    }
}
