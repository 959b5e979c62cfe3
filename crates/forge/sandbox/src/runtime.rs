//! Sandbox trait and the embedded interpreter implementation

use crate::host;
use crate::program::{as_function_body, ExecutionRequest};
use crate::{ExecutionError, SandboxConfig, SandboxResult};
use async_trait::async_trait;
use boa_engine::{Context, JsError, JsNativeErrorKind, Script, Source};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Executes untrusted script code with a bounded capability set
#[async_trait]
pub trait ScriptSandbox: Send + Sync {
    /// Run a function body with its bindings and return its result
    async fn execute(&self, request: ExecutionRequest) -> SandboxResult<Value>;

    /// Check that `source` parses as a function body
    async fn check_syntax(&self, source: &str) -> SandboxResult<()>;
}

/// Sandbox backed by an embedded JavaScript interpreter.
///
/// Each execution gets a fresh interpreter context on a blocking worker
/// thread: no state survives between executions, and the only host
/// capability is the codec/comparator entry point.
#[derive(Debug, Clone, Default)]
pub struct BoaSandbox {
    config: SandboxConfig,
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

impl BoaSandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    fn new_context(config: &SandboxConfig) -> SandboxResult<Context> {
        let mut context = Context::default();
        let limits = context.runtime_limits_mut();
        limits.set_loop_iteration_limit(config.loop_iteration_limit);
        limits.set_recursion_limit(config.recursion_limit);
        host::register(&mut context).map_err(|e| ExecutionError::Internal(e.to_string()))?;
        Ok(context)
    }

    fn run_program(program: &str, config: &SandboxConfig) -> SandboxResult<Value> {
        let mut context = Self::new_context(config)?;
        let result = context
            .eval(Source::from_bytes(program))
            .map_err(|e| classify(e, &mut context))?;
        let text = result
            .to_string(&mut context)
            .map_err(|e| ExecutionError::InvalidOutput(e.to_string()))?
            .to_std_string_escaped();

        let envelope: Envelope = serde_json::from_str(&text)?;
        match (envelope.ok, envelope.error) {
            (true, _) => Ok(envelope.value),
            (false, Some(msg)) if msg.starts_with("RuntimeLimit") => {
                Err(ExecutionError::LimitExceeded(msg))
            }
            (false, msg) => Err(ExecutionError::Runtime(
                msg.unwrap_or_else(|| "unknown exception".into()),
            )),
        }
    }

    fn parse_only(source: &str, config: &SandboxConfig) -> SandboxResult<()> {
        let mut context = Self::new_context(config)?;
        Script::parse(Source::from_bytes(source), None, &mut context)
            .map(|_| ())
            .map_err(|e| match classify(e, &mut context) {
                ExecutionError::Runtime(msg) => ExecutionError::Syntax(msg),
                other => other,
            })
    }

    async fn on_worker<T, F>(&self, timeout: Duration, work: F) -> SandboxResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SandboxConfig) -> SandboxResult<T> + Send + 'static,
    {
        let config = self.config.clone();
        let handle = tokio::task::spawn_blocking(move || work(&config));
        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ExecutionError::Internal(format!(
                "sandbox worker failed: {join_err}"
            ))),
            Err(_) => Err(ExecutionError::Timeout { after: timeout }),
        }
    }
}

/// Map an interpreter error onto the execution error taxonomy
fn classify(err: JsError, context: &mut Context) -> ExecutionError {
    match err.try_native(context) {
        Ok(native) => match native.kind {
            JsNativeErrorKind::Syntax => ExecutionError::Syntax(native.to_string()),
            JsNativeErrorKind::RuntimeLimit => ExecutionError::LimitExceeded(native.to_string()),
            _ => ExecutionError::Runtime(native.to_string()),
        },
        Err(_) => ExecutionError::Runtime(err.to_string()),
    }
}

#[async_trait]
impl ScriptSandbox for BoaSandbox {
    async fn execute(&self, request: ExecutionRequest) -> SandboxResult<Value> {
        let program = request.to_program()?;
        let started = Instant::now();
        let result = self
            .on_worker(request.timeout, move |config| {
                Self::run_program(&program, config)
            })
            .await;

        match &result {
            Ok(_) => debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Script finished"),
            Err(e) if e.is_timeout() => warn!(error = %e, "Script did not finish"),
            Err(e) => debug!(error = %e, "Script failed"),
        }
        result
    }

    async fn check_syntax(&self, source: &str) -> SandboxResult<()> {
        let wrapped = as_function_body(source);
        self.on_worker(Duration::from_secs(10), move |config| {
            Self::parse_only(&wrapped, config)
        })
        .await
    }
}
