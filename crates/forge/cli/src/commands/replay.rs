//! Replay a recorded generation fixture through the full pipeline

use crate::commands::read_json;
use crate::error::{CliError, CliResult};
use forge_builder::{
    store_from_config, Builder, ForgeConfig, GenerationFixture, Pipeline,
    ScriptedGenerationService,
};
use forge_types::BuilderPhase;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn execute(config: &ForgeConfig, fixture: &Path, problem_name: Option<String>) -> CliResult<()> {
    let fixture: GenerationFixture = read_json(fixture).await?;
    let problem_name = problem_name.unwrap_or_else(|| fixture.problem.title.clone());
    let service = Arc::new(ScriptedGenerationService::from_fixture(fixture));
    let pipeline = Pipeline::new(config, service, store_from_config(&config.storage));

    let (builder, handle) = Builder::new(pipeline.clone(), problem_name);
    let run = tokio::spawn(builder.run());

    let mut updates = handle.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            info!(phase = %state.phase, "{}", state.phase_description);
            if state.is_terminal() {
                break;
            }
        }
    });

    let state = tokio::select! {
        state = run => state.map_err(|e| CliError::Unsuccessful(format!("builder task failed: {e}")))?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cancelling builder");
            handle.cancel();
            handle.wait().await
        }
    };
    progress.abort();

    println!("{}", serde_json::to_string_pretty(&state)?);

    match state.phase {
        BuilderPhase::Completed => {
            let saved = pipeline.store().list_problems().await?;
            info!(problems = saved.len(), "Store now holds {}", saved.join(", "));
            Ok(())
        }
        phase => Err(CliError::Unsuccessful(format!(
            "builder ended {phase}: {}",
            state.error.as_deref().unwrap_or("no error recorded")
        ))),
    }
}
