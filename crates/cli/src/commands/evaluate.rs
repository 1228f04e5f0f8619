use std::path::PathBuf;

use clientlens_core::config::ConfigOverrides;
use clientlens_core::engine::FocusEngine;
use clientlens_core::errors::ApplicationError;
use serde_json::json;

use super::{input, to_data, CommandResult};

const COMMAND: &str = "evaluate";

#[derive(Debug, Clone, Default)]
pub struct EvaluateArgs {
    pub ledger: PathBuf,
    pub task: PathBuf,
    pub directory: Option<PathBuf>,
    pub now: Option<String>,
    pub chunk_size: Option<usize>,
}

pub fn run(args: EvaluateArgs) -> CommandResult {
    match execute(&args) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, error),
    }
}

fn execute(args: &EvaluateArgs) -> Result<CommandResult, ApplicationError> {
    let config = input::load_config(ConfigOverrides {
        snapshot_chunk_size: args.chunk_size,
        ..ConfigOverrides::default()
    })?;
    let ledger = input::load_ledger(&args.ledger)?;
    let task = input::load_task(&args.task)?;
    let directories = input::load_directories(args.directory.as_deref())?;
    let now = input::resolve_now(args.now.as_deref())?;

    let chunk_size = config.engine.snapshot_chunk_size;
    let engine = FocusEngine::new(config.engine, directories);
    let evaluation = engine.evaluate(&ledger, &task, now)?;
    let chunks = evaluation.snapshot.chunks(chunk_size);

    let data = json!({
        "task_id": evaluation.snapshot.task_id,
        "generated_at": evaluation.snapshot.generated_at,
        "match_counts": to_data(&evaluation.snapshot.match_counts)?,
        "matched_clients": evaluation.matched_clients(),
        "per_parameter": to_data(&evaluation.per_parameter)?,
        "chunks": to_data(&chunks)?,
    });

    Ok(CommandResult::success_with(
        COMMAND,
        format!(
            "{} clients matched across {} parameters in {} chunk(s)",
            evaluation.matched_clients(),
            evaluation.per_parameter.len(),
            chunks.len()
        ),
        Some(data),
    ))
}
