use std::path::Path;

use clientlens_core::errors::{ApplicationError, DomainError};
use serde_json::json;

use super::{input, CommandResult};

const COMMAND: &str = "validate";

pub fn run(task_path: &Path) -> CommandResult {
    match execute(task_path) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, error),
    }
}

fn execute(task_path: &Path) -> Result<CommandResult, ApplicationError> {
    let task = input::load_task(task_path)?;
    task.validate().map_err(DomainError::from)?;

    let enabled: Vec<_> = task
        .parameters
        .enabled()
        .into_iter()
        .map(|tag| json!({ "param": tag, "description": tag.description() }))
        .collect();

    Ok(CommandResult::success_with(
        COMMAND,
        format!("task is valid with {} enabled parameter(s)", enabled.len()),
        Some(json!({
            "task_id": task.id,
            "focus_products": task.focus_set(),
            "enabled": enabled,
        })),
    ))
}
