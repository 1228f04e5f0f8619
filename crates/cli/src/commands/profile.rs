use std::collections::BTreeSet;
use std::path::PathBuf;

use clientlens_core::config::ConfigOverrides;
use clientlens_core::engine::FocusEngine;
use clientlens_core::errors::{ApplicationError, DomainError, TaskValidationError};

use super::{input, to_data, CommandResult};

const COMMAND: &str = "profile";

#[derive(Debug, Clone, Default)]
pub struct ProfileArgs {
    pub ledger: PathBuf,
    pub client: String,
    pub focus: Vec<String>,
    pub directory: Option<PathBuf>,
    pub now: Option<String>,
}

pub fn run(args: ProfileArgs) -> CommandResult {
    match execute(&args) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, error),
    }
}

fn execute(args: &ProfileArgs) -> Result<CommandResult, ApplicationError> {
    if args.client.trim().is_empty() {
        return Err(ApplicationError::Input("`--client` must not be empty".to_string()));
    }

    let focus: BTreeSet<String> = args
        .focus
        .iter()
        .map(|code| code.trim())
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect();
    if focus.is_empty() {
        return Err(DomainError::from(TaskValidationError::MissingFocusProducts).into());
    }

    let config = input::load_config(ConfigOverrides::default())?;
    let ledger = input::load_ledger(&args.ledger)?;
    let directories = input::load_directories(args.directory.as_deref())?;
    let now = input::resolve_now(args.now.as_deref())?;

    let engine = FocusEngine::new(config.engine, directories);
    let profile = engine.profile(&ledger, &args.client, &focus, now);

    Ok(CommandResult::success_with(
        COMMAND,
        format!(
            "{} is {} with {} recommendation(s)",
            profile.basic.client_id,
            profile.rfm.segment,
            profile.recommendations.len()
        ),
        Some(to_data(&profile)?),
    ))
}
