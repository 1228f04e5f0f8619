use std::collections::{BTreeMap, BTreeSet};
use std::thread;

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::directory::{Directories, DEFAULT_UNCATEGORIZED_LABEL};
use crate::domain::matching::{MatchRecord, ParamTag, Snapshot};
use crate::domain::profile::ClientProfile;
use crate::domain::task::{clean_codes, ParameterConfig, TaskDefinition};
use crate::domain::transaction::RawTransaction;
use crate::errors::DomainError;
use crate::index::ClientIndex;
use crate::params::{self, EvaluationContext};
use crate::profile::ProfileAnalyzer;
use crate::snapshot::build_snapshot;

/// Output of one task evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskEvaluation {
    /// Raw evaluator output, keyed by enabled parameter.
    pub per_parameter: BTreeMap<ParamTag, Vec<MatchRecord>>,
    pub snapshot: Snapshot,
}

impl TaskEvaluation {
    pub fn matched_clients(&self) -> usize {
        self.snapshot.entries.len()
    }
}

/// Entry point tying the ledger, directories and a task together.
#[derive(Clone, Debug)]
pub struct FocusEngine {
    config: EngineConfig,
    directories: Directories,
}

impl FocusEngine {
    pub fn new(config: EngineConfig, directories: Directories) -> Self {
        let directories = if directories.uncategorized_label == DEFAULT_UNCATEGORIZED_LABEL {
            directories.with_uncategorized_label(config.uncategorized_label.clone())
        } else {
            directories
        };
        Self { config, directories }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn directories(&self) -> &Directories {
        &self.directories
    }

    /// Validates `task`, runs its enabled parameters over `ledger` and
    /// aggregates the matches into a snapshot.
    pub fn evaluate(
        &self,
        ledger: &[RawTransaction],
        task: &TaskDefinition,
        now: DateTime<Utc>,
    ) -> Result<TaskEvaluation, DomainError> {
        task.validate()?;

        let enabled = task.parameters.enabled();
        tracing::info!(
            event_name = "engine.evaluate.start",
            task_id = task.id.as_deref().unwrap_or(""),
            ledger_lines = ledger.len(),
            parameters = enabled.len(),
            parallel = self.config.parallel_evaluators,
            "evaluating task"
        );

        let index = ClientIndex::build_within(ledger, &self.directories, task.date_range.as_ref());
        let focus = task.focus_set();
        let context = EvaluationContext::new(&focus, now.naive_utc());

        let per_parameter = if self.config.parallel_evaluators && enabled.len() > 1 {
            run_parallel(&enabled, &index, &context, &task.parameters)?
        } else {
            run_sequential(&enabled, &index, &context, &task.parameters)
        };

        let snapshot = build_snapshot(task.id.clone(), now, &per_parameter);

        tracing::info!(
            event_name = "engine.evaluate.completed",
            task_id = task.id.as_deref().unwrap_or(""),
            indexed_clients = index.len(),
            matched_clients = snapshot.entries.len(),
            "task evaluated"
        );

        Ok(TaskEvaluation { per_parameter, snapshot })
    }

    /// Builds the deep profile of one client against a focus product set.
    pub fn profile(
        &self,
        ledger: &[RawTransaction],
        client_id: &str,
        focus: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> ClientProfile {
        let index = ClientIndex::build(ledger, &self.directories);
        let focus = clean_codes(focus);
        ProfileAnalyzer::new(&self.directories, self.config.profile_settings()).analyze(
            &index,
            client_id.trim(),
            &focus,
            now.naive_utc(),
        )
    }
}

fn run_sequential(
    enabled: &[ParamTag],
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    parameters: &ParameterConfig,
) -> BTreeMap<ParamTag, Vec<MatchRecord>> {
    enabled.iter().map(|tag| (*tag, params::evaluate(*tag, index, context, parameters))).collect()
}

fn run_parallel(
    enabled: &[ParamTag],
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    parameters: &ParameterConfig,
) -> Result<BTreeMap<ParamTag, Vec<MatchRecord>>, DomainError> {
    thread::scope(|scope| {
        let handles: Vec<_> = enabled
            .iter()
            .map(|tag| {
                let tag = *tag;
                (tag, scope.spawn(move || params::evaluate(tag, index, context, parameters)))
            })
            .collect();

        handles
            .into_iter()
            .map(|(tag, handle)| {
                handle.join().map(|records| (tag, records)).map_err(|_| {
                    DomainError::InvariantViolation(format!("evaluator for {tag} panicked"))
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{DateTime, TimeZone, Utc};

    use super::FocusEngine;
    use crate::config::EngineConfig;
    use crate::directory::Directories;
    use crate::domain::matching::ParamTag;
    use crate::domain::task::{DateRange, TaskDefinition};
    use crate::domain::transaction::{RawAmount, RawTransaction};
    use crate::errors::{DomainError, TaskValidationError};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single().expect("valid timestamp")
    }

    fn line(client: &str, product: &str, revenue: &str, date: &str) -> RawTransaction {
        RawTransaction {
            client_id: Some(client.to_string()),
            client_name: Some(format!("Client {client}")),
            product_code: Some(product.to_string()),
            revenue: Some(RawAmount::Text(revenue.to_string())),
            date: Some(date.to_string()),
            ..RawTransaction::default()
        }
    }

    fn task() -> TaskDefinition {
        let mut task = TaskDefinition {
            id: Some("task-1".to_string()),
            focus_products: ["F1".to_string()].into_iter().collect(),
            ..TaskDefinition::default()
        };
        task.parameters.param2.enabled = true;
        task.parameters.param2.days = 30;
        task
    }

    #[test]
    fn invalid_task_is_rejected_before_evaluation() {
        let engine = FocusEngine::new(EngineConfig::default(), Directories::default());
        let mut task = task();
        task.focus_products = BTreeSet::new();

        let error = engine.evaluate(&[], &task, now()).expect_err("empty focus must fail");
        assert_eq!(error, DomainError::InvalidTask(TaskValidationError::MissingFocusProducts));
    }

    #[test]
    fn quiet_focus_buyer_lands_in_snapshot() {
        let engine = FocusEngine::new(EngineConfig::default(), Directories::default());
        let ledger = vec![line("C1", "F1", "1 234,50", "2024-05-06")];

        let evaluation = engine.evaluate(&ledger, &task(), now()).expect("evaluation succeeds");

        assert_eq!(evaluation.matched_clients(), 1);
        assert_eq!(evaluation.snapshot.task_id.as_deref(), Some("task-1"));
        assert_eq!(evaluation.snapshot.match_counts.get(&ParamTag::Param2), Some(&1));
        let record = &evaluation.per_parameter[&ParamTag::Param2][0];
        assert!((record.sum - 1234.5).abs() < 1e-9);
    }

    #[test]
    fn date_range_drops_lines_outside_it() {
        let engine = FocusEngine::new(EngineConfig::default(), Directories::default());
        let ledger =
            vec![line("C1", "F1", "100", "2023-01-10"), line("C2", "F1", "100", "2024-04-01")];
        let mut task = task();
        task.date_range = Some(DateRange {
            from: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            to: None,
        });

        let evaluation = engine.evaluate(&ledger, &task, now()).expect("evaluation succeeds");

        let ids: Vec<_> =
            evaluation.snapshot.entries.iter().map(|entry| entry.client_id.as_str()).collect();
        assert_eq!(ids, vec!["C2"]);
    }

    #[test]
    fn configured_label_reaches_directories() {
        let config =
            EngineConfig { uncategorized_label: "Прочее".to_string(), ..EngineConfig::default() };
        let engine = FocusEngine::new(config, Directories::default());

        assert_eq!(engine.directories().category("unknown"), "Прочее");
    }

    #[test]
    fn profile_of_unknown_client_has_no_activity() {
        let engine = FocusEngine::new(EngineConfig::default(), Directories::default());
        let focus = ["F1".to_string()].into_iter().collect();

        let profile = engine.profile(&[], "ghost", &focus, now());

        assert!(!profile.has_activity());
        assert_eq!(profile.basic.client_id, "ghost");
    }
}
