//! JSON file loading for the CLI. These file layouts belong to the harness,
//! the engine itself only sees typed values.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clientlens_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use clientlens_core::directory::Directories;
use clientlens_core::domain::task::TaskDefinition;
use clientlens_core::domain::transaction::RawTransaction;
use clientlens_core::errors::ApplicationError;
use clientlens_core::normalize::parse_date;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A ledger file is either a bare array or `{ "transactions": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LedgerFile {
    Lines(Vec<RawTransaction>),
    Wrapped { transactions: Vec<RawTransaction> },
}

pub fn load_config(overrides: ConfigOverrides) -> Result<AppConfig, ApplicationError> {
    AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() })
        .map_err(|error| ApplicationError::Configuration(error.to_string()))
}

pub fn load_ledger(path: &Path) -> Result<Vec<RawTransaction>, ApplicationError> {
    let ledger = match read_json::<LedgerFile>(path)? {
        LedgerFile::Lines(lines) => lines,
        LedgerFile::Wrapped { transactions } => transactions,
    };
    tracing::debug!(
        event_name = "cli.input.ledger_loaded",
        path = %path.display(),
        lines = ledger.len(),
        "ledger loaded"
    );
    Ok(ledger)
}

pub fn load_task(path: &Path) -> Result<TaskDefinition, ApplicationError> {
    read_json(path)
}

pub fn load_directories(path: Option<&Path>) -> Result<Directories, ApplicationError> {
    match path {
        Some(path) => read_json(path),
        None => Ok(Directories::default()),
    }
}

/// Reference time for a run: the given timestamp or date, otherwise the clock.
pub fn resolve_now(raw: Option<&str>) -> Result<DateTime<Utc>, ApplicationError> {
    let Some(raw) = raw else {
        return Ok(Utc::now());
    };

    if let Ok(date) = raw.trim().parse::<NaiveDate>() {
        // A bare date means the end of that day.
        let end_of_day =
            date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN));
        return Ok(Utc.from_utc_datetime(&end_of_day));
    }

    parse_date(raw)
        .map(|value| Utc.from_utc_datetime(&value))
        .ok_or_else(|| ApplicationError::Input(format!("`{raw}` is not a recognized timestamp")))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ApplicationError::Input(format!("could not read `{}`: {error}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        ApplicationError::Input(format!("could not parse `{}`: {error}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    use super::{load_ledger, resolve_now};

    #[test]
    fn ledger_accepts_bare_and_wrapped_layouts() {
        let dir = TempDir::new().expect("temp dir");
        let bare = dir.path().join("bare.json");
        let wrapped = dir.path().join("wrapped.json");
        fs::write(&bare, r#"[{"client_id":"C1","revenue":10}]"#).expect("write bare");
        fs::write(&wrapped, r#"{"transactions":[{"clientId":"C1","amount":"5"}]}"#)
            .expect("write wrapped");

        assert_eq!(load_ledger(&bare).expect("bare loads").len(), 1);
        let loaded = load_ledger(&wrapped).expect("wrapped loads");
        assert_eq!(loaded[0].client_id.as_deref(), Some("C1"));
    }

    #[test]
    fn bare_date_resolves_to_end_of_day() {
        let now = resolve_now(Some("2024-06-15")).expect("date parses");
        assert_eq!((now.day(), now.hour(), now.minute()), (15, 23, 59));
    }

    #[test]
    fn garbage_timestamp_is_an_input_error() {
        assert!(resolve_now(Some("yesterday-ish")).is_err());
    }
}
