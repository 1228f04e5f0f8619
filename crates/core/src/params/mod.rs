//! The seven client-matching parameters.
//!
//! Each evaluator is a pure function of the client index, the task's focus
//! set, the reference time and its own configuration. An empty result means
//! "no match" and is never an error.

pub mod frequency;
pub mod lapsed;
pub mod lookalike;
pub mod quiet;
pub mod segment;
pub mod spend;
pub mod substitute;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::domain::matching::{MatchDetail, MatchRecord, ParamTag};
use crate::domain::task::ParameterConfig;
use crate::index::{ClientAggregate, ClientIndex};

/// Read-only inputs shared by every evaluator in one run.
#[derive(Clone, Copy, Debug)]
pub struct EvaluationContext<'a> {
    pub focus: &'a BTreeSet<String>,
    pub now: NaiveDateTime,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(focus: &'a BTreeSet<String>, now: NaiveDateTime) -> Self {
        Self { focus, now }
    }
}

/// Runs the evaluator behind `tag` with its slice of `config`.
pub fn evaluate(
    tag: ParamTag,
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    config: &ParameterConfig,
) -> Vec<MatchRecord> {
    match tag {
        ParamTag::Param1 => lapsed::evaluate(index, context, &config.param1),
        ParamTag::Param2 => quiet::evaluate(index, context, &config.param2),
        ParamTag::Param3 => frequency::evaluate(index, context, &config.param3),
        ParamTag::Param4 => spend::evaluate(index, context, &config.param4),
        ParamTag::Param5 => segment::evaluate(index, context, &config.param5),
        ParamTag::Param6 => lookalike::evaluate(index, context, &config.param6),
        ParamTag::Param7 => substitute::evaluate(index, context, &config.param7),
    }
}

pub(crate) fn record(
    client: &ClientAggregate,
    param: ParamTag,
    sum: f64,
    last_date: Option<NaiveDateTime>,
    detail: MatchDetail,
) -> MatchRecord {
    MatchRecord {
        client_id: client.client_id.clone(),
        client_name: client.name.clone(),
        sphere: client.sphere.clone(),
        manager: client.manager.clone(),
        link: client.link.clone(),
        param,
        sum,
        last_date,
        detail,
    }
}

/// Descending by metric, ties broken by client id for stable output.
pub(crate) fn descending_by(left: f64, right: f64, a: &MatchRecord, b: &MatchRecord) -> Ordering {
    right.total_cmp(&left).then_with(|| a.client_id.cmp(&b.client_id))
}

/// Ascending by metric, ties broken by client id.
pub(crate) fn ascending_by(left: f64, right: f64, a: &MatchRecord, b: &MatchRecord) -> Ordering {
    left.total_cmp(&right).then_with(|| a.client_id.cmp(&b.client_id))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeSet;

    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use crate::directory::Directories;
    use crate::domain::transaction::Transaction;
    use crate::index::ClientIndex;

    pub fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid timestamp")
    }

    pub fn focus() -> BTreeSet<String> {
        BTreeSet::from(["F1".to_string(), "F2".to_string()])
    }

    pub fn sale(client: &str, product: &str, revenue: f64, days_ago: i64) -> Transaction {
        sale_at(client, product, revenue, now() - Duration::days(days_ago))
    }

    pub fn sale_at(client: &str, product: &str, revenue: f64, date: NaiveDateTime) -> Transaction {
        Transaction {
            client_id: client.to_string(),
            client_name: format!("{client} name"),
            sphere: String::new(),
            product_code: product.to_string(),
            product_name: String::new(),
            revenue,
            date: Some(date),
            manager: String::new(),
        }
    }

    pub fn in_sphere(mut transaction: Transaction, sphere: &str) -> Transaction {
        transaction.sphere = sphere.to_string();
        transaction
    }

    pub fn index(transactions: Vec<Transaction>) -> ClientIndex {
        ClientIndex::from_transactions(transactions, &Directories::default())
    }

    pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(10, 0, 0))
            .expect("valid timestamp")
    }
}
