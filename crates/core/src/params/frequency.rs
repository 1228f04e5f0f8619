//! Param3: low focus purchase frequency over the trailing six months.
//!
//! Frequency is matched transactions divided by the number of distinct
//! calendar months that had at least one of them. Param4 divides by a fixed
//! three instead.

use std::collections::BTreeSet;

use crate::domain::matching::{MatchDetail, MatchRecord, ParamTag};
use crate::domain::task::LowFrequencyConfig;
use crate::index::ClientIndex;
use crate::normalize::{month_key, trailing_window};

use super::{ascending_by, record, EvaluationContext};

pub const WINDOW_MONTHS: u32 = 6;

pub fn evaluate(
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    config: &LowFrequencyConfig,
) -> Vec<MatchRecord> {
    let window = trailing_window(context.now, WINDOW_MONTHS);
    let mut matches = Vec::new();

    for client in index.clients() {
        let mut months = BTreeSet::new();
        let mut transactions = 0usize;
        let mut sum = 0.0;
        let mut last_date = None;

        for transaction in client.transactions_in(context.focus) {
            let Some(date) = transaction.date.filter(|date| window.contains(*date)) else {
                continue;
            };
            months.insert(month_key(date));
            transactions += 1;
            sum += transaction.revenue;
            last_date = last_date.max(Some(date));
        }

        // No activity in the window means "not a focus buyer", not frequency zero.
        if months.is_empty() {
            continue;
        }

        let average_frequency = transactions as f64 / months.len() as f64;
        if average_frequency >= config.frequency {
            continue;
        }

        matches.push(record(
            client,
            ParamTag::Param3,
            sum,
            last_date,
            MatchDetail::LowFrequency {
                average_frequency,
                transactions,
                active_months: months.len(),
            },
        ));
    }

    matches.sort_by(|a, b| ascending_by(average(a), average(b), a, b));
    matches
}

fn average(record: &MatchRecord) -> f64 {
    match record.detail {
        MatchDetail::LowFrequency { average_frequency, .. } => average_frequency,
        _ => 0.0,
    }
}
