//! Param2: no focus purchase for at least the configured number of days.

use crate::domain::matching::{MatchDetail, MatchRecord, ParamTag};
use crate::domain::task::QuietDaysConfig;
use crate::index::ClientIndex;
use crate::normalize::days_between;

use super::{record, EvaluationContext};

pub fn evaluate(
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    config: &QuietDaysConfig,
) -> Vec<MatchRecord> {
    let threshold = i64::from(config.days);
    let mut matches = Vec::new();

    for client in index.clients() {
        let Some(last_focus) =
            client.transactions_in(context.focus).filter_map(|transaction| transaction.date).max()
        else {
            continue;
        };

        let days = days_between(last_focus, context.now);
        if days < threshold {
            continue;
        }

        matches.push(record(
            client,
            ParamTag::Param2,
            client.total_revenue(),
            Some(last_focus),
            MatchDetail::QuietDays { days_since_last_purchase: days },
        ));
    }

    matches.sort_by(|a, b| {
        quiet_days(b).cmp(&quiet_days(a)).then_with(|| a.client_id.cmp(&b.client_id))
    });
    matches
}

fn quiet_days(record: &MatchRecord) -> i64 {
    match record.detail {
        MatchDetail::QuietDays { days_since_last_purchase } => days_since_last_purchase,
        _ => 0,
    }
}
