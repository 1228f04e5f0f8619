//! Param1: bought a focus product in the previous period, nothing this period.

use crate::domain::matching::{MatchDetail, MatchRecord, ParamTag};
use crate::domain::task::LapsedBuyerConfig;
use crate::index::ClientIndex;
use crate::normalize::period_windows;

use super::{descending_by, record, EvaluationContext};

pub fn evaluate(
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    config: &LapsedBuyerConfig,
) -> Vec<MatchRecord> {
    let (previous, current) = period_windows(context.now, config.period);
    let mut matches = Vec::new();

    for client in index.clients() {
        let mut previous_sum = 0.0;
        let mut previous_count = 0;
        let mut previous_last = None;
        let mut bought_now = false;

        for transaction in client.transactions_in(context.focus) {
            let Some(date) = transaction.date else {
                continue;
            };
            if current.contains(date) {
                bought_now = true;
                break;
            }
            if previous.contains(date) {
                previous_sum += transaction.revenue;
                previous_count += 1;
                previous_last = previous_last.max(Some(date));
            }
        }

        if bought_now || previous_count == 0 {
            continue;
        }

        matches.push(record(
            client,
            ParamTag::Param1,
            previous_sum,
            previous_last,
            MatchDetail::LapsedBuyer { previous_window_transactions: previous_count },
        ));
    }

    matches.sort_by(|a, b| descending_by(a.sum, b.sum, a, b));
    matches
}

#[cfg(test)]
mod tests {
    use super::evaluate;
    use crate::domain::matching::MatchDetail;
    use crate::domain::task::LapsedBuyerConfig;
    use crate::normalize::PeriodGranularity;
    use crate::params::fixtures::{at, focus, index, now, sale_at};
    use crate::params::EvaluationContext;

    fn month_config() -> LapsedBuyerConfig {
        LapsedBuyerConfig { enabled: true, period: PeriodGranularity::Month }
    }

    #[test]
    fn previous_month_buyer_without_current_purchase_matches() {
        let index = index(vec![
            sale_at("C2", "F1", 300.0, at(2024, 5, 3)),
            sale_at("C2", "F2", 200.0, at(2024, 5, 28)),
            sale_at("C2", "OTHER", 999.0, at(2024, 6, 2)),
            sale_at("C2", "F1", 50.0, at(2024, 3, 1)),
        ]);
        let focus = focus();

        let matches = evaluate(&index, &EvaluationContext::new(&focus, now()), &month_config());

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].client_id, "C2");
        assert_eq!(matches[0].sum, 500.0);
        assert_eq!(matches[0].last_date, Some(at(2024, 5, 28)));
        assert_eq!(
            matches[0].detail,
            MatchDetail::LapsedBuyer { previous_window_transactions: 2 }
        );
    }

    #[test]
    fn current_period_purchase_excludes_client() {
        let index = index(vec![
            sale_at("C1", "F1", 300.0, at(2024, 5, 3)),
            sale_at("C1", "F2", 10.0, at(2024, 6, 1)),
        ]);
        let focus = focus();

        let matches = evaluate(&index, &EvaluationContext::new(&focus, now()), &month_config());
        assert!(matches.is_empty());
    }

    #[test]
    fn quarter_granularity_uses_calendar_quarters() {
        let index = index(vec![
            sale_at("C1", "F1", 100.0, at(2024, 1, 20)),
            sale_at("C2", "F1", 100.0, at(2024, 2, 20)),
            sale_at("C2", "F1", 100.0, at(2024, 4, 20)),
        ]);
        let focus = focus();
        let config = LapsedBuyerConfig { enabled: true, period: PeriodGranularity::Quarter };

        let matches = evaluate(&index, &EvaluationContext::new(&focus, now()), &config);

        let ids: Vec<_> = matches.iter().map(|record| record.client_id.as_str()).collect();
        assert_eq!(ids, vec!["C1"]);
    }

    #[test]
    fn non_focus_history_never_matches() {
        let index = index(vec![sale_at("C1", "OTHER", 300.0, at(2024, 5, 3))]);
        let focus = focus();

        let matches = evaluate(&index, &EvaluationContext::new(&focus, now()), &month_config());
        assert!(matches.is_empty());
    }
}
