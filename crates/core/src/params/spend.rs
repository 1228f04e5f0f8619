//! Param4: low average monthly focus spend over the trailing three months.

use crate::domain::matching::{MatchDetail, MatchRecord, ParamTag};
use crate::domain::task::LowSpendConfig;
use crate::index::ClientIndex;
use crate::normalize::trailing_window;

use super::{ascending_by, record, EvaluationContext};

pub const WINDOW_MONTHS: u32 = 3;

pub fn evaluate(
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    config: &LowSpendConfig,
) -> Vec<MatchRecord> {
    let window = trailing_window(context.now, WINDOW_MONTHS);
    let mut matches = Vec::new();

    for client in index.clients() {
        let mut sum = 0.0;
        let mut count = 0usize;
        let mut last_date = None;

        for transaction in client.transactions_in(context.focus) {
            let Some(date) = transaction.date.filter(|date| window.contains(*date)) else {
                continue;
            };
            sum += transaction.revenue;
            count += 1;
            last_date = last_date.max(Some(date));
        }

        if count == 0 {
            continue;
        }

        // Fixed denominator regardless of how many months were active.
        let average_monthly = sum / f64::from(WINDOW_MONTHS);
        if average_monthly >= config.amount {
            continue;
        }

        matches.push(record(
            client,
            ParamTag::Param4,
            sum,
            last_date,
            MatchDetail::LowSpend { average_monthly },
        ));
    }

    matches.sort_by(|a, b| ascending_by(a.sum, b.sum, a, b));
    matches
}

#[cfg(test)]
mod tests {
    use super::evaluate;
    use crate::domain::matching::MatchDetail;
    use crate::domain::task::LowSpendConfig;
    use crate::params::fixtures::{focus, index, now, sale};
    use crate::params::EvaluationContext;

    fn config(amount: f64) -> LowSpendConfig {
        LowSpendConfig { enabled: true, amount }
    }

    #[test]
    fn average_divides_by_three_months() {
        let index = index(vec![sale("C1", "F1", 600.0, 5), sale("C1", "OTHER", 9_000.0, 5)]);
        let focus = focus();

        let matches = evaluate(&index, &EvaluationContext::new(&focus, now()), &config(1_000.0));

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].sum, 600.0);
        assert_eq!(matches[0].detail, MatchDetail::LowSpend { average_monthly: 200.0 });
    }

    #[test]
    fn high_spender_is_excluded() {
        let index = index(vec![sale("C1", "F1", 3_000.0, 5)]);
        let focus = focus();

        let matches = evaluate(&index, &EvaluationContext::new(&focus, now()), &config(1_000.0));
        assert!(matches.is_empty());
    }

    #[test]
    fn no_window_activity_is_excluded_even_with_huge_threshold() {
        let index = index(vec![sale("C1", "F1", 10.0, 120), sale("C2", "OTHER", 10.0, 3)]);
        let focus = focus();

        let matches =
            evaluate(&index, &EvaluationContext::new(&focus, now()), &config(f64::MAX));
        assert!(matches.is_empty());
    }
}
