//! Param7: buys one of the "X" products but has never bought a focus product.

use crate::domain::matching::{MatchDetail, MatchRecord, ParamTag};
use crate::domain::task::{clean_codes, SubstituteBuyerConfig};
use crate::index::ClientIndex;

use super::{descending_by, record, EvaluationContext};

pub fn evaluate(
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    config: &SubstituteBuyerConfig,
) -> Vec<MatchRecord> {
    let x_products = clean_codes(&config.x_products);
    if x_products.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();

    for client in index.clients() {
        // A product listed in both sets counts as focus.
        if client.bought_any(context.focus) {
            continue;
        }

        let mut sum = 0.0;
        let mut count = 0usize;
        let mut last_date = None;
        for transaction in client.transactions_in(&x_products) {
            sum += transaction.revenue;
            count += 1;
            last_date = last_date.max(transaction.date);
        }

        if count == 0 {
            continue;
        }

        matches.push(record(
            client,
            ParamTag::Param7,
            sum,
            last_date,
            MatchDetail::SubstituteBuyer { substitute_transactions: count },
        ));
    }

    matches.sort_by(|a, b| descending_by(a.sum, b.sum, a, b));
    matches
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::evaluate;
    use crate::domain::task::SubstituteBuyerConfig;
    use crate::params::fixtures::{focus, index, now, sale};
    use crate::params::EvaluationContext;

    fn config(codes: &[&str]) -> SubstituteBuyerConfig {
        SubstituteBuyerConfig {
            enabled: true,
            x_products: codes.iter().map(|code| code.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn x_buyers_without_focus_history_match_sorted_by_x_revenue() {
        let index = index(vec![
            sale("SMALL", "X1", 100.0, 5),
            sale("BIG", "X1", 700.0, 5),
            sale("BIG", "X2", 300.0, 500),
            sale("BIG", "OTHER", 5_000.0, 5),
            sale("LOYAL", "X1", 900.0, 5),
            sale("LOYAL", "F2", 1.0, 900),
            sale("NEITHER", "OTHER", 10.0, 5),
        ]);
        let focus = focus();

        let matches =
            evaluate(&index, &EvaluationContext::new(&focus, now()), &config(&["X1", "X2"]));
        let ids: Vec<_> = matches.iter().map(|record| record.client_id.as_str()).collect();

        assert_eq!(ids, vec!["BIG", "SMALL"]);
        assert_eq!(matches[0].sum, 1_000.0);
    }

    #[test]
    fn product_in_both_sets_counts_as_focus() {
        let index = index(vec![sale("C1", "F1", 100.0, 5)]);
        let focus = focus();

        let matches = evaluate(&index, &EvaluationContext::new(&focus, now()), &config(&["F1"]));
        assert!(matches.is_empty());
    }

    #[test]
    fn empty_x_set_matches_nothing() {
        let index = index(vec![sale("C1", "X1", 100.0, 5)]);
        let focus = focus();

        let matches = evaluate(&index, &EvaluationContext::new(&focus, now()), &config(&[" "]));
        assert!(matches.is_empty());
    }
}
