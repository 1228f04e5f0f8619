//! Param6: clients that look like the focus buyers of their sphere but have
//! never bought a focus product themselves.
//!
//! Similarity is the mean of two closeness ratios, revenue and transaction
//! count, each `min / max` against the sphere's focus-buyer mean, in percent.

use std::collections::BTreeMap;

use crate::domain::matching::{MatchDetail, MatchRecord, ParamTag};
use crate::domain::task::LookalikeConfig;
use crate::index::{ClientAggregate, ClientIndex};

use super::{descending_by, record, EvaluationContext};

#[derive(Default)]
struct SphereGroup<'a> {
    buyers: Vec<&'a ClientAggregate>,
    others: Vec<&'a ClientAggregate>,
}

pub fn evaluate(
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    config: &LookalikeConfig,
) -> Vec<MatchRecord> {
    let mut spheres: BTreeMap<&str, SphereGroup<'_>> = BTreeMap::new();

    for client in index.clients() {
        let sphere = client.sphere.trim();
        if sphere.is_empty() || client.transactions.is_empty() {
            continue;
        }
        let group = spheres.entry(sphere).or_default();
        if client.bought_any(context.focus) {
            group.buyers.push(client);
        } else {
            group.others.push(client);
        }
    }

    let mut matches = Vec::new();

    for (sphere, group) in spheres {
        if group.buyers.is_empty() {
            tracing::debug!(
                event_name = "params.lookalike.sphere_skipped",
                sphere,
                "sphere has no focus buyers"
            );
            continue;
        }

        let buyer_count = group.buyers.len() as f64;
        let mean_revenue =
            group.buyers.iter().map(|client| client.total_revenue()).sum::<f64>() / buyer_count;
        let mean_transactions =
            group.buyers.iter().map(|client| client.transaction_count() as f64).sum::<f64>()
                / buyer_count;

        for client in group.others {
            let similarity = similarity(
                client.total_revenue(),
                client.transaction_count() as f64,
                mean_revenue,
                mean_transactions,
            );
            if similarity < config.similarity {
                continue;
            }

            matches.push(record(
                client,
                ParamTag::Param6,
                client.total_revenue(),
                client.last_date(),
                MatchDetail::Lookalike {
                    similarity,
                    sphere_mean_revenue: mean_revenue,
                    sphere_mean_transactions: mean_transactions,
                },
            ));
        }
    }

    matches.sort_by(|a, b| descending_by(similarity_of(a), similarity_of(b), a, b));
    matches
}

/// Percentage similarity of a client to its sphere's focus-buyer means.
pub fn similarity(
    revenue: f64,
    transactions: f64,
    mean_revenue: f64,
    mean_transactions: f64,
) -> f64 {
    (closeness(revenue, mean_revenue) + closeness(transactions, mean_transactions)) / 2.0 * 100.0
}

fn closeness(value: f64, reference: f64) -> f64 {
    let high = value.max(reference);
    if high <= 0.0 {
        // Both zero: identical.
        return 1.0;
    }
    value.min(reference) / high
}

fn similarity_of(record: &MatchRecord) -> f64 {
    match record.detail {
        MatchDetail::Lookalike { similarity, .. } => similarity,
        _ => 0.0,
    }
}
