//! Param5: RFM segment membership.

use crate::domain::matching::{MatchDetail, MatchRecord, ParamTag};
use crate::domain::task::SegmentFilterConfig;
use crate::index::ClientIndex;
use crate::rfm::segment_client;

use super::{record, EvaluationContext};

pub fn evaluate(
    index: &ClientIndex,
    context: &EvaluationContext<'_>,
    config: &SegmentFilterConfig,
) -> Vec<MatchRecord> {
    let mut matches = Vec::new();

    for client in index.clients() {
        let rfm = segment_client(&client.transactions, context.now);
        if !config.segments.contains(&rfm.segment) {
            continue;
        }

        matches.push(record(
            client,
            ParamTag::Param5,
            rfm.monetary,
            client.last_date(),
            MatchDetail::Segment { segment: rfm.segment, rfm_score: rfm.score },
        ));
    }

    matches.sort_by(|a, b| {
        segment_priority(a)
            .cmp(&segment_priority(b))
            .then_with(|| b.sum.total_cmp(&a.sum))
            .then_with(|| a.client_id.cmp(&b.client_id))
    });
    matches
}

fn segment_priority(record: &MatchRecord) -> u8 {
    match &record.detail {
        MatchDetail::Segment { segment, .. } => segment.priority(),
        _ => u8::MAX,
    }
}
