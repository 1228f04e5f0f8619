use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rfm::Segment;

/// Identifies one of the seven matching parameters.
///
/// Ordering follows the parameter number, which is also the order in which
/// evaluator output is merged into a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamTag {
    Param1,
    Param2,
    Param3,
    Param4,
    Param5,
    Param6,
    Param7,
}

impl ParamTag {
    pub const ALL: [ParamTag; 7] = [
        ParamTag::Param1,
        ParamTag::Param2,
        ParamTag::Param3,
        ParamTag::Param4,
        ParamTag::Param5,
        ParamTag::Param6,
        ParamTag::Param7,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Param1 => "param1",
            Self::Param2 => "param2",
            Self::Param3 => "param3",
            Self::Param4 => "param4",
            Self::Param5 => "param5",
            Self::Param6 => "param6",
            Self::Param7 => "param7",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Param1 => "bought in the previous period, not in the current one",
            Self::Param2 => "no focus purchase for the configured number of days",
            Self::Param3 => "low focus purchase frequency over six months",
            Self::Param4 => "low average monthly focus spend over three months",
            Self::Param5 => "belongs to a selected RFM segment",
            Self::Param6 => "resembles focus buyers in the same sphere but never bought",
            Self::Param7 => "buys the alternative products, never the focus products",
        }
    }
}

impl fmt::Display for ParamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter-specific justification for a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchDetail {
    LapsedBuyer { previous_window_transactions: usize },
    QuietDays { days_since_last_purchase: i64 },
    LowFrequency { average_frequency: f64, transactions: usize, active_months: usize },
    LowSpend { average_monthly: f64 },
    Segment { segment: Segment, rfm_score: u8 },
    Lookalike { similarity: f64, sphere_mean_revenue: f64, sphere_mean_transactions: f64 },
    SubstituteBuyer { substitute_transactions: usize },
}

/// One evaluator's verdict for one client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub client_id: String,
    pub client_name: String,
    pub sphere: String,
    pub manager: Option<String>,
    pub link: Option<String>,
    pub param: ParamTag,
    /// Revenue figure relevant to the parameter (see each evaluator).
    pub sum: f64,
    pub last_date: Option<NaiveDateTime>,
    pub detail: MatchDetail,
}

/// A client in the deduplicated snapshot with every parameter that caught it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientSnapshotEntry {
    pub client_id: String,
    pub client_name: String,
    pub sphere: String,
    pub manager: Option<String>,
    pub link: Option<String>,
    pub params: BTreeSet<ParamTag>,
}

/// Point-in-time result of one task evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub task_id: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ClientSnapshotEntry>,
    /// Raw match counts per enabled parameter, before deduplication.
    pub match_counts: BTreeMap<ParamTag, usize>,
}

/// Bounded slice of a snapshot, ready for a storage collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotChunk {
    pub index: usize,
    pub total: usize,
    pub entries: Vec<ClientSnapshotEntry>,
}
