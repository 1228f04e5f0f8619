//! Recency / frequency / monetary segmentation.
//!
//! Segment assignment is a fixed rule ladder; the 3..=15 score is computed
//! independently from bucketed sub-scores and never feeds back into the
//! segment.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::transaction::Transaction;
use crate::normalize::days_between;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Vip,
    Regular,
    Occasional,
    New,
    Inactive,
}

impl Segment {
    /// Sort priority used when listing segment matches (lower first).
    pub fn priority(&self) -> u8 {
        match self {
            Self::Vip => 0,
            Self::Regular => 1,
            Self::Occasional => 2,
            Self::New => 3,
            Self::Inactive => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vip => "vip",
            Self::Regular => "regular",
            Self::Occasional => "occasional",
            Self::New => "new",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RfmScore {
    /// Days since the most recent dated transaction; `None` when undated.
    pub recency_days: Option<i64>,
    pub frequency: usize,
    pub monetary: f64,
    pub recency_score: u8,
    pub frequency_score: u8,
    pub monetary_score: u8,
    /// Sum of the three sub-scores, 3..=15.
    pub score: u8,
    pub segment: Segment,
}

/// Scores a client's full transaction history against `now`.
pub fn segment_client(transactions: &[Transaction], now: NaiveDateTime) -> RfmScore {
    let last_date = transactions.iter().filter_map(|transaction| transaction.date).max();
    let recency_days = last_date.map(|date| days_between(date, now));
    let frequency = transactions.len();
    let monetary = transactions.iter().map(|transaction| transaction.revenue).sum::<f64>();

    let recency_score = recency_bucket(recency_days);
    let frequency_score = frequency_bucket(frequency);
    let monetary_score = monetary_bucket(monetary);

    RfmScore {
        recency_days,
        frequency,
        monetary,
        recency_score,
        frequency_score,
        monetary_score,
        score: recency_score + frequency_score + monetary_score,
        segment: classify(recency_days, frequency, monetary),
    }
}

/// First matching rule wins; every input resolves to exactly one segment.
pub fn classify(recency_days: Option<i64>, frequency: usize, monetary: f64) -> Segment {
    let within = |limit: i64| recency_days.is_some_and(|days| days <= limit);

    if within(30) && frequency >= 5 && monetary >= 10_000.0 {
        Segment::Vip
    } else if within(90) && frequency >= 3 && monetary >= 5_000.0 {
        Segment::Regular
    } else if within(180) && frequency >= 1 && monetary >= 1_000.0 {
        Segment::Occasional
    } else if recency_days.is_some_and(|days| days > 180) {
        Segment::Inactive
    } else {
        Segment::New
    }
}

fn recency_bucket(recency_days: Option<i64>) -> u8 {
    match recency_days {
        Some(days) if days <= 30 => 5,
        Some(days) if days <= 60 => 4,
        Some(days) if days <= 90 => 3,
        Some(days) if days <= 180 => 2,
        _ => 1,
    }
}

fn frequency_bucket(frequency: usize) -> u8 {
    match frequency {
        count if count >= 20 => 5,
        count if count >= 10 => 4,
        count if count >= 5 => 3,
        count if count >= 2 => 2,
        _ => 1,
    }
}

fn monetary_bucket(monetary: f64) -> u8 {
    if monetary >= 50_000.0 {
        5
    } else if monetary >= 20_000.0 {
        4
    } else if monetary >= 10_000.0 {
        3
    } else if monetary >= 5_000.0 {
        2
    } else {
        1
    }
}
