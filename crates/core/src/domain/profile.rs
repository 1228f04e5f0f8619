use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::rfm::RfmScore;

/// Deep single-client profile, built fresh on every request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub basic: BasicInfo,
    pub sales: SalesAnalysis,
    pub orders: OrderAnalysis,
    pub categories: CategoryAnalysis,
    pub monthly: Vec<MonthlyPoint>,
    pub rfm: RfmScore,
    pub recommendations: Vec<Recommendation>,
}

impl ClientProfile {
    pub fn has_activity(&self) -> bool {
        self.basic.transaction_count > 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub client_id: String,
    pub name: String,
    pub sphere: String,
    pub manager: Option<String>,
    pub link: Option<String>,
    pub first_purchase: Option<NaiveDateTime>,
    pub last_purchase: Option<NaiveDateTime>,
    pub days_since_last_order: Option<i64>,
    pub transaction_count: usize,
    pub total_revenue: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Growing,
    Declining,
    Stable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesAnalysis {
    pub total_revenue: f64,
    pub focus_revenue: f64,
    pub non_focus_revenue: f64,
    /// Focus revenue as a percentage of total; zero when there is no revenue.
    pub focus_share_pct: f64,
    pub top_products: Vec<ProductRevenue>,
    pub trend: TrendDirection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRevenue {
    pub product_code: String,
    pub product_name: String,
    pub revenue: f64,
    pub transactions: usize,
    pub is_focus: bool,
}

/// Transactions grouped by calendar day, each day treated as one order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderAnalysis {
    pub order_count: usize,
    pub average_order_value: f64,
    /// Newest first.
    pub orders: Vec<OrderSummary>,
    pub undated_transactions: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub date: NaiveDate,
    pub revenue: f64,
    pub lines: usize,
    pub products: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    /// Sorted by revenue, largest first.
    pub categories: Vec<CategoryBreakdown>,
    pub cross_sell: Vec<CrossSellCandidate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub revenue: f64,
    pub transactions: usize,
    pub products: BTreeSet<String>,
}

/// A focus product bought by same-sphere peers but never by this client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossSellCandidate {
    pub product_code: String,
    pub product_name: String,
    pub category: String,
    pub peer_buyers: usize,
    pub peer_revenue: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// `YYYY-MM`.
    pub month: String,
    pub revenue: f64,
    pub focus_revenue: f64,
    pub transactions: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Upsell,
    Reactivation,
    UrgentContact,
    FocusUpsell,
    Retention,
    CrossSell,
    Onboarding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: RecommendationPriority,
    pub message: String,
}
