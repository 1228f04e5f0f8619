//! Client profile analysis.
//!
//! Builds a [`ClientProfile`] for one client on demand: revenue split,
//! day-level order grouping, category breakdown with cross-sell candidates,
//! a monthly series and trend, RFM segment, and rule-based recommendations.
//! A client unknown to the index gets a zero-activity profile.

mod recommendations;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

pub use recommendations::{recommend, FOCUS_SHARE_FLOOR_PCT, URGENT_CONTACT_DAYS};

use crate::directory::Directories;
use crate::domain::profile::{
    BasicInfo, CategoryAnalysis, CategoryBreakdown, ClientProfile, CrossSellCandidate,
    MonthlyPoint, OrderAnalysis, OrderSummary, ProductRevenue, SalesAnalysis, TrendDirection,
};
use crate::domain::transaction::Transaction;
use crate::index::{ClientAggregate, ClientIndex};
use crate::normalize::{days_between, month_key, month_label};
use crate::rfm::segment_client;

pub const DEFAULT_TOP_PRODUCTS: usize = 10;
pub const DEFAULT_CROSS_SELL_LIMIT: usize = 10;

/// Relative first-to-last month change that counts as a trend.
pub const TREND_BAND: f64 = 0.10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProfileSettings {
    pub top_products: usize,
    pub cross_sell_limit: usize,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self { top_products: DEFAULT_TOP_PRODUCTS, cross_sell_limit: DEFAULT_CROSS_SELL_LIMIT }
    }
}

#[derive(Clone, Debug)]
pub struct ProfileAnalyzer<'a> {
    directories: &'a Directories,
    settings: ProfileSettings,
}

impl<'a> ProfileAnalyzer<'a> {
    pub fn new(directories: &'a Directories, settings: ProfileSettings) -> Self {
        Self { directories, settings }
    }

    pub fn analyze(
        &self,
        index: &ClientIndex,
        client_id: &str,
        focus: &BTreeSet<String>,
        now: NaiveDateTime,
    ) -> ClientProfile {
        let empty;
        let client = match index.get(client_id) {
            Some(client) => client,
            None => {
                empty = self.unknown_client(client_id);
                &empty
            }
        };

        let basic = basic_info(client, now);
        let monthly = monthly_series(&client.transactions, focus);
        let focus_revenue: f64 =
            client.transactions_in(focus).map(|transaction| transaction.revenue).sum();
        let sales = SalesAnalysis {
            total_revenue: basic.total_revenue,
            focus_revenue,
            non_focus_revenue: basic.total_revenue - focus_revenue,
            focus_share_pct: share_pct(focus_revenue, basic.total_revenue),
            top_products: self.top_products(client, focus),
            trend: classify_trend(&monthly),
        };
        let orders = order_analysis(&client.transactions);
        let categories = CategoryAnalysis {
            categories: self.category_breakdown(client),
            cross_sell: self.cross_sell(index, client, focus),
        };
        let rfm = segment_client(&client.transactions, now);

        let mut profile = ClientProfile {
            basic,
            sales,
            orders,
            categories,
            monthly,
            rfm,
            recommendations: Vec::new(),
        };
        profile.recommendations = recommend(&profile);

        tracing::debug!(
            event_name = "profile.analyze.completed",
            client_id,
            segment = %profile.rfm.segment,
            transactions = profile.basic.transaction_count,
            recommendations = profile.recommendations.len(),
            "client profile built"
        );

        profile
    }

    fn unknown_client(&self, client_id: &str) -> ClientAggregate {
        ClientAggregate {
            client_id: client_id.to_string(),
            name: self.directories.display_name(client_id).to_string(),
            sphere: String::new(),
            manager: None,
            link: self.directories.link(client_id).map(str::to_string),
            transactions: Vec::new(),
        }
    }

    fn product_name(&self, transaction: &Transaction) -> String {
        if transaction.product_name.is_empty() {
            self.directories.display_name(&transaction.product_code).to_string()
        } else {
            transaction.product_name.clone()
        }
    }

    fn top_products(
        &self,
        client: &ClientAggregate,
        focus: &BTreeSet<String>,
    ) -> Vec<ProductRevenue> {
        let mut products: BTreeMap<&str, ProductRevenue> = BTreeMap::new();

        let with_product =
            client.transactions.iter().filter(|transaction| transaction.has_product());
        for transaction in with_product {
            let entry = products.entry(transaction.product_code.as_str()).or_insert_with(|| {
                ProductRevenue {
                    product_code: transaction.product_code.clone(),
                    product_name: self.product_name(transaction),
                    revenue: 0.0,
                    transactions: 0,
                    is_focus: focus.contains(&transaction.product_code),
                }
            });
            entry.revenue += transaction.revenue;
            entry.transactions += 1;
        }

        let mut ranked: Vec<_> = products.into_values().collect();
        ranked.sort_by(|a, b| {
            b.revenue.total_cmp(&a.revenue).then_with(|| a.product_code.cmp(&b.product_code))
        });
        ranked.truncate(self.settings.top_products);
        ranked
    }

    fn category_breakdown(&self, client: &ClientAggregate) -> Vec<CategoryBreakdown> {
        let mut categories: BTreeMap<String, CategoryBreakdown> = BTreeMap::new();

        for transaction in &client.transactions {
            let label = self.directories.category(&transaction.product_code).to_string();
            let entry = categories.entry(label.clone()).or_insert_with(|| CategoryBreakdown {
                category: label,
                revenue: 0.0,
                transactions: 0,
                products: BTreeSet::new(),
            });
            entry.revenue += transaction.revenue;
            entry.transactions += 1;
            if transaction.has_product() {
                entry.products.insert(transaction.product_code.clone());
            }
        }

        let mut ranked: Vec<_> = categories.into_values().collect();
        ranked.sort_by(|a, b| {
            b.revenue.total_cmp(&a.revenue).then_with(|| a.category.cmp(&b.category))
        });
        ranked
    }

    fn cross_sell(
        &self,
        index: &ClientIndex,
        client: &ClientAggregate,
        focus: &BTreeSet<String>,
    ) -> Vec<CrossSellCandidate> {
        let sphere = client.sphere.trim();
        if sphere.is_empty() {
            return Vec::new();
        }

        let owned: BTreeSet<&str> = client
            .transactions
            .iter()
            .map(|transaction| transaction.product_code.as_str())
            .collect();
        let mut candidates: HashMap<&str, CrossSellCandidate> = HashMap::new();

        let peers = index
            .clients()
            .filter(|peer| peer.client_id != client.client_id && peer.sphere.trim() == sphere);
        for peer in peers {
            let mut counted: BTreeSet<&str> = BTreeSet::new();
            for transaction in peer.transactions_in(focus) {
                let code = transaction.product_code.as_str();
                if owned.contains(code) {
                    continue;
                }
                let candidate = candidates.entry(code).or_insert_with(|| CrossSellCandidate {
                    product_code: transaction.product_code.clone(),
                    product_name: self.product_name(transaction),
                    category: self.directories.category(code).to_string(),
                    peer_buyers: 0,
                    peer_revenue: 0.0,
                });
                candidate.peer_revenue += transaction.revenue;
                if counted.insert(code) {
                    candidate.peer_buyers += 1;
                }
            }
        }

        let mut ranked: Vec<_> = candidates.into_values().collect();
        ranked.sort_by(|a, b| {
            b.peer_buyers.cmp(&a.peer_buyers).then_with(|| a.product_code.cmp(&b.product_code))
        });
        ranked.truncate(self.settings.cross_sell_limit);
        ranked
    }
}

fn basic_info(client: &ClientAggregate, now: NaiveDateTime) -> BasicInfo {
    let last_purchase = client.last_date();
    BasicInfo {
        client_id: client.client_id.clone(),
        name: client.name.clone(),
        sphere: client.sphere.clone(),
        manager: client.manager.clone(),
        link: client.link.clone(),
        first_purchase: client.first_date(),
        last_purchase,
        days_since_last_order: last_purchase.map(|date| days_between(date, now)),
        transaction_count: client.transaction_count(),
        total_revenue: client.total_revenue(),
    }
}

fn share_pct(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

fn order_analysis(transactions: &[Transaction]) -> OrderAnalysis {
    let mut days: BTreeMap<NaiveDate, OrderSummary> = BTreeMap::new();
    let mut undated = 0usize;

    for transaction in transactions {
        let Some(date) = transaction.date.map(|value| value.date()) else {
            undated += 1;
            continue;
        };
        let order = days.entry(date).or_insert_with(|| OrderSummary {
            date,
            revenue: 0.0,
            lines: 0,
            products: BTreeSet::new(),
        });
        order.revenue += transaction.revenue;
        order.lines += 1;
        if transaction.has_product() {
            order.products.insert(transaction.product_code.clone());
        }
    }

    let orders: Vec<_> = days.into_values().rev().collect();
    let order_count = orders.len();
    let average_order_value = if order_count == 0 {
        0.0
    } else {
        orders.iter().map(|order| order.revenue).sum::<f64>() / order_count as f64
    };

    OrderAnalysis { order_count, average_order_value, orders, undated_transactions: undated }
}

fn monthly_series(transactions: &[Transaction], focus: &BTreeSet<String>) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<(i32, u32), MonthlyPoint> = BTreeMap::new();

    for transaction in transactions {
        let Some(date) = transaction.date else {
            continue;
        };
        let key = month_key(date);
        let point = months.entry(key).or_insert_with(|| MonthlyPoint {
            month: month_label(key),
            revenue: 0.0,
            focus_revenue: 0.0,
            transactions: 0,
        });
        point.revenue += transaction.revenue;
        point.transactions += 1;
        if focus.contains(&transaction.product_code) {
            point.focus_revenue += transaction.revenue;
        }
    }

    months.into_values().collect()
}

/// Compares the first and last month of the series against a ±10% band.
pub fn classify_trend(monthly: &[MonthlyPoint]) -> TrendDirection {
    let (Some(first), Some(last)) = (monthly.first(), monthly.last()) else {
        return TrendDirection::Stable;
    };
    if monthly.len() < 2 {
        return TrendDirection::Stable;
    }

    if first.revenue <= 0.0 {
        return if last.revenue > 0.0 { TrendDirection::Growing } else { TrendDirection::Stable };
    }

    let change = (last.revenue - first.revenue) / first.revenue;
    if change > TREND_BAND {
        TrendDirection::Growing
    } else if change < -TREND_BAND {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use super::{classify_trend, ProfileAnalyzer, ProfileSettings};
    use crate::directory::Directories;
    use crate::domain::profile::{MonthlyPoint, RecommendationKind, TrendDirection};
    use crate::domain::transaction::Transaction;
    use crate::index::ClientIndex;
    use crate::rfm::Segment;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid timestamp")
    }

    fn sale(client: &str, sphere: &str, product: &str, revenue: f64, days_ago: i64) -> Transaction {
        Transaction {
            client_id: client.to_string(),
            client_name: format!("{client} name"),
            sphere: sphere.to_string(),
            product_code: product.to_string(),
            product_name: String::new(),
            revenue,
            date: Some(now() - Duration::days(days_ago)),
            manager: "Irina".to_string(),
        }
    }

    fn focus() -> BTreeSet<String> {
        BTreeSet::from(["F1".to_string(), "F2".to_string()])
    }

    fn point(month: &str, revenue: f64) -> MonthlyPoint {
        MonthlyPoint { month: month.to_string(), revenue, focus_revenue: 0.0, transactions: 1 }
    }

    #[test]
    fn unknown_client_gets_zero_activity_profile() {
        let directories = Directories::default();
        let analyzer = ProfileAnalyzer::new(&directories, ProfileSettings::default());

        let profile = analyzer.analyze(&ClientIndex::default(), "GHOST", &focus(), now());

        assert!(!profile.has_activity());
        assert_eq!(profile.basic.name, "GHOST");
        assert_eq!(profile.rfm.segment, Segment::New);
        assert_eq!(profile.sales.focus_share_pct, 0.0);
        assert_eq!(profile.sales.trend, TrendDirection::Stable);
        assert!(profile
            .recommendations
            .iter()
            .any(|recommendation| recommendation.kind == RecommendationKind::Onboarding));
    }

    #[test]
    fn revenue_split_orders_and_categories() {
        let mut directories = Directories::default();
        directories.categories.insert("F1".to_string(), "Paint".to_string());
        directories.names.insert("X".to_string(), "Primer".to_string());
        let index = ClientIndex::from_transactions(
            vec![
                sale("C1", "Retail", "F1", 300.0, 3),
                sale("C1", "Retail", "X", 700.0, 3),
                sale("C1", "Retail", "X", 1000.0, 40),
            ],
            &directories,
        );
        let analyzer = ProfileAnalyzer::new(&directories, ProfileSettings::default());

        let profile = analyzer.analyze(&index, "C1", &focus(), now());

        assert_eq!(profile.sales.total_revenue, 2000.0);
        assert_eq!(profile.sales.focus_revenue, 300.0);
        assert_eq!(profile.sales.non_focus_revenue, 1700.0);
        assert!((profile.sales.focus_share_pct - 15.0).abs() < 1e-9);
        assert_eq!(profile.sales.top_products[0].product_code, "X");
        assert_eq!(profile.sales.top_products[0].product_name, "Primer");

        assert_eq!(profile.orders.order_count, 2);
        assert_eq!(profile.orders.orders[0].lines, 2);
        assert_eq!(profile.orders.average_order_value, 1000.0);

        let labels: Vec<_> = profile
            .categories
            .categories
            .iter()
            .map(|category| category.category.as_str())
            .collect();
        assert_eq!(labels, vec!["Uncategorized", "Paint"]);
        assert!(profile
            .recommendations
            .iter()
            .any(|recommendation| recommendation.kind == RecommendationKind::FocusUpsell));
    }

    #[test]
    fn cross_sell_lists_focus_products_peers_buy() {
        let directories = Directories::default();
        let index = ClientIndex::from_transactions(
            vec![
                sale("C1", "Retail", "F1", 100.0, 5),
                sale("P1", "Retail", "F1", 100.0, 5),
                sale("P1", "Retail", "F2", 100.0, 5),
                sale("P1", "Retail", "F2", 50.0, 6),
                sale("P2", "Retail", "F2", 80.0, 5),
                sale("W1", "Wholesale", "F2", 100.0, 5),
            ],
            &directories,
        );
        let analyzer = ProfileAnalyzer::new(&directories, ProfileSettings::default());

        let profile = analyzer.analyze(&index, "C1", &focus(), now());
        let cross_sell = &profile.categories.cross_sell;

        assert_eq!(cross_sell.len(), 1);
        assert_eq!(cross_sell[0].product_code, "F2");
        assert_eq!(cross_sell[0].peer_buyers, 2);
        assert_eq!(cross_sell[0].peer_revenue, 230.0);
    }

    #[test]
    fn top_products_respect_limit() {
        let directories = Directories::default();
        let transactions = (0..15)
            .map(|i| sale("C1", "Retail", &format!("P{i:02}"), 100.0 + i as f64, 1))
            .collect::<Vec<_>>();
        let index = ClientIndex::from_transactions(transactions, &directories);
        let analyzer = ProfileAnalyzer::new(&directories, ProfileSettings::default());

        let profile = analyzer.analyze(&index, "C1", &focus(), now());

        assert_eq!(profile.sales.top_products.len(), 10);
        assert_eq!(profile.sales.top_products[0].product_code, "P14");
    }

    #[test]
    fn trend_uses_first_and_last_month_with_band() {
        assert_eq!(classify_trend(&[]), TrendDirection::Stable);
        assert_eq!(classify_trend(&[point("2024-01", 100.0)]), TrendDirection::Stable);
        let dip_then_recovery =
            [point("2024-01", 100.0), point("2024-02", 5.0), point("2024-03", 111.0)];
        assert_eq!(classify_trend(&dip_then_recovery), TrendDirection::Growing);
        assert_eq!(
            classify_trend(&[point("2024-01", 100.0), point("2024-03", 89.0)]),
            TrendDirection::Declining
        );
        assert_eq!(
            classify_trend(&[point("2024-01", 100.0), point("2024-03", 109.0)]),
            TrendDirection::Stable
        );
        assert_eq!(
            classify_trend(&[point("2024-01", 0.0), point("2024-03", 10.0)]),
            TrendDirection::Growing
        );
    }

    #[test]
    fn monthly_series_is_chronological() {
        let directories = Directories::default();
        let index = ClientIndex::from_transactions(
            vec![sale("C1", "", "F1", 10.0, 1), sale("C1", "", "X", 20.0, 70)],
            &directories,
        );
        let analyzer = ProfileAnalyzer::new(&directories, ProfileSettings::default());

        let profile = analyzer.analyze(&index, "C1", &focus(), now());
        let months: Vec<_> = profile.monthly.iter().map(|point| point.month.as_str()).collect();

        assert_eq!(months, vec!["2024-04", "2024-06"]);
        assert_eq!(profile.monthly[1].focus_revenue, 10.0);
        assert_eq!(profile.sales.trend, TrendDirection::Declining);
    }
}
