use crate::domain::profile::{
    ClientProfile, Recommendation, RecommendationKind, RecommendationPriority, TrendDirection,
};
use crate::rfm::Segment;

/// Focus share below which an upsell opportunity is flagged, in percent.
pub const FOCUS_SHARE_FLOOR_PCT: f64 = 30.0;

/// Days without an order after which the client needs a call.
pub const URGENT_CONTACT_DAYS: i64 = 90;

/// Rule-based suggestions for the account manager, most urgent first.
pub fn recommend(profile: &ClientProfile) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if !profile.has_activity() {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Onboarding,
            priority: RecommendationPriority::Low,
            message: "No purchase history yet: propose a first order".to_string(),
        });
        return recommendations;
    }

    match profile.rfm.segment {
        Segment::Vip => recommendations.push(Recommendation {
            kind: RecommendationKind::Upsell,
            priority: RecommendationPriority::High,
            message: "VIP client: offer premium lines and volume terms".to_string(),
        }),
        Segment::Inactive => recommendations.push(Recommendation {
            kind: RecommendationKind::Reactivation,
            priority: RecommendationPriority::High,
            message: "Inactive for over 180 days: run a reactivation offer".to_string(),
        }),
        Segment::Regular | Segment::Occasional | Segment::New => {}
    }

    if let Some(days) =
        profile.basic.days_since_last_order.filter(|days| *days > URGENT_CONTACT_DAYS)
    {
        recommendations.push(Recommendation {
            kind: RecommendationKind::UrgentContact,
            priority: RecommendationPriority::High,
            message: format!("No orders for {days} days: contact the client"),
        });
    }

    if profile.sales.total_revenue > 0.0 && profile.sales.focus_share_pct < FOCUS_SHARE_FLOOR_PCT {
        recommendations.push(Recommendation {
            kind: RecommendationKind::FocusUpsell,
            priority: RecommendationPriority::Medium,
            message: format!(
                "Focus products are {:.1}% of revenue: room to grow the focus range",
                profile.sales.focus_share_pct
            ),
        });
    }

    if profile.sales.trend == TrendDirection::Declining {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Retention,
            priority: RecommendationPriority::Medium,
            message: "Monthly revenue is declining: review the account".to_string(),
        });
    }

    if !profile.categories.cross_sell.is_empty() {
        let names: Vec<_> = profile
            .categories
            .cross_sell
            .iter()
            .take(3)
            .map(|candidate| candidate.product_name.as_str())
            .collect();
        recommendations.push(Recommendation {
            kind: RecommendationKind::CrossSell,
            priority: RecommendationPriority::Low,
            message: format!("Peers in the same sphere also buy: {}", names.join(", ")),
        });
    }

    recommendations
}
