//! The subscription price table.
//!
//! Prices are configured in UZS per tier and duration. Paid amounts arrive in tiyin and are
//! matched against the table within a small absolute tolerance, because the upstream price
//! configuration historically passed through floating point.
use pmg_common::Tiyin;

use crate::db_types::SubscriptionTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub id: &'static str,
    pub tier: SubscriptionTier,
    pub months: u32,
    pub price_uzs: i64,
    pub name_ru: &'static str,
    pub name_uz: &'static str,
}

pub const PLANS: [Plan; 6] = [
    Plan { id: "plus_1", tier: SubscriptionTier::Plus, months: 1, price_uzs: 34_999, name_ru: "Plus (1 мес)", name_uz: "Plus (1 oy)" },
    Plan { id: "plus_3", tier: SubscriptionTier::Plus, months: 3, price_uzs: 94_999, name_ru: "Plus (3 мес)", name_uz: "Plus (3 oy)" },
    Plan { id: "pro_1", tier: SubscriptionTier::Pro, months: 1, price_uzs: 49_999, name_ru: "Pro (1 мес)", name_uz: "Pro (1 oy)" },
    Plan { id: "pro_3", tier: SubscriptionTier::Pro, months: 3, price_uzs: 119_999, name_ru: "Pro (3 мес)", name_uz: "Pro (3 oy)" },
    Plan { id: "premium_1", tier: SubscriptionTier::Premium, months: 1, price_uzs: 89_999, name_ru: "Premium (1 мес)", name_uz: "Premium (1 oy)" },
    Plan { id: "premium_3", tier: SubscriptionTier::Premium, months: 3, price_uzs: 229_999, name_ru: "Premium (3 мес)", name_uz: "Premium (3 oy)" },
];

/// Tolerance when matching paid amounts against the table, in UZS.
pub const PRICE_MATCH_TOLERANCE_UZS: f64 = 100.0;

/// Looks up a plan by id.
pub fn plan(id: &str) -> Option<Plan> {
    PLANS.iter().find(|p| p.id == id).copied()
}

/// Deduces the purchased plan from a paid amount.
///
/// The highest-priced plan within tolerance wins, matching the upstream behaviour of scanning
/// the table in descending price order.
pub fn plan_for_amount(amount: Tiyin) -> Option<Plan> {
    let uzs = amount.to_uzs();
    PLANS
        .iter()
        .filter(|p| (uzs - p.price_uzs as f64).abs() < PRICE_MATCH_TOLERANCE_UZS)
        .max_by_key(|p| p.price_uzs)
        .copied()
}

/// The safety-net plan used when no table entry matches a captured amount: the cheapest plan
/// for one duration unit. A captured payment is never left ungranted, at the cost of possibly
/// selecting the wrong tier after price-table drift.
pub fn fallback_plan() -> Plan {
    PLANS[0]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exact_match() {
        let plan = plan_for_amount(Tiyin::from_uzs(49_999)).unwrap();
        assert_eq!(plan.tier, SubscriptionTier::Pro);
        assert_eq!(plan.months, 1);
        let plan = plan_for_amount(Tiyin::from_uzs(229_999)).unwrap();
        assert_eq!(plan.tier, SubscriptionTier::Premium);
        assert_eq!(plan.months, 3);
    }

    #[test]
    fn tolerant_match() {
        // 99 UZS under the Pro monthly price still matches
        let plan = plan_for_amount(Tiyin::from(4_990_000)).unwrap();
        assert_eq!(plan.id, "pro_1");
        // 100 UZS off does not
        assert_eq!(plan_for_amount(Tiyin::from(4_989_900)), None);
    }

    #[test]
    fn unknown_amount() {
        assert_eq!(plan_for_amount(Tiyin::from_uzs(1_000_000)), None);
        assert_eq!(plan_for_amount(Tiyin::from(0)), None);
    }

    #[test]
    fn fallback_is_cheapest() {
        let fb = fallback_plan();
        assert_eq!(fb.tier, SubscriptionTier::Plus);
        assert_eq!(fb.months, 1);
        assert!(PLANS.iter().all(|p| p.price_uzs >= fb.price_uzs));
    }

    #[test]
    fn plan_lookup_by_id() {
        assert_eq!(plan("premium_1").unwrap().price_uzs, 89_999);
        assert!(plan("enterprise_12").is_none());
    }
}
