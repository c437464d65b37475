//! Royalty and yield figures
//!
//! Pure functions of catalog records. Nothing here fails: undefined
//! ratios come back as [`YieldRate::Undefined`] rather than NaN.
use crate::auction::Bidder;
use crate::catalog::{Catalog, CatalogItem, Price};
use crate::ledger::Ledger;
use serde::Serialize;
use std::fmt;

const MONTHS_PER_YEAR: f64 = 12.0;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// The six-month revenue chart shown next to each dish
pub const DEFAULT_SEASONAL_FACTORS: [f64; 6] = [0.9, 0.85, 1.0, 1.1, 1.2, 1.3];

pub fn monthly_royalty(item: &CatalogItem) -> Price {
    item.price * item.volume * item.royalty_rate
}

pub fn annual_royalty(item: &CatalogItem) -> Price {
    monthly_royalty(item) * MONTHS_PER_YEAR
}

/// What the holder earns from a single order of `item`
pub fn order_royalty(item: &CatalogItem) -> Price {
    item.price * item.royalty_rate
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum YieldRate {
    Percent(f64),
    /// Both auction estimates are zero, so there is no cost to divide by
    Undefined,
}

impl YieldRate {
    pub fn value(self) -> Option<f64> {
        match self {
            YieldRate::Percent(p) => Some(p),
            YieldRate::Undefined => None,
        }
    }

    pub fn value_or_zero(self) -> f64 {
        self.value().unwrap_or(0.0)
    }
}

impl fmt::Display for YieldRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YieldRate::Percent(p) => write!(f, "{:.1}%", p),
            YieldRate::Undefined => f.write_str("N/A"),
        }
    }
}

/// Annual royalty as a percentage of the midpoint auction estimate.
pub fn implied_yield_rate(item: &CatalogItem) -> YieldRate {
    let midpoint = (item.auction_estimate_min as f64 + item.auction_estimate_max as f64) / 2.0;
    if midpoint == 0.0 {
        return YieldRate::Undefined;
    }

    let rate = annual_royalty(item) / midpoint * 100.0;
    if rate.is_finite() {
        YieldRate::Percent(rate)
    } else {
        YieldRate::Undefined
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionPoint {
    pub label: &'static str,
    pub value: Price,
}

/// Monthly royalty scaled by each factor, labelled from January on.
///
/// A display projection: one point per factor, in order.
pub fn project_monthly_series(item: &CatalogItem, factors: &[f64]) -> Vec<ProjectionPoint> {
    let monthly = monthly_royalty(item);
    factors
        .iter()
        .zip(MONTH_LABELS.iter().cycle())
        .map(|(factor, &label)| ProjectionPoint {
            label,
            value: monthly * factor,
        })
        .collect()
}

/// Running totals for the investor dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    /// Auctions where the user holds the highest bid
    pub leading_auctions: usize,
    pub leading_monthly_royalty: Price,
    pub custom_items: usize,
    pub custom_units_sold: u64,
    pub custom_earned: Price,
    pub memberships: usize,
    pub referral_credits: u32,
}

impl PortfolioSummary {
    pub fn compute(catalog: &Catalog, ledger: &Ledger) -> Self {
        let leading: Vec<_> = ledger
            .auctions()
            .filter(|a| a.leader == Bidder::User)
            .collect();

        Self {
            leading_auctions: leading.len(),
            leading_monthly_royalty: leading
                .iter()
                .filter_map(|a| catalog.dish(&a.dish_id))
                .map(monthly_royalty)
                .sum(),
            custom_items: ledger.custom_items().len(),
            custom_units_sold: ledger.custom_items().iter().map(|i| i.total_sold).sum(),
            custom_earned: ledger.custom_items().iter().map(|i| i.total_earned).sum(),
            memberships: ledger.memberships().len(),
            referral_credits: ledger.referrals().count,
        }
    }
}
