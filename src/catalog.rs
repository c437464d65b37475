//! Static catalog
//!
//! Dishes, pizza add-ons and membership tiers, plus the rules the
//! ledger applies. Loaded once and read-only afterwards.
use crate::auction::{Amount, ItemId, ItemIdRef, DEFAULT_MIN_BID_INCREMENT};
use crate::i18n::Localized;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

pub type Price = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DishKind {
    Volume,
    #[serde(rename = "Blue Chip")]
    BlueChip,
    Luxury,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: Localized,
    #[serde(default)]
    pub subtitle: Localized,
    #[serde(default)]
    pub description: Localized,
    /// Consumer price of one serving
    pub price: Price,
    /// Servings sold per month
    pub volume: f64,
    /// Share of gross revenue owed to the holder, `0.1` for 10%
    pub royalty_rate: f64,
    pub auction_estimate_min: Amount,
    pub auction_estimate_max: Amount,
    pub kind: DishKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: ItemId,
    pub name: Localized,
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipTier {
    pub id: ItemId,
    pub price: Price,
    pub benefit: Localized,
}

/// An auction to open when the ledger is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSeed {
    pub id: ItemId,
    pub dish_id: ItemId,
    pub opening_bid: Amount,
    #[serde(default)]
    pub bid_count: u32,
    /// Seconds from ledger creation until the auction starts
    #[serde(default)]
    pub starts_in_secs: u64,
    /// Seconds from ledger creation until the auction ends
    pub ends_in_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rules {
    pub min_bid_increment: Amount,
    pub referral_threshold: u32,
    /// Tier handed out when referral credits are redeemed
    pub free_tier: ItemId,
    /// Price of a pizza before add-ons
    pub custom_base_price: Price,
    /// Share of a custom item's sales credited to its creator
    pub custom_royalty_rate: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            min_bid_increment: DEFAULT_MIN_BID_INCREMENT,
            referral_threshold: 10,
            free_tier: "table".to_owned(),
            custom_base_price: 6.0,
            custom_royalty_rate: 0.1,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("dish {0}: royalty rate {1} outside [0, 1]")]
    RoyaltyOutOfRange(ItemId, f64),
    #[error("{0}: price must be a non-negative number, got {1}")]
    InvalidPrice(ItemId, Price),
    #[error("dish {0}: volume must be a non-negative number, got {1}")]
    InvalidVolume(ItemId, f64),
    #[error("dish {0}: auction estimate min {1} above max {2}")]
    EstimateRange(ItemId, Amount, Amount),
    #[error("duplicate id: {0}")]
    DuplicateId(ItemId),
    #[error("auction {0} refers to unknown dish {1}")]
    UnknownDish(ItemId, ItemId),
    #[error("free tier {0} is not a membership tier")]
    UnknownFreeTier(ItemId),
    #[error("custom royalty rate {0} outside [0, 1]")]
    CustomRoyaltyOutOfRange(f64),
    #[error("referral threshold must be at least 1")]
    ZeroReferralThreshold,
    #[error("minimum bid increment must be at least 1")]
    ZeroBidIncrement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub dishes: Vec<CatalogItem>,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    #[serde(default)]
    pub tiers: Vec<MembershipTier>,
    #[serde(default)]
    pub auctions: Vec<AuctionSeed>,
    #[serde(default)]
    pub rules: Rules,
}

fn valid_money(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn valid_rate(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json).context("malformed catalog")?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("invalid catalog {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        use CatalogError::*;

        let mut seen = BTreeSet::new();
        let ids = self
            .dishes
            .iter()
            .map(|d| &d.id)
            .chain(self.add_ons.iter().map(|a| &a.id))
            .chain(self.tiers.iter().map(|t| &t.id))
            .chain(self.auctions.iter().map(|a| &a.id));
        for id in ids {
            if !seen.insert(id) {
                return Err(DuplicateId(id.clone()));
            }
        }

        for dish in &self.dishes {
            if !valid_rate(dish.royalty_rate) {
                return Err(RoyaltyOutOfRange(dish.id.clone(), dish.royalty_rate));
            }
            if !valid_money(dish.price) {
                return Err(InvalidPrice(dish.id.clone(), dish.price));
            }
            if !valid_money(dish.volume) {
                return Err(InvalidVolume(dish.id.clone(), dish.volume));
            }
            if dish.auction_estimate_min > dish.auction_estimate_max {
                return Err(EstimateRange(
                    dish.id.clone(),
                    dish.auction_estimate_min,
                    dish.auction_estimate_max,
                ));
            }
        }

        let priced = self
            .add_ons
            .iter()
            .map(|a| (&a.id, a.price))
            .chain(self.tiers.iter().map(|t| (&t.id, t.price)));
        for (id, price) in priced {
            if !valid_money(price) {
                return Err(InvalidPrice(id.clone(), price));
            }
        }
        if !valid_money(self.rules.custom_base_price) {
            return Err(InvalidPrice(
                "custom base".to_owned(),
                self.rules.custom_base_price,
            ));
        }
        if !valid_rate(self.rules.custom_royalty_rate) {
            return Err(CustomRoyaltyOutOfRange(self.rules.custom_royalty_rate));
        }
        if self.rules.referral_threshold == 0 {
            return Err(ZeroReferralThreshold);
        }
        if self.rules.min_bid_increment == 0 {
            return Err(ZeroBidIncrement);
        }

        for auction in &self.auctions {
            if self.dish(&auction.dish_id).is_none() {
                return Err(UnknownDish(auction.id.clone(), auction.dish_id.clone()));
            }
        }

        if self.free_tier().is_none() {
            return Err(UnknownFreeTier(self.rules.free_tier.clone()));
        }

        Ok(())
    }

    pub fn dish(&self, id: ItemIdRef) -> Option<&CatalogItem> {
        self.dishes.iter().find(|d| d.id == id)
    }

    pub fn tier(&self, id: ItemIdRef) -> Option<&MembershipTier> {
        self.tiers.iter().find(|t| t.id == id)
    }

    pub fn free_tier(&self) -> Option<&MembershipTier> {
        self.tier(&self.rules.free_tier)
    }

    pub fn add_on_prices(&self) -> BTreeMap<ItemId, Price> {
        self.add_ons
            .iter()
            .map(|a| (a.id.clone(), a.price))
            .collect()
    }

    /// The reference menu
    pub fn builtin() -> Self {
        const HOUR: u64 = 60 * 60;

        let dishes = vec![
            CatalogItem {
                id: "001".to_owned(),
                name: Localized::same("The Golden Spaghetti"),
                subtitle: Localized::same("Spaghetti al Pomodoro"),
                description: Localized::new(
                    "A high-volume staple asset. Low unit price ensures consistent daily turnover.",
                    "Asset ad alto volume. Il prezzo unitario basso garantisce un fatturato giornaliero costante.",
                ),
                price: 12.0,
                volume: 600.0,
                royalty_rate: 0.1,
                auction_estimate_min: 15_000,
                auction_estimate_max: 20_000,
                kind: DishKind::Volume,
            },
            CatalogItem {
                id: "002".to_owned(),
                name: Localized::same("The Sovereign Margherita"),
                subtitle: Localized::same("Pizza Margherita"),
                description: Localized::new(
                    "The \"Blue Chip\" of the menu. Highest safety rating with massive volume.",
                    "La \"Blue Chip\" del menù. Massima sicurezza con volumi enormi.",
                ),
                price: 9.0,
                volume: 1000.0,
                royalty_rate: 0.1,
                auction_estimate_min: 25_000,
                auction_estimate_max: 25_000,
                kind: DishKind::BlueChip,
            },
            CatalogItem {
                id: "003".to_owned(),
                name: Localized::same("The Royal Roastbeef"),
                subtitle: Localized::same("Roastbeef"),
                description: Localized::new(
                    "A speculative luxury asset. Lower volume but high unit margin. Potential for high growth.",
                    "Asset di lusso speculativo. Bassi volumi ma alto margine unitario. Potenziale di crescita elevato.",
                ),
                price: 22.0,
                volume: 150.0,
                royalty_rate: 0.1,
                auction_estimate_min: 6_000,
                auction_estimate_max: 8_000,
                kind: DishKind::Luxury,
            },
        ];

        let add_ons = [
            ("mozzarella", "Buffalo Mozzarella", "Mozzarella di Bufala", 1.5),
            ("basil", "Fresh Basil", "Basilico Fresco", 0.5),
            ("nduja", "Spicy Nduja", "Nduja Piccante", 2.5),
            ("truffle", "Black Truffle", "Tartufo Nero", 5.0),
            ("gold", "Gold Leaf", "Foglia d'Oro", 10.0),
        ]
        .into_iter()
        .map(|(id, en, it, price)| AddOn {
            id: id.to_owned(),
            name: Localized::new(en, it),
            price,
        })
        .collect();

        let tiers = [
            (
                "table",
                250.0,
                "Bidding rights and a monthly tasting",
                "Diritto di offerta e una degustazione mensile",
            ),
            (
                "chef",
                1_000.0,
                "Priority bidding and holder discounts",
                "Offerte prioritarie e sconti per gli holder",
            ),
            (
                "sovereign",
                5_000.0,
                "Governance votes and the chef's table",
                "Voto nella governance e tavolo dello chef",
            ),
        ]
        .into_iter()
        .map(|(id, price, en, it)| MembershipTier {
            id: id.to_owned(),
            price,
            benefit: Localized::new(en, it),
        })
        .collect();

        let auctions = [
            ("A001", "001", 15_500, 12, 2 * HOUR),
            ("A002", "002", 25_000, 8, 5 * HOUR),
            ("A003", "003", 6_200, 3, 26 * HOUR),
        ]
        .into_iter()
        .map(
            |(id, dish_id, opening_bid, bid_count, ends_in_secs)| AuctionSeed {
                id: id.to_owned(),
                dish_id: dish_id.to_owned(),
                opening_bid,
                bid_count,
                starts_in_secs: 0,
                ends_in_secs,
            },
        )
        .collect();

        Self {
            dishes,
            add_ons,
            tiers,
            auctions,
            rules: Rules::default(),
        }
    }
}
