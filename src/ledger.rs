//! Ledger
//!
//! All mutable state of a session: open auctions, user-created
//! custom items, owned memberships and referral credits. Every
//! operation either applies completely or leaves the ledger as it was.
use crate::auction::{self, Amount, Auction, AuctionPhase, BidError, ItemId, ItemIdRef};
use crate::catalog::{Catalog, CatalogError, MembershipTier, Price, Rules};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub type SharedLedger = Arc<Mutex<Ledger>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    #[error("custom item name must not be empty")]
    EmptyName,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralError {
    #[error("not enough referral credits: have {have}, need {need}")]
    InsufficientCredits { have: u32, need: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unknown auction: {0}")]
    UnknownAuction(ItemId),
    #[error("unknown custom item: {0}")]
    UnknownItem(ItemId),
    #[error("auction {id} is not live ({phase:?})")]
    NotLive { id: ItemId, phase: AuctionPhase },
    #[error(transparent)]
    Bid(#[from] BidError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomItem {
    pub id: ItemId,
    pub name: String,
    pub add_ons: BTreeSet<ItemId>,
    pub unit_price: Price,
    pub total_sold: u64,
    pub total_earned: Price,
}

/// Starting sales counters of a freshly minted item
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SalesSeed {
    pub sold: u64,
    pub earned: Price,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acquisition {
    Purchased,
    ReferralReward,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedMembership {
    pub tier_id: ItemId,
    pub acquired: Acquisition,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralLedger {
    pub count: u32,
}

impl ReferralLedger {
    pub fn credit(&mut self, credits: u32) {
        self.count = self.count.saturating_add(credits);
    }
}

/// Price a recipe and build the item, with zeroed sales.
///
/// Add-on ids missing from `add_on_prices` are ignored and left out
/// of the stored selection.
pub fn mint_custom_item(
    id: ItemId,
    name: &str,
    add_on_ids: &BTreeSet<ItemId>,
    base_price: Price,
    add_on_prices: &BTreeMap<ItemId, Price>,
) -> Result<CustomItem, MintError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MintError::EmptyName);
    }

    let add_ons: BTreeSet<ItemId> = add_on_ids
        .iter()
        .filter(|id| add_on_prices.contains_key(*id))
        .cloned()
        .collect();
    let unit_price = add_ons
        .iter()
        .filter_map(|id| add_on_prices.get(id))
        .fold(base_price, |acc, p| acc + p);

    Ok(CustomItem {
        id,
        name: name.to_owned(),
        add_ons,
        unit_price,
        total_sold: 0,
        total_earned: 0.0,
    })
}

/// Swap `threshold` credits for a free membership of `free_tier`.
pub fn redeem_referral(
    ledger: &mut ReferralLedger,
    threshold: u32,
    free_tier: &MembershipTier,
) -> Result<OwnedMembership, ReferralError> {
    if ledger.count < threshold {
        return Err(ReferralError::InsufficientCredits {
            have: ledger.count,
            need: threshold,
        });
    }
    ledger.count -= threshold;
    Ok(OwnedMembership {
        tier_id: free_tier.id.clone(),
        acquired: Acquisition::ReferralReward,
    })
}

fn offset_from(now: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Clone)]
pub struct Ledger {
    rules: Rules,
    free_tier: MembershipTier,
    auctions: BTreeMap<ItemId, Auction>,
    custom_items: Vec<CustomItem>,
    memberships: Vec<OwnedMembership>,
    referrals: ReferralLedger,
    next_custom_id: u32,
}

impl Ledger {
    /// Start a session, opening the catalog's auctions relative to `now`.
    pub fn open(catalog: &Catalog, now: DateTime<Utc>) -> Result<Self, CatalogError> {
        catalog.validate()?;
        let free_tier = catalog
            .free_tier()
            .cloned()
            .ok_or_else(|| CatalogError::UnknownFreeTier(catalog.rules.free_tier.clone()))?;

        let auctions = catalog
            .auctions
            .iter()
            .map(|seed| {
                let auction = Auction {
                    id: seed.id.clone(),
                    dish_id: seed.dish_id.clone(),
                    current_bid: seed.opening_bid,
                    bid_count: seed.bid_count,
                    leader: Default::default(),
                    starts_at: (seed.starts_in_secs > 0)
                        .then(|| offset_from(now, seed.starts_in_secs)),
                    ends_at: offset_from(now, seed.ends_in_secs),
                    min_increment: catalog.rules.min_bid_increment,
                };
                (seed.id.clone(), auction)
            })
            .collect();

        Ok(Self {
            rules: catalog.rules.clone(),
            free_tier,
            auctions,
            custom_items: Vec::new(),
            memberships: Vec::new(),
            referrals: ReferralLedger::default(),
            next_custom_id: 1,
        })
    }

    pub fn into_shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn auction(&self, id: ItemIdRef) -> Option<&Auction> {
        self.auctions.get(id)
    }

    pub fn auctions(&self) -> impl Iterator<Item = &Auction> {
        self.auctions.values()
    }

    pub fn custom_items(&self) -> &[CustomItem] {
        &self.custom_items
    }

    pub fn memberships(&self) -> &[OwnedMembership] {
        &self.memberships
    }

    pub fn referrals(&self) -> ReferralLedger {
        self.referrals
    }

    pub fn has_membership(&self) -> bool {
        !self.memberships.is_empty()
    }

    pub fn place_bid(
        &mut self,
        auction_id: ItemIdRef,
        proposed: Amount,
        now: DateTime<Utc>,
    ) -> Result<Auction, LedgerError> {
        let has_membership = self.has_membership();
        let current = self
            .auctions
            .get(auction_id)
            .ok_or_else(|| LedgerError::UnknownAuction(auction_id.to_owned()))?;

        let phase = current.phase(now);
        if phase != AuctionPhase::Live {
            debug!(?auction_id, ?phase, "bid on auction that is not live");
            return Err(LedgerError::NotLive {
                id: auction_id.to_owned(),
                phase,
            });
        }

        let updated = auction::place_bid(current, proposed, has_membership).map_err(|e| {
            debug!(?auction_id, ?proposed, error = %e, "bid rejected");
            e
        })?;

        info!(
            ?auction_id,
            price = updated.current_bid,
            bids = updated.bid_count,
            "bid accepted"
        );
        self.auctions.insert(auction_id.to_owned(), updated.clone());
        Ok(updated)
    }

    pub fn mint_custom_item(
        &mut self,
        name: &str,
        add_on_ids: &BTreeSet<ItemId>,
        base_price: Price,
        add_on_prices: &BTreeMap<ItemId, Price>,
    ) -> Result<CustomItem, MintError> {
        self.mint_custom_item_seeded(
            name,
            add_on_ids,
            base_price,
            add_on_prices,
            SalesSeed::default(),
        )
    }

    /// Like [`Self::mint_custom_item`], with explicit starting sales counters.
    pub fn mint_custom_item_seeded(
        &mut self,
        name: &str,
        add_on_ids: &BTreeSet<ItemId>,
        base_price: Price,
        add_on_prices: &BTreeMap<ItemId, Price>,
        seed: SalesSeed,
    ) -> Result<CustomItem, MintError> {
        let id = format!("C{:03}", self.next_custom_id);
        let item = CustomItem {
            total_sold: seed.sold,
            total_earned: seed.earned,
            ..mint_custom_item(id, name, add_on_ids, base_price, add_on_prices)?
        };

        info!(
            id = %item.id,
            name = %item.name,
            unit_price = item.unit_price,
            "custom item minted"
        );
        self.next_custom_id += 1;
        self.custom_items.push(item.clone());
        Ok(item)
    }

    /// Credit `units` sales of a custom item to its creator.
    pub fn record_custom_sales(
        &mut self,
        item_id: ItemIdRef,
        units: u64,
    ) -> Result<CustomItem, LedgerError> {
        let royalty_rate = self.rules.custom_royalty_rate;
        let item = self
            .custom_items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| LedgerError::UnknownItem(item_id.to_owned()))?;

        item.total_sold = item.total_sold.saturating_add(units);
        item.total_earned += units as f64 * item.unit_price * royalty_rate;
        debug!(?item_id, units, total_sold = item.total_sold, "custom sales recorded");
        Ok(item.clone())
    }

    /// No payment is involved, the tier is simply added.
    pub fn purchase_membership(&mut self, tier: &MembershipTier) -> OwnedMembership {
        let owned = OwnedMembership {
            tier_id: tier.id.clone(),
            acquired: Acquisition::Purchased,
        };
        info!(tier = %tier.id, "membership purchased");
        self.memberships.push(owned.clone());
        owned
    }

    pub fn add_referral_credits(&mut self, credits: u32) -> ReferralLedger {
        self.referrals.credit(credits);
        self.referrals
    }

    pub fn redeem_referral(&mut self) -> Result<OwnedMembership, ReferralError> {
        let owned = redeem_referral(
            &mut self.referrals,
            self.rules.referral_threshold,
            &self.free_tier,
        )?;
        info!(tier = %owned.tier_id, left = self.referrals.count, "referral redeemed");
        self.memberships.push(owned.clone());
        Ok(owned)
    }
}
