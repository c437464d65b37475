use super::t0;
use crate::{
    auction::{AuctionPhase, BidError},
    catalog::{AuctionSeed, Catalog, MembershipTier},
    i18n::Localized,
    ledger::*,
};
use anyhow::Result;
use chrono::Duration;
use std::collections::{BTreeMap, BTreeSet};

fn ids(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn prices(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn table_tier() -> MembershipTier {
    MembershipTier {
        id: "table".to_owned(),
        price: 250.0,
        benefit: Localized::same("bidding"),
    }
}

#[test]
fn empty_name_is_rejected() {
    assert_eq!(
        mint_custom_item("C001".to_owned(), "", &ids(&[]), 6.0, &prices(&[])),
        Err(MintError::EmptyName)
    );
    assert_eq!(
        mint_custom_item("C001".to_owned(), " \t ", &ids(&[]), 6.0, &prices(&[])),
        Err(MintError::EmptyName)
    );
}

#[test]
fn unit_price_adds_known_add_ons() -> Result<()> {
    let item = mint_custom_item(
        "C001".to_owned(),
        "Spicy Baron",
        &ids(&["truffle", "gold"]),
        6.0,
        &prices(&[("truffle", 5.0), ("gold", 10.0)]),
    )?;
    assert_eq!(item.unit_price, 21.0);
    assert_eq!(item.total_sold, 0);
    assert_eq!(item.total_earned, 0.0);

    let item = mint_custom_item(
        "C002".to_owned(),
        "  Plain  ",
        &ids(&["truffle", "unicorn"]),
        6.0,
        &prices(&[("truffle", 5.0)]),
    )?;
    assert_eq!(item.name, "Plain");
    assert_eq!(item.unit_price, 11.0);
    assert_eq!(item.add_ons, ids(&["truffle"]));

    Ok(())
}

#[test]
fn minted_item_lands_in_ledger() -> Result<()> {
    let catalog = Catalog::builtin();
    let mut ledger = Ledger::open(&catalog, t0())?;

    let minted = ledger.mint_custom_item(
        "Spicy Baron",
        &ids(&["truffle", "gold"]),
        catalog.rules.custom_base_price,
        &catalog.add_on_prices(),
    )?;

    assert_eq!(ledger.custom_items(), &[minted.clone()]);
    assert_eq!(ledger.custom_items()[0].unit_price, 21.0);
    assert_eq!(minted.id, "C001");

    // failed mints neither append nor burn an id
    assert!(ledger
        .mint_custom_item("", &ids(&[]), 6.0, &BTreeMap::new())
        .is_err());
    assert_eq!(ledger.custom_items().len(), 1);
    let next = ledger.mint_custom_item("Second", &ids(&[]), 6.0, &BTreeMap::new())?;
    assert_eq!(next.id, "C002");

    Ok(())
}

#[test]
fn seeded_mint_keeps_counters() -> Result<()> {
    let mut ledger = Ledger::open(&Catalog::builtin(), t0())?;
    let item = ledger.mint_custom_item_seeded(
        "Demo",
        &ids(&[]),
        6.0,
        &BTreeMap::new(),
        SalesSeed {
            sold: 42,
            earned: 25.2,
        },
    )?;
    assert_eq!(item.total_sold, 42);
    assert_eq!(item.total_earned, 25.2);
    Ok(())
}

#[test]
fn custom_sales_accrue_royalty() -> Result<()> {
    let mut ledger = Ledger::open(&Catalog::builtin(), t0())?;
    let item = ledger.mint_custom_item("Demo", &ids(&[]), 10.0, &BTreeMap::new())?;

    ledger.record_custom_sales(&item.id, 5)?;
    let item = ledger.record_custom_sales(&item.id, 5)?;
    assert_eq!(item.total_sold, 10);
    assert!((item.total_earned - 10.0).abs() < 1e-9);

    assert_eq!(
        ledger.record_custom_sales("C999", 1),
        Err(LedgerError::UnknownItem("C999".to_owned()))
    );
    Ok(())
}

#[test]
fn referral_needs_threshold_credits() -> Result<()> {
    let tier = table_tier();

    let mut referrals = ReferralLedger { count: 7 };
    assert_eq!(
        redeem_referral(&mut referrals, 10, &tier),
        Err(ReferralError::InsufficientCredits { have: 7, need: 10 })
    );
    assert_eq!(referrals.count, 7);

    let mut referrals = ReferralLedger { count: 10 };
    let owned = redeem_referral(&mut referrals, 10, &tier)?;
    assert_eq!(referrals.count, 0);
    assert_eq!(owned.tier_id, "table");
    assert_eq!(owned.acquired, Acquisition::ReferralReward);

    let mut referrals = ReferralLedger { count: 23 };
    redeem_referral(&mut referrals, 10, &tier)?;
    assert_eq!(referrals.count, 13);

    Ok(())
}

#[test]
fn redeemed_membership_unlocks_bidding() -> Result<()> {
    let now = t0();
    let mut ledger = Ledger::open(&Catalog::builtin(), now)?;

    assert_eq!(
        ledger.place_bid("A001", 16_000, now),
        Err(LedgerError::Bid(BidError::MembershipRequired))
    );

    ledger.add_referral_credits(7);
    assert!(ledger.redeem_referral().is_err());
    assert!(!ledger.has_membership());

    ledger.add_referral_credits(3);
    ledger.redeem_referral()?;
    assert_eq!(ledger.referrals().count, 0);
    assert_eq!(ledger.memberships().len(), 1);

    let auction = ledger.place_bid("A001", 16_000, now)?;
    assert_eq!(auction.current_bid, 16_000);
    assert_eq!(ledger.auction("A001"), Some(&auction));
    Ok(())
}

#[test]
fn purchase_always_appends() {
    let mut ledger = Ledger::open(&Catalog::builtin(), t0()).unwrap();
    let tier = table_tier();
    ledger.purchase_membership(&tier);
    let owned = ledger.purchase_membership(&tier);
    assert_eq!(owned.acquired, Acquisition::Purchased);
    assert_eq!(ledger.memberships().len(), 2);
}

#[test]
fn store_bids_are_all_or_nothing() -> Result<()> {
    let now = t0();
    let mut ledger = Ledger::open(&Catalog::builtin(), now)?;
    ledger.purchase_membership(&table_tier());
    let before = ledger.auction("A001").cloned();

    assert_eq!(
        ledger.place_bid("A001", 15_549, now),
        Err(LedgerError::Bid(BidError::BidTooLow {
            minimum: Some(15_550)
        }))
    );
    assert_eq!(ledger.auction("A001").cloned(), before);

    assert_eq!(
        ledger.place_bid("nope", 1, now),
        Err(LedgerError::UnknownAuction("nope".to_owned()))
    );

    let accepted = ledger.place_bid("A001", 15_550, now)?;
    assert_eq!(accepted.bid_count, 13);
    Ok(())
}

#[test]
fn bids_only_while_live() -> Result<()> {
    let now = t0();
    let mut catalog = Catalog::builtin();
    catalog.auctions.push(AuctionSeed {
        id: "A004".to_owned(),
        dish_id: "001".to_owned(),
        opening_bid: 100,
        bid_count: 0,
        starts_in_secs: 600,
        ends_in_secs: 3600,
    });
    let mut ledger = Ledger::open(&catalog, now)?;
    ledger.purchase_membership(&table_tier());

    assert_eq!(
        ledger.place_bid("A004", 150, now),
        Err(LedgerError::NotLive {
            id: "A004".to_owned(),
            phase: AuctionPhase::Scheduled
        })
    );
    ledger.place_bid("A004", 150, now + Duration::minutes(10))?;

    let ended = now + Duration::hours(1);
    assert_eq!(
        ledger.place_bid("A004", 500, ended),
        Err(LedgerError::NotLive {
            id: "A004".to_owned(),
            phase: AuctionPhase::Ended
        })
    );
    assert_eq!(ledger.auction("A004").map(|a| a.current_bid), Some(150));
    Ok(())
}

#[test]
fn shared_ledger_serializes_mutations() -> Result<()> {
    let now = t0();
    let ledger = Ledger::open(&Catalog::builtin(), now)?.into_shared();
    ledger.lock().purchase_membership(&table_tier());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ledger = ledger.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    let mut ledger = ledger.lock();
                    let next = ledger.auction("A003").unwrap().minimum_next_bid().unwrap();
                    ledger.place_bid("A003", next, now).unwrap();
                    let name = format!("t{i}");
                    ledger
                        .mint_custom_item(&name, &BTreeSet::new(), 6.0, &BTreeMap::new())
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let ledger = ledger.lock();
    let a = ledger.auction("A003").unwrap();
    assert_eq!(a.bid_count, 3 + 100);
    assert_eq!(a.current_bid, 6_200 + 100 * 50);
    assert_eq!(ledger.custom_items().len(), 100);
    let unique: BTreeSet<_> = ledger.custom_items().iter().map(|i| &i.id).collect();
    assert_eq!(unique.len(), 100);
    Ok(())
}
