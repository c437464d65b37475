use super::t0;
use crate::{
    auction::AuctionPhase,
    catalog::{AuctionSeed, Catalog},
    clock::{ManualClock, SharedClock},
    ledger::Ledger,
    service::*,
};
use anyhow::{bail, Result};
use chrono::Duration;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[test]
fn countdown_tracks_phases() -> Result<()> {
    let now = t0();
    let mut catalog = Catalog::builtin();
    catalog.auctions.push(AuctionSeed {
        id: "A004".to_owned(),
        dish_id: "002".to_owned(),
        opening_bid: 100,
        bid_count: 0,
        starts_in_secs: 60,
        ends_in_secs: 120,
    });
    let clock = Arc::new(ManualClock::new(now));
    let ledger = Ledger::open(&catalog, now)?.into_shared();
    let mut ticker = CountdownTicker::new(
        ledger,
        clock.clone(),
        std::time::Duration::ZERO,
    );

    let phase_of = |rows: &[CountdownRow], id: &str| {
        rows.iter().find(|r| r.auction_id == id).map(|r| r.phase)
    };

    let rows = ticker.refresh();
    assert_eq!(rows.len(), 4);
    assert_eq!(phase_of(&rows, "A004"), Some(AuctionPhase::Scheduled));
    assert_eq!(phase_of(&rows, "A001"), Some(AuctionPhase::Live));

    clock.advance(Duration::seconds(60));
    assert_eq!(phase_of(&ticker.refresh(), "A004"), Some(AuctionPhase::Live));

    clock.advance(Duration::hours(2));
    let rows = ticker.refresh();
    assert_eq!(phase_of(&rows, "A004"), Some(AuctionPhase::Ended));
    assert_eq!(phase_of(&rows, "A001"), Some(AuctionPhase::Ended));
    assert_eq!(phase_of(&rows, "A002"), Some(AuctionPhase::Live));

    Ok(())
}

#[test]
fn countdown_format() {
    assert_eq!(format_countdown(Some(Duration::seconds(7199))), "01:59:59");
    assert_eq!(format_countdown(Some(Duration::hours(26))), "26:00:00");
    assert_eq!(format_countdown(None), "00:00:00");
}

#[test]
fn oracle_feed_rotates_and_keeps_latest() {
    let catalog = Catalog::builtin();
    let clock: SharedClock = Arc::new(ManualClock::new(t0()));
    let mut feed = OracleFeed::new(&catalog, clock, std::time::Duration::ZERO);
    let shared = feed.feed();

    let first = feed.next_entry().unwrap();
    assert_eq!(first.order_no, FIRST_ORDER_NO);
    assert_eq!(first.dish_id, "001");
    assert!((first.royalty - 1.2).abs() < 1e-9);

    for _ in 0..4 {
        feed.next_entry();
    }
    let orders: Vec<_> = shared.lock().iter().map(|e| e.order_no).collect();
    assert_eq!(orders, [29306, 29307, 29308]);
    let dishes: Vec<_> = shared.lock().iter().map(|e| e.dish_id.clone()).collect();
    assert_eq!(dishes, ["003", "001", "002"]);
}

#[test]
fn oracle_feed_on_empty_menu() {
    let mut catalog = Catalog::builtin();
    catalog.dishes.clear();
    let clock: SharedClock = Arc::new(ManualClock::new(t0()));
    let mut feed = OracleFeed::new(&catalog, clock, std::time::Duration::ZERO).with_capacity(1);
    assert_eq!(feed.next_entry(), None);
    assert!(feed.feed().lock().is_empty());
}

struct Counting(Arc<AtomicUsize>, usize);

impl LoopService for Counting {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn run_iteration(&mut self) -> Result<()> {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.1 {
            bail!("enough");
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
        Ok(())
    }
}

#[test]
fn failing_service_stops_everything() {
    let svc_ctr = ServiceControl::new();
    let failing = svc_ctr.spawn_loop(Counting(Arc::new(AtomicUsize::new(0)), 3));
    let other = svc_ctr.spawn_loop(Counting(Arc::new(AtomicUsize::new(0)), usize::MAX));

    assert!(failing.join().is_err());
    assert!(svc_ctr.is_stopped());
    assert!(other.join().is_ok());
}

#[test]
fn stop_all_cancels_loops() {
    let svc_ctr = ServiceControl::new();
    let count = Arc::new(AtomicUsize::new(0));
    let handle = svc_ctr.spawn_loop(Counting(count.clone(), usize::MAX));

    while count.load(Ordering::SeqCst) == 0 {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    svc_ctr.stop_all();
    assert!(handle.join().is_ok());
    assert!(count.load(Ordering::SeqCst) > 0);
}
