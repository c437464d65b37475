//! Simulated oracle feed
//!
//! Stands in for the point-of-sale stream: every tick one order of
//! the next dish in rotation, with the royalty it would credit.
use super::LoopService;
use crate::auction::ItemId;
use crate::catalog::{Catalog, CatalogItem, Price};
use crate::clock::SharedClock;
use crate::royalty;
use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const FIRST_ORDER_NO: u64 = 29304;
pub const DEFAULT_FEED_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub order_no: u64,
    pub dish_id: ItemId,
    pub price: Price,
    pub royalty: Price,
    pub at: DateTime<Utc>,
}

pub type SharedFeed = Arc<Mutex<VecDeque<FeedEntry>>>;

pub struct OracleFeed {
    dishes: Vec<CatalogItem>,
    clock: SharedClock,
    tick: Duration,
    next_order: u64,
    capacity: usize,
    feed: SharedFeed,
}

impl OracleFeed {
    pub fn new(catalog: &Catalog, clock: SharedClock, tick: Duration) -> Self {
        Self {
            dishes: catalog.dishes.clone(),
            clock,
            tick,
            next_order: FIRST_ORDER_NO,
            capacity: DEFAULT_FEED_LEN,
            feed: Default::default(),
        }
    }

    pub fn with_capacity(self, capacity: usize) -> Self {
        Self { capacity, ..self }
    }

    /// Handle for the screen to read the latest entries from
    pub fn feed(&self) -> SharedFeed {
        self.feed.clone()
    }

    /// Simulate the next order, `None` on an empty menu
    pub fn next_entry(&mut self) -> Option<FeedEntry> {
        if self.dishes.is_empty() {
            return None;
        }
        let idx = (self.next_order - FIRST_ORDER_NO) % self.dishes.len() as u64;
        let dish = &self.dishes[idx as usize];

        let entry = FeedEntry {
            order_no: self.next_order,
            dish_id: dish.id.clone(),
            price: dish.price,
            royalty: royalty::order_royalty(dish),
            at: self.clock.now(),
        };
        self.next_order += 1;

        let mut feed = self.feed.lock();
        feed.push_back(entry.clone());
        while feed.len() > self.capacity {
            feed.pop_front();
        }
        Some(entry)
    }
}

impl LoopService for OracleFeed {
    fn name(&self) -> &'static str {
        "oracle-feed"
    }

    fn run_iteration(&mut self) -> Result<()> {
        std::thread::sleep(self.tick);

        if let Some(entry) = self.next_entry() {
            info!(
                order = entry.order_no,
                dish = %entry.dish_id,
                price = entry.price,
                royalty = entry.royalty,
                "oracle order"
            );
        }
        Ok(())
    }
}
