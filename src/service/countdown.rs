//! Auction countdown
//!
//! Re-derives each auction's phase on every tick and logs the time
//! left. Read-only over the ledger.
use super::LoopService;
use crate::auction::{AuctionPhase, ItemId};
use crate::clock::SharedClock;
use crate::ledger::SharedLedger;
use anyhow::Result;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownRow {
    pub auction_id: ItemId,
    pub phase: AuctionPhase,
    pub remaining: Option<chrono::Duration>,
}

/// `HH:MM:SS`, hours are not wrapped at a day
pub fn format_countdown(remaining: Option<chrono::Duration>) -> String {
    let secs = remaining.map(|d| d.num_seconds().max(0)).unwrap_or(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

pub struct CountdownTicker {
    ledger: SharedLedger,
    clock: SharedClock,
    tick: Duration,
    last_phase: BTreeMap<ItemId, AuctionPhase>,
}

impl CountdownTicker {
    pub fn new(ledger: SharedLedger, clock: SharedClock, tick: Duration) -> Self {
        Self {
            ledger,
            clock,
            tick,
            last_phase: BTreeMap::new(),
        }
    }

    /// Re-derive every auction's phase against the clock
    pub fn refresh(&mut self) -> Vec<CountdownRow> {
        let now = self.clock.now();
        let rows: Vec<_> = self
            .ledger
            .lock()
            .auctions()
            .map(|a| CountdownRow {
                auction_id: a.id.clone(),
                phase: a.phase(now),
                remaining: a.time_remaining(now),
            })
            .collect();

        for row in &rows {
            let previous = self.last_phase.insert(row.auction_id.clone(), row.phase);
            if previous != Some(row.phase) {
                info!(auction = %row.auction_id, ?previous, phase = ?row.phase, "auction phase");
            }
        }
        rows
    }
}

impl LoopService for CountdownTicker {
    fn name(&self) -> &'static str {
        "countdown"
    }

    fn run_iteration(&mut self) -> Result<()> {
        std::thread::sleep(self.tick);

        for row in self.refresh() {
            if row.phase != AuctionPhase::Ended {
                debug!(
                    auction = %row.auction_id,
                    left = %format_countdown(row.remaining),
                    "countdown"
                );
            }
        }
        Ok(())
    }
}
