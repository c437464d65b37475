use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ItemId = String;
pub type ItemIdRef<'s> = &'s str;
pub type Amount = u64;

/// Smallest step by which a new bid must beat the current one
pub const DEFAULT_MIN_BID_INCREMENT: Amount = 50;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum BidError {
    #[error("a membership is required to bid")]
    MembershipRequired,
    /// `minimum` is `None` when no higher bid fits in an [`Amount`]
    #[error("bid is too low")]
    BidTooLow { minimum: Option<Amount> },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bidder {
    User,
    #[default]
    Other,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionPhase {
    Scheduled,
    Live,
    Ended,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: ItemId,
    pub dish_id: ItemId,
    pub current_bid: Amount,
    pub bid_count: u32,
    /// Who holds `current_bid`
    pub leader: Bidder,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: DateTime<Utc>,
    pub min_increment: Amount,
}

impl Auction {
    /// Lowest acceptable bid. A new bid always has to be strictly
    /// higher, so a zero increment counts as one.
    pub fn minimum_next_bid(&self) -> Option<Amount> {
        self.current_bid.checked_add(self.min_increment.max(1))
    }

    fn is_outbidded_by(&self, other: Amount) -> bool {
        self.minimum_next_bid()
            .map(|minimum| minimum <= other)
            .unwrap_or(false)
    }

    /// Phase at `now`. Nothing is stored: an auction is `Ended`
    /// as soon as the clock passes `ends_at`.
    pub fn phase(&self, now: DateTime<Utc>) -> AuctionPhase {
        if now >= self.ends_at {
            AuctionPhase::Ended
        } else if self.starts_at.map(|s| now < s).unwrap_or(false) {
            AuctionPhase::Scheduled
        } else {
            AuctionPhase::Live
        }
    }

    /// Time left until the end, `None` once ended
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (now < self.ends_at).then(|| self.ends_at - now)
    }

    fn ensure_valid_bid(&self, proposed: Amount, has_membership: bool) -> Result<(), BidError> {
        use BidError::*;

        if !has_membership {
            return Err(MembershipRequired);
        }
        if !self.is_outbidded_by(proposed) {
            return Err(BidTooLow {
                minimum: self.minimum_next_bid(),
            });
        }
        Ok(())
    }
}

/// Validate a bid and return the updated auction.
///
/// `auction` itself is never touched; storing the returned copy is up
/// to the caller. The end time is not extended for late bids.
pub fn place_bid(
    auction: &Auction,
    proposed: Amount,
    has_membership: bool,
) -> Result<Auction, BidError> {
    auction.ensure_valid_bid(proposed, has_membership)?;
    Ok(Auction {
        current_bid: proposed,
        bid_count: auction.bid_count.saturating_add(1),
        leader: Bidder::User,
        ..auction.clone()
    })
}
