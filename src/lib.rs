//! GastroShare: royalty figures and the in-memory ledger of a
//! tokenized-restaurant demo.
//!
//! The catalog ([`catalog`]) is static. All mutable state lives in a
//! [`ledger::Ledger`] owned by the caller, and auction phases are
//! derived on read from a [`clock::Clock`].
pub mod auction;
pub mod catalog;
pub mod clock;
pub mod i18n;
pub mod ledger;
pub mod royalty;
pub mod service;
