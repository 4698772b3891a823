//! adledger - advertising marketplace transactional store
//!
//! Balances and recharges, creative and campaign lifecycle, uniform ad
//! serving with impression/click logging, performance summaries and
//! invoice requests, persisted in SQLite.

pub mod config;
pub mod error;
pub mod facade;
pub mod filter;
pub mod interfaces;
pub mod models;
pub mod money;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{ErrorKind, Result, StoreError};
pub use facade::{AdMarket, PaymentOutcome};
