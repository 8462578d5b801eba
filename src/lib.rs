//! Proposal, voting and stake-unlock core for the Decent Fund crowdfunding app.
//!
//! Request layers build a [`FundServices`] over a [`FundStore`] backend and
//! call the typed operations on it. Failures come back as [`FundError`].

pub mod config;
pub mod entities;
pub mod error;
pub mod models;
pub mod seed;
pub mod services;
pub mod store;
pub mod wallet;

pub use error::{ErrorKind, FundError, FundResult};
pub use services::FundServices;
pub use store::{DatabaseStore, FundStore, MemoryStore, StoreError};
