//! Arbitrage Module
//! Mission: Turn venue tickers into persisted, owner-scoped spread records

pub mod history;
pub mod spread;

pub use history::HistoryStore;
pub use spread::compute_spread;
