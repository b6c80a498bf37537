pub mod chain;
pub mod config;
pub mod leaderboard;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod session;
pub mod store;
