//! stratlogic: rule-based trading strategy decision engine.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command line front end in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;

pub use domain::error::StrategyError;
pub use domain::rule::{Rule, RuleExt, SharedRule};
pub use domain::strategy::{BaseStrategy, Strategy};
pub use domain::trade::{Trade, TradeState};
pub use domain::trading_record::{BaseTradingRecord, TradingRecord};
