//! Core domain types and logic.

pub mod error;
pub mod rule;
pub mod rule_parser;
pub mod signal;
pub mod strategy;
pub mod strategy_config;
pub mod trade;
pub mod trading_record;
