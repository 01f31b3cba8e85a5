//! Strategy definitions loaded from configuration.
//!
//! ```ini
//! [strategy]
//! name = Trend follower
//! hint = buy momentum breakouts
//! unstable_period = 20
//! entry = AND(breakout, NOT(overbought))
//! exit = OR(breakdown, AT(250))
//! ```

use crate::domain::error::{StrategyError, unstable_period_from};
use crate::domain::rule_parser::{self, RuleExpr};
use crate::domain::signal::SignalSeries;
use crate::domain::strategy::BaseStrategy;
use crate::ports::config_port::ConfigPort;
use std::sync::Arc;
use tracing::debug;

pub const SECTION: &str = "strategy";

/// A parsed but unbound strategy: rules are expressions, not yet resolved
/// against signal data.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyDefinition {
    pub name: String,
    pub hint: Option<String>,
    pub unstable_period: usize,
    pub entry: RuleExpr,
    pub exit: RuleExpr,
}

impl StrategyDefinition {
    pub fn build(&self, series: &Arc<SignalSeries>) -> Result<BaseStrategy, StrategyError> {
        let entry = self.entry.build(series)?;
        let exit = self.exit.build(series)?;
        let mut strategy = BaseStrategy::new(self.name.as_str(), entry, exit)
            .with_unstable_period(self.unstable_period);
        if let Some(hint) = &self.hint {
            strategy = strategy.with_hint(hint.as_str());
        }
        Ok(strategy)
    }

    /// Signal names referenced by either rule.
    pub fn signals(&self) -> Vec<String> {
        let mut names = self.entry.signals();
        names.extend(self.exit.signals());
        names.sort();
        names.dedup();
        names
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), StrategyError> {
    load_definition(config).map(|_| ())
}

pub fn load_definition(config: &dyn ConfigPort) -> Result<StrategyDefinition, StrategyError> {
    if !config.has_section(SECTION) {
        return Err(StrategyError::ConfigMissing {
            section: SECTION.to_string(),
            key: "name".to_string(),
        });
    }

    let name = required(config, "name")?;
    let hint = config
        .get_string(SECTION, "hint")
        .filter(|h| !h.trim().is_empty());
    let unstable_period = load_unstable_period(config)?;
    let entry = load_rule(config, "entry")?;
    let exit = load_rule(config, "exit")?;

    debug!(name = %name, unstable_period, "loaded strategy definition");
    Ok(StrategyDefinition {
        name,
        hint,
        unstable_period,
        entry,
        exit,
    })
}

pub fn build_strategy(
    config: &dyn ConfigPort,
    series: &Arc<SignalSeries>,
) -> Result<BaseStrategy, StrategyError> {
    load_definition(config)?.build(series)
}

fn required(config: &dyn ConfigPort, key: &str) -> Result<String, StrategyError> {
    config
        .get_string(SECTION, key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StrategyError::ConfigMissing {
            section: SECTION.to_string(),
            key: key.to_string(),
        })
}

fn load_unstable_period(config: &dyn ConfigPort) -> Result<usize, StrategyError> {
    let invalid = |reason: String| StrategyError::ConfigInvalid {
        section: SECTION.to_string(),
        key: "unstable_period".to_string(),
        reason,
    };
    match config.get_int(SECTION, "unstable_period").map_err(invalid)? {
        None => Ok(0),
        Some(value) => unstable_period_from(value).map_err(|e| invalid(e.to_string())),
    }
}

fn load_rule(config: &dyn ConfigPort, key: &str) -> Result<RuleExpr, StrategyError> {
    let raw = required(config, key)?;
    rule_parser::parse(&raw).map_err(|e| StrategyError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: e.display_with_context(&raw),
    })
}
