//! Strategies: an entry rule and an exit rule with a warm-up window.
//!
//! # Evaluation Semantics
//!
//! - `should_enter` / `should_exit`: `false` while `index < unstable_period`,
//!   otherwise the entry / exit rule's result
//! - `should_operate`: entry path on a `New` trade, exit path on an `Opened`
//!   trade, `false` on a `Closed` one; only the selected rule is evaluated
//! - Combinators (`and`, `or`, `opposite`) build a new [`BaseStrategy`] around
//!   the operands' rule handles. The composite's name and unstable period are
//!   fixed when it is built: changing an operand's hint or unstable period
//!   afterwards does not touch the composite, and the operands' own warm-up
//!   windows are not applied inside it.
//!
//! Evaluation takes `&self` and mutation `&mut self`, so concurrent readers can
//! share a strategy while a writer needs exclusive access (wrap in `RwLock` to
//! mutate a shared strategy).

use crate::domain::error::{StrategyError, unstable_period_from};
use crate::domain::rule::{BooleanOperator, CombinedRule, SharedRule};
use crate::domain::trade::TradeState;
use crate::domain::trading_record::TradingRecord;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

pub trait Strategy: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn hint(&self) -> Option<&str>;

    fn set_hint(&mut self, hint: Option<String>);

    fn entry_rule(&self) -> &SharedRule;

    fn exit_rule(&self) -> &SharedRule;

    /// Number of leading bars on which the strategy never recommends anything.
    fn unstable_period(&self) -> usize;

    fn set_unstable_period(&mut self, unstable_period: usize);

    /// Signed setter for values coming from config or user input.
    /// Negative values fail with `InvalidArgument` and leave the strategy unchanged.
    fn try_set_unstable_period(&mut self, unstable_period: i64) -> Result<(), StrategyError> {
        let period = unstable_period_from(unstable_period)?;
        self.set_unstable_period(period);
        Ok(())
    }

    fn is_unstable_at(&self, index: usize) -> bool {
        index < self.unstable_period()
    }

    fn should_operate(&self, index: usize, record: &dyn TradingRecord) -> bool {
        let state = record.current_trade().state();
        trace!(strategy = self.name(), index, ?state, "dispatching on trade state");
        match state {
            TradeState::New => self.should_enter(index, Some(record)),
            TradeState::Opened => self.should_exit(index, Some(record)),
            TradeState::Closed => false,
        }
    }

    /// Like [`Strategy::should_operate`], treating an absent record as a `New` trade.
    fn should_operate_opt(&self, index: usize, record: Option<&dyn TradingRecord>) -> bool {
        match record {
            Some(record) => self.should_operate(index, record),
            None => self.should_enter(index, None),
        }
    }

    fn should_enter(&self, index: usize, record: Option<&dyn TradingRecord>) -> bool {
        if self.is_unstable_at(index) {
            return false;
        }
        self.entry_rule().is_satisfied(index, record)
    }

    fn should_exit(&self, index: usize, record: Option<&dyn TradingRecord>) -> bool {
        if self.is_unstable_at(index) {
            return false;
        }
        self.exit_rule().is_satisfied(index, record)
    }

    /// AND combination, named `(A) and (B)`, unstable until both operands are stable.
    fn and(&self, other: &dyn Strategy) -> BaseStrategy {
        let name = format!("({}) and ({})", self.name(), other.name());
        let unstable_period = self.unstable_period().max(other.unstable_period());
        self.and_with(name, other, unstable_period)
    }

    /// AND combination with a caller-chosen name and unstable period.
    fn and_with(
        &self,
        name: String,
        other: &dyn Strategy,
        unstable_period: usize,
    ) -> BaseStrategy {
        combine(
            BooleanOperator::And,
            name,
            (self.name(), self.entry_rule(), self.exit_rule()),
            other,
            unstable_period,
        )
    }

    fn try_and_with(
        &self,
        name: String,
        other: &dyn Strategy,
        unstable_period: i64,
    ) -> Result<BaseStrategy, StrategyError> {
        let period = unstable_period_from(unstable_period)?;
        Ok(self.and_with(name, other, period))
    }

    /// OR combination, named `(A) or (B)`, unstable until both operands are stable.
    fn or(&self, other: &dyn Strategy) -> BaseStrategy {
        let name = format!("({}) or ({})", self.name(), other.name());
        let unstable_period = self.unstable_period().max(other.unstable_period());
        self.or_with(name, other, unstable_period)
    }

    fn or_with(&self, name: String, other: &dyn Strategy, unstable_period: usize) -> BaseStrategy {
        combine(
            BooleanOperator::Or,
            name,
            (self.name(), self.entry_rule(), self.exit_rule()),
            other,
            unstable_period,
        )
    }

    fn try_or_with(
        &self,
        name: String,
        other: &dyn Strategy,
        unstable_period: i64,
    ) -> Result<BaseStrategy, StrategyError> {
        let period = unstable_period_from(unstable_period)?;
        Ok(self.or_with(name, other, period))
    }

    /// Entry and exit swapped, same unstable period.
    fn opposite(&self) -> BaseStrategy {
        let name = format!("opposite of ({})", self.name());
        debug!(strategy = self.name(), "building opposite strategy");
        BaseStrategy::new(
            name,
            Arc::clone(self.exit_rule()),
            Arc::clone(self.entry_rule()),
        )
        .with_unstable_period(self.unstable_period())
    }
}

/// Left operand as `(name, entry, exit)`: default trait methods cannot hand
/// out `&self` as `&dyn Strategy`.
fn combine(
    operator: BooleanOperator,
    name: String,
    (left_name, left_entry, left_exit): (&str, &SharedRule, &SharedRule),
    right: &dyn Strategy,
    unstable_period: usize,
) -> BaseStrategy {
    debug!(
        left = left_name,
        right = right.name(),
        operator = operator.keyword(),
        unstable_period,
        "combining strategies"
    );
    let entry = CombinedRule::new(
        operator,
        Arc::clone(left_entry),
        Arc::clone(right.entry_rule()),
    );
    let exit = CombinedRule::new(
        operator,
        Arc::clone(left_exit),
        Arc::clone(right.exit_rule()),
    );
    BaseStrategy::new(name, Arc::new(entry), Arc::new(exit))
        .with_unstable_period(unstable_period)
}

#[derive(Debug, Clone)]
pub struct BaseStrategy {
    name: String,
    hint: Option<String>,
    entry_rule: SharedRule,
    exit_rule: SharedRule,
    unstable_period: usize,
}

impl BaseStrategy {
    pub fn new(name: impl Into<String>, entry_rule: SharedRule, exit_rule: SharedRule) -> Self {
        Self {
            name: name.into(),
            hint: None,
            entry_rule,
            exit_rule,
            unstable_period: 0,
        }
    }

    pub fn with_unstable_period(mut self, unstable_period: usize) -> Self {
        self.unstable_period = unstable_period;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Strategy for BaseStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    fn set_hint(&mut self, hint: Option<String>) {
        self.hint = hint;
    }

    fn entry_rule(&self) -> &SharedRule {
        &self.entry_rule
    }

    fn exit_rule(&self) -> &SharedRule {
        &self.exit_rule
    }

    fn unstable_period(&self) -> usize {
        self.unstable_period
    }

    fn set_unstable_period(&mut self, unstable_period: usize) {
        self.unstable_period = unstable_period;
    }
}
