//! Trading rules.
//!
//! A [`Rule`] is a boolean predicate over a bar index and an optional trading
//! record. Strategies only ever call [`Rule::is_satisfied`], so any rule can be
//! combined with any other:
//! - `BooleanRule`: constant outcome
//! - `FixedRule`: satisfied at an explicit set of indices
//! - `SignalRule`: reads a boolean column of a [`SignalSeries`]
//! - `InPositionRule`: satisfied while the record has an opened trade
//! - `CombinedRule`: AND / OR / XOR of two rules
//! - `NotRule`: negation

use crate::domain::signal::SignalSeries;
use crate::domain::trading_record::TradingRecord;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A boolean predicate evaluated at a bar index.
///
/// Implementations must return the same result for the same `(index, record)`
/// and must accept an absent record.
pub trait Rule: fmt::Debug + Send + Sync {
    fn is_satisfied(&self, index: usize, record: Option<&dyn TradingRecord>) -> bool;
}

/// Shared rule handle. Rules are immutable once built and may be bound by any
/// number of strategies.
pub type SharedRule = Arc<dyn Rule>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanRule(pub bool);

impl BooleanRule {
    pub const TRUE: BooleanRule = BooleanRule(true);
    pub const FALSE: BooleanRule = BooleanRule(false);

    pub fn shared(value: bool) -> SharedRule {
        Arc::new(BooleanRule(value))
    }
}

impl Rule for BooleanRule {
    fn is_satisfied(&self, _index: usize, _record: Option<&dyn TradingRecord>) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRule {
    indices: BTreeSet<usize>,
}

impl FixedRule {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indices: indices.into_iter().collect(),
        }
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

impl Rule for FixedRule {
    fn is_satisfied(&self, index: usize, _record: Option<&dyn TradingRecord>) -> bool {
        self.indices.contains(&index)
    }
}

#[derive(Debug, Clone)]
pub struct SignalRule {
    series: Arc<SignalSeries>,
    column: String,
}

impl SignalRule {
    pub fn new(series: Arc<SignalSeries>, column: impl Into<String>) -> Self {
        Self {
            series,
            column: column.into(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Rule for SignalRule {
    fn is_satisfied(&self, index: usize, _record: Option<&dyn TradingRecord>) -> bool {
        self.series.get(&self.column, index).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InPositionRule;

impl Rule for InPositionRule {
    fn is_satisfied(&self, _index: usize, record: Option<&dyn TradingRecord>) -> bool {
        record.is_some_and(|r| r.current_trade().is_opened())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperator {
    And,
    Or,
    Xor,
}

impl BooleanOperator {
    pub fn keyword(self) -> &'static str {
        match self {
            BooleanOperator::And => "and",
            BooleanOperator::Or => "or",
            BooleanOperator::Xor => "xor",
        }
    }
}

/// Binary combination of two rules, evaluated lazily at call time.
///
/// `And` and `Or` short-circuit on the left operand.
#[derive(Debug, Clone)]
pub struct CombinedRule {
    operator: BooleanOperator,
    left: SharedRule,
    right: SharedRule,
}

impl CombinedRule {
    pub fn new(operator: BooleanOperator, left: SharedRule, right: SharedRule) -> Self {
        Self {
            operator,
            left,
            right,
        }
    }

    pub fn and(left: SharedRule, right: SharedRule) -> Self {
        Self::new(BooleanOperator::And, left, right)
    }

    pub fn or(left: SharedRule, right: SharedRule) -> Self {
        Self::new(BooleanOperator::Or, left, right)
    }

    pub fn xor(left: SharedRule, right: SharedRule) -> Self {
        Self::new(BooleanOperator::Xor, left, right)
    }

    pub fn operator(&self) -> BooleanOperator {
        self.operator
    }

    pub fn left(&self) -> &SharedRule {
        &self.left
    }

    pub fn right(&self) -> &SharedRule {
        &self.right
    }
}

impl Rule for CombinedRule {
    fn is_satisfied(&self, index: usize, record: Option<&dyn TradingRecord>) -> bool {
        match self.operator {
            BooleanOperator::And => {
                self.left.is_satisfied(index, record) && self.right.is_satisfied(index, record)
            }
            BooleanOperator::Or => {
                self.left.is_satisfied(index, record) || self.right.is_satisfied(index, record)
            }
            BooleanOperator::Xor => {
                self.left.is_satisfied(index, record) ^ self.right.is_satisfied(index, record)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotRule {
    rule: SharedRule,
}

impl NotRule {
    pub fn new(rule: SharedRule) -> Self {
        Self { rule }
    }

    pub fn inner(&self) -> &SharedRule {
        &self.rule
    }
}

impl Rule for NotRule {
    fn is_satisfied(&self, index: usize, record: Option<&dyn TradingRecord>) -> bool {
        !self.rule.is_satisfied(index, record)
    }
}

/// Combinator methods on shared rules.
pub trait RuleExt {
    fn and(&self, other: SharedRule) -> SharedRule;
    fn or(&self, other: SharedRule) -> SharedRule;
    fn xor(&self, other: SharedRule) -> SharedRule;
    fn negation(&self) -> SharedRule;
}

impl RuleExt for SharedRule {
    fn and(&self, other: SharedRule) -> SharedRule {
        Arc::new(CombinedRule::and(Arc::clone(self), other))
    }

    fn or(&self, other: SharedRule) -> SharedRule {
        Arc::new(CombinedRule::or(Arc::clone(self), other))
    }

    fn xor(&self, other: SharedRule) -> SharedRule {
        Arc::new(CombinedRule::xor(Arc::clone(self), other))
    }

    fn negation(&self) -> SharedRule {
        Arc::new(NotRule::new(Arc::clone(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading_record::BaseTradingRecord;
    use chrono::NaiveDate;

    fn truth_table(op: BooleanOperator) -> Vec<bool> {
        [(false, false), (false, true), (true, false), (true, true)]
            .into_iter()
            .map(|(l, r)| {
                CombinedRule::new(op, BooleanRule::shared(l), BooleanRule::shared(r))
                    .is_satisfied(0, None)
            })
            .collect()
    }

    #[test]
    fn boolean_rule_constant() {
        assert!(BooleanRule::TRUE.is_satisfied(0, None));
        assert!(BooleanRule::TRUE.is_satisfied(1000, None));
        assert!(!BooleanRule::FALSE.is_satisfied(0, None));
    }

    #[test]
    fn fixed_rule_matches_listed_indices() {
        let rule = FixedRule::new([1, 4, 4, 9]);
        let hits: Vec<usize> = (0..10).filter(|&i| rule.is_satisfied(i, None)).collect();
        assert_eq!(hits, vec![1, 4, 9]);
        assert_eq!(rule.indices().collect::<Vec<_>>(), vec![1, 4, 9]);
    }

    #[test]
    fn combined_truth_tables() {
        assert_eq!(truth_table(BooleanOperator::And), vec![false, false, false, true]);
        assert_eq!(truth_table(BooleanOperator::Or), vec![false, true, true, true]);
        assert_eq!(truth_table(BooleanOperator::Xor), vec![false, true, true, false]);
    }

    #[test]
    fn not_rule_negates() {
        let rule = NotRule::new(Arc::new(FixedRule::new([2])));
        assert!(rule.is_satisfied(1, None));
        assert!(!rule.is_satisfied(2, None));
    }

    #[test]
    fn rule_ext_builds_trees() {
        let a: SharedRule = Arc::new(FixedRule::new([1, 2]));
        let b: SharedRule = Arc::new(FixedRule::new([2, 3]));

        let and = a.and(Arc::clone(&b));
        let or = a.or(Arc::clone(&b));
        let xor = a.xor(Arc::clone(&b));
        let not_a = a.negation();

        let at = |r: &SharedRule| (0..5).map(|i| r.is_satisfied(i, None)).collect::<Vec<_>>();
        assert_eq!(at(&and), vec![false, false, true, false, false]);
        assert_eq!(at(&or), vec![false, true, true, true, false]);
        assert_eq!(at(&xor), vec![false, true, false, true, false]);
        assert_eq!(at(&not_a), vec![true, false, false, true, true]);
    }

    #[test]
    fn signal_rule_reads_column() {
        let dates = (1..=3)
            .map(|d| NaiveDate::from_ymd_opt(2024, 2, d).unwrap())
            .collect();
        let mut series = SignalSeries::new(dates);
        series.insert_column("cross", vec![false, true, false]).unwrap();
        let series = Arc::new(series);

        let rule = SignalRule::new(Arc::clone(&series), "cross");
        assert_eq!(rule.column(), "cross");
        assert!(!rule.is_satisfied(0, None));
        assert!(rule.is_satisfied(1, None));
        assert!(!rule.is_satisfied(7, None));

        let missing = SignalRule::new(series, "nope");
        assert!(!missing.is_satisfied(1, None));
    }

    #[test]
    fn in_position_rule_reads_record() {
        let mut record = BaseTradingRecord::default();
        assert!(!InPositionRule.is_satisfied(0, None));
        assert!(!InPositionRule.is_satisfied(0, Some(&record)));
        record.enter(0, 1.0, 1.0);
        assert!(InPositionRule.is_satisfied(1, Some(&record)));
    }

    #[test]
    fn combined_rule_exposes_operands() {
        let rule = CombinedRule::or(BooleanRule::shared(true), BooleanRule::shared(false));
        assert_eq!(rule.operator(), BooleanOperator::Or);
        assert!(rule.left().is_satisfied(0, None));
        assert!(!rule.right().is_satisfied(0, None));
        assert_eq!(BooleanOperator::Or.keyword(), "or");
    }
}
