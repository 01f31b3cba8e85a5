//! Rule expression parser.
//!
//! Recursive descent parser for the rule grammar:
//!
//! ```text
//! rule := TRUE | FALSE | IN_POSITION | AT(int, ...)
//!       | AND(rule, rule, ...) | OR(rule, rule, ...) | XOR(rule, rule)
//!       | NOT(rule) | signal_name
//! ```
//!
//! Parsing yields a [`RuleExpr`] AST; [`RuleExpr::build`] resolves signal names
//! against a [`SignalSeries`] and produces a shared [`Rule`](crate::domain::rule::Rule).

use crate::domain::error::{ParseError, StrategyError};
use crate::domain::rule::{
    BooleanOperator, BooleanRule, CombinedRule, FixedRule, InPositionRule, NotRule, SharedRule,
    SignalRule,
};
use crate::domain::signal::SignalSeries;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum RuleExpr {
    Constant(bool),
    InPosition,
    At(Vec<usize>),
    Signal(String),
    And(Vec<RuleExpr>),
    Or(Vec<RuleExpr>),
    Xor(Box<RuleExpr>, Box<RuleExpr>),
    Not(Box<RuleExpr>),
}

impl RuleExpr {
    /// Signal names referenced by the expression, sorted and deduplicated.
    pub fn signals(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        self.collect_signals(&mut names);
        names.into_iter().collect()
    }

    fn collect_signals(&self, names: &mut BTreeSet<String>) {
        match self {
            RuleExpr::Signal(name) => {
                names.insert(name.clone());
            }
            RuleExpr::And(rules) | RuleExpr::Or(rules) => {
                for r in rules {
                    r.collect_signals(names);
                }
            }
            RuleExpr::Xor(left, right) => {
                left.collect_signals(names);
                right.collect_signals(names);
            }
            RuleExpr::Not(rule) => rule.collect_signals(names),
            RuleExpr::Constant(_) | RuleExpr::InPosition | RuleExpr::At(_) => {}
        }
    }

    /// Build the rule tree. N-ary AND/OR fold left into binary combinations.
    pub fn build(&self, series: &Arc<SignalSeries>) -> Result<SharedRule, StrategyError> {
        let rule: SharedRule = match self {
            RuleExpr::Constant(value) => Arc::new(BooleanRule(*value)),
            RuleExpr::InPosition => Arc::new(InPositionRule),
            RuleExpr::At(indices) => Arc::new(FixedRule::new(indices.iter().copied())),
            RuleExpr::Signal(name) => {
                if !series.has_column(name) {
                    return Err(StrategyError::RuleInvalid {
                        reason: format!("unknown signal '{}'", name),
                    });
                }
                Arc::new(SignalRule::new(Arc::clone(series), name.as_str()))
            }
            RuleExpr::And(rules) => fold(BooleanOperator::And, rules, series)?,
            RuleExpr::Or(rules) => fold(BooleanOperator::Or, rules, series)?,
            RuleExpr::Xor(left, right) => Arc::new(CombinedRule::xor(
                left.build(series)?,
                right.build(series)?,
            )),
            RuleExpr::Not(rule) => Arc::new(NotRule::new(rule.build(series)?)),
        };
        Ok(rule)
    }
}

fn fold(
    operator: BooleanOperator,
    rules: &[RuleExpr],
    series: &Arc<SignalSeries>,
) -> Result<SharedRule, StrategyError> {
    let mut iter = rules.iter();
    let mut acc = match iter.next() {
        Some(first) => first.build(series)?,
        None => {
            return Err(StrategyError::RuleInvalid {
                reason: format!("{} without operands", operator.keyword().to_uppercase()),
            });
        }
    };
    for rule in iter {
        acc = Arc::new(CombinedRule::new(operator, acc, rule.build(series)?));
    }
    Ok(acc)
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for RuleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleExpr::Constant(true) => write!(f, "TRUE"),
            RuleExpr::Constant(false) => write!(f, "FALSE"),
            RuleExpr::InPosition => write!(f, "IN_POSITION"),
            RuleExpr::At(indices) => {
                write!(f, "AT(")?;
                write_list(f, indices)?;
                write!(f, ")")
            }
            RuleExpr::Signal(name) => write!(f, "{}", name),
            RuleExpr::And(rules) => {
                write!(f, "AND(")?;
                write_list(f, rules)?;
                write!(f, ")")
            }
            RuleExpr::Or(rules) => {
                write!(f, "OR(")?;
                write_list(f, rules)?;
                write!(f, ")")
            }
            RuleExpr::Xor(left, right) => write!(f, "XOR({}, {})", left, right),
            RuleExpr::Not(rule) => write!(f, "NOT({})", rule),
        }
    }
}

const KEYWORDS: [&str; 8] = ["TRUE", "FALSE", "IN_POSITION", "AT", "AND", "OR", "XOR", "NOT"];

/// Maximum nesting of composite rules.
pub const MAX_DEPTH: usize = 256;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, ch),
                position: self.pos,
            }),
            None => Err(ParseError {
                message: format!("expected '{}', found end of input", expected),
                position: self.pos,
            }),
        }
    }

    fn peek_word(&self) -> String {
        let mut word = String::new();
        for ch in self.remaining().chars() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
            } else {
                break;
            }
        }
        word
    }

    fn describe_next(&self) -> String {
        let word = self.peek_word();
        if !word.is_empty() {
            return word;
        }
        self.peek()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
        }

        if self.pos == start {
            return Err(ParseError {
                message: format!("expected integer, found '{}'", self.describe_next()),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<usize>().map_err(|_| ParseError {
            message: format!("invalid integer: {}", num_str),
            position: start,
        })
    }

    /// Comma separated items up to and including the closing parenthesis.
    fn parse_list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = vec![item(self)?];
        loop {
            self.skip_whitespace();
            if self.peek() == Some(')') {
                self.advance();
                return Ok(items);
            }
            self.expect_char(',')?;
            items.push(item(self)?);
        }
    }

    fn parse_rule(&mut self) -> Result<RuleExpr, ParseError> {
        self.skip_whitespace();
        if self.depth >= MAX_DEPTH {
            return Err(ParseError {
                message: format!("rule nesting exceeds {} levels", MAX_DEPTH),
                position: self.pos,
            });
        }
        self.depth += 1;
        let rule = self.parse_rule_inner();
        self.depth -= 1;
        rule
    }

    fn parse_rule_inner(&mut self) -> Result<RuleExpr, ParseError> {
        let start = self.pos;
        let word = self.peek_word();

        if word.is_empty() {
            return Err(ParseError {
                message: format!("expected rule, found '{}'", self.describe_next()),
                position: start,
            });
        }
        if word.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseError {
                message: format!("expected rule, found '{}'", word),
                position: start,
            });
        }

        self.pos += word.len();
        match word.as_str() {
            "TRUE" => Ok(RuleExpr::Constant(true)),
            "FALSE" => Ok(RuleExpr::Constant(false)),
            "IN_POSITION" => Ok(RuleExpr::InPosition),
            "AT" => {
                self.expect_char('(')?;
                let indices = self.parse_list(Self::parse_integer)?;
                Ok(RuleExpr::At(indices))
            }
            "AND" | "OR" => {
                self.expect_char('(')?;
                let rules = self.parse_list(Self::parse_rule)?;
                if rules.len() < 2 {
                    return Err(ParseError {
                        message: format!("{} requires at least 2 rules", word),
                        position: start,
                    });
                }
                if word == "AND" {
                    Ok(RuleExpr::And(rules))
                } else {
                    Ok(RuleExpr::Or(rules))
                }
            }
            "XOR" => {
                self.expect_char('(')?;
                let left = self.parse_rule()?;
                self.expect_char(',')?;
                let right = self.parse_rule()?;
                self.expect_char(')')?;
                Ok(RuleExpr::Xor(Box::new(left), Box::new(right)))
            }
            "NOT" => {
                self.expect_char('(')?;
                let rule = self.parse_rule()?;
                self.expect_char(')')?;
                Ok(RuleExpr::Not(Box::new(rule)))
            }
            _ => Ok(RuleExpr::Signal(word.clone())),
        }
    }

    fn parse(&mut self) -> Result<RuleExpr, ParseError> {
        let rule = self.parse_rule()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(ParseError {
                message: format!("unexpected input after rule: '{}'", self.remaining()),
                position: self.pos,
            });
        }
        Ok(rule)
    }
}

pub fn parse(input: &str) -> Result<RuleExpr, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse()
}

/// True if `name` can be used as a signal column in rule expressions.
pub fn is_valid_signal_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&name)
}
