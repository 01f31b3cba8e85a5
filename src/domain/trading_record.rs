//! Trading record: the trade history rules and strategies read from.

use crate::domain::trade::{Order, OrderType, Trade};

/// Read access to a trading history.
pub trait TradingRecord {
    /// The trade currently being built. A fresh `New` trade once the last one closed.
    fn current_trade(&self) -> &Trade;

    /// Closed trades, oldest first.
    fn trades(&self) -> &[Trade];

    fn is_closed(&self) -> bool {
        !self.current_trade().is_opened()
    }
}

/// In-memory trading record.
#[derive(Debug, Clone)]
pub struct BaseTradingRecord {
    starting_type: OrderType,
    current: Trade,
    trades: Vec<Trade>,
    last_order: Option<Order>,
}

impl Default for BaseTradingRecord {
    fn default() -> Self {
        Self::new(OrderType::Buy)
    }
}

impl BaseTradingRecord {
    pub fn new(starting_type: OrderType) -> Self {
        Self {
            starting_type,
            current: Trade::new(starting_type),
            trades: Vec::new(),
            last_order: None,
        }
    }

    /// Record the next order: entry on a new trade, exit on an opened one.
    pub fn operate(&mut self, index: usize, price: f64, amount: f64) -> Option<Order> {
        let order = self.current.operate(index, price, amount)?;
        if self.current.is_closed() {
            let closed = std::mem::replace(&mut self.current, Trade::new(self.starting_type));
            self.trades.push(closed);
        }
        self.last_order = Some(order.clone());
        Some(order)
    }

    /// Open a trade. Returns false if one is already open.
    pub fn enter(&mut self, index: usize, price: f64, amount: f64) -> bool {
        if self.current.is_new() {
            return self.operate(index, price, amount).is_some();
        }
        false
    }

    /// Close the open trade. Returns false if none is open.
    pub fn exit(&mut self, index: usize, price: f64, amount: f64) -> bool {
        if self.current.is_opened() {
            return self.operate(index, price, amount).is_some();
        }
        false
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn last_trade(&self) -> Option<&Trade> {
        self.trades.last()
    }

    pub fn last_order(&self) -> Option<&Order> {
        self.last_order.as_ref()
    }

    pub fn last_entry(&self) -> Option<&Order> {
        self.current
            .entry()
            .or_else(|| self.trades.last().and_then(|t| t.entry()))
    }

    pub fn last_exit(&self) -> Option<&Order> {
        self.trades.last().and_then(|t| t.exit())
    }
}

impl TradingRecord for BaseTradingRecord {
    fn current_trade(&self) -> &Trade {
        &self.current
    }

    fn trades(&self) -> &[Trade] {
        &self.trades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeState;

    #[test]
    fn fresh_record_has_new_trade() {
        let record = BaseTradingRecord::default();
        assert_eq!(record.current_trade().state(), TradeState::New);
        assert!(record.is_closed());
        assert_eq!(record.trade_count(), 0);
        assert!(record.last_trade().is_none());
        assert!(record.last_order().is_none());
    }

    #[test]
    fn enter_then_exit_archives_trade() {
        let mut record = BaseTradingRecord::default();
        assert!(record.enter(1, 10.0, 1.0));
        assert!(record.current_trade().is_opened());
        assert!(!record.is_closed());
        assert!(!record.enter(2, 11.0, 1.0));

        assert!(record.exit(4, 12.0, 1.0));
        assert!(record.current_trade().is_new());
        assert_eq!(record.trade_count(), 1);
        assert!(record.last_trade().unwrap().is_closed());
        assert_eq!(record.last_exit().unwrap().index, 4);
        assert_eq!(record.last_entry().unwrap().index, 1);
        assert!(!record.exit(5, 12.0, 1.0));
    }

    #[test]
    fn operate_alternates_orders() {
        let mut record = BaseTradingRecord::new(OrderType::Sell);
        let first = record.operate(0, 100.0, 1.0).unwrap();
        let second = record.operate(3, 90.0, 1.0).unwrap();
        let third = record.operate(5, 95.0, 1.0).unwrap();

        assert_eq!(first.order_type, OrderType::Sell);
        assert_eq!(second.order_type, OrderType::Buy);
        assert_eq!(third.order_type, OrderType::Sell);
        assert_eq!(record.trade_count(), 1);
        assert!(record.current_trade().is_opened());
        assert_eq!(record.last_entry().unwrap().index, 5);
        assert_eq!(record.last_order().unwrap().index, 5);
    }

    #[test]
    fn trades_are_kept_in_order() {
        let mut record = BaseTradingRecord::default();
        for (entry, exit) in [(0, 2), (3, 6), (8, 9)] {
            record.enter(entry, 1.0, 1.0);
            record.exit(exit, 1.0, 1.0);
        }
        let entries: Vec<usize> = record
            .trades()
            .iter()
            .map(|t| t.entry().unwrap().index)
            .collect();
        assert_eq!(entries, vec![0, 3, 8]);
    }
}
