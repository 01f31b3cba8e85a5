//! Trades, orders and the trade lifecycle.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Buy,
    Sell,
}

impl OrderType {
    pub fn complement(self) -> Self {
        match self {
            OrderType::Buy => OrderType::Sell,
            OrderType::Sell => OrderType::Buy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_type: OrderType,
    pub index: usize,
    pub price: f64,
    pub amount: f64,
}

/// Lifecycle of a trade. Strategies only dispatch on `New` and `Opened`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeState {
    New,
    Opened,
    Closed,
}

/// A pair of entry and exit orders.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    starting_type: OrderType,
    entry: Option<Order>,
    exit: Option<Order>,
}

impl Default for Trade {
    fn default() -> Self {
        Self::new(OrderType::Buy)
    }
}

impl Trade {
    pub fn new(starting_type: OrderType) -> Self {
        Self {
            starting_type,
            entry: None,
            exit: None,
        }
    }

    pub fn starting_type(&self) -> OrderType {
        self.starting_type
    }

    pub fn entry(&self) -> Option<&Order> {
        self.entry.as_ref()
    }

    pub fn exit(&self) -> Option<&Order> {
        self.exit.as_ref()
    }

    pub fn state(&self) -> TradeState {
        match (&self.entry, &self.exit) {
            (None, _) => TradeState::New,
            (Some(_), None) => TradeState::Opened,
            (Some(_), Some(_)) => TradeState::Closed,
        }
    }

    pub fn is_new(&self) -> bool {
        self.state() == TradeState::New
    }

    pub fn is_opened(&self) -> bool {
        self.state() == TradeState::Opened
    }

    pub fn is_closed(&self) -> bool {
        self.state() == TradeState::Closed
    }

    /// Record the next order of the trade.
    ///
    /// Opens a new trade, closes an opened one, and does nothing on a closed
    /// trade. An exit before the entry index is refused.
    pub fn operate(&mut self, index: usize, price: f64, amount: f64) -> Option<Order> {
        match self.state() {
            TradeState::New => {
                let order = Order {
                    order_type: self.starting_type,
                    index,
                    price,
                    amount,
                };
                self.entry = Some(order.clone());
                Some(order)
            }
            TradeState::Opened => {
                let entry_index = self.entry.as_ref().map(|o| o.index)?;
                if index < entry_index {
                    return None;
                }
                let order = Order {
                    order_type: self.starting_type.complement(),
                    index,
                    price,
                    amount,
                };
                self.exit = Some(order.clone());
                Some(order)
            }
            TradeState::Closed => None,
        }
    }
}
