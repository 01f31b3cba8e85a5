//! Signal data access port trait.

use crate::domain::error::StrategyError;
use crate::domain::signal::SignalSeries;

/// Source of the precomputed boolean signals rules read from.
pub trait SignalPort {
    fn load_signals(&self) -> Result<SignalSeries, StrategyError>;
}
