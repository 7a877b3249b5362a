//! Transaction gas metering.

use tracing::trace;

use crate::AnteError;

/// A monotonic gas counter bounded by a limit.
///
/// Consuming past the limit fails with [`AnteError::OutOfGas`] and leaves the meter unchanged, so
/// a rejected charge is never partially applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasMeter {
    /// `None` for an unbounded meter.
    limit: Option<u64>,
    consumed: u64,
}

impl Default for GasMeter {
    fn default() -> Self {
        Self::infinite()
    }
}

impl GasMeter {
    /// Creates a meter bounded by `limit`.
    pub const fn new(limit: u64) -> Self {
        Self { limit: Some(limit), consumed: 0 }
    }

    /// Creates an unbounded meter. It still fails if the counter would overflow.
    pub const fn infinite() -> Self {
        Self { limit: None, consumed: 0 }
    }

    /// Returns `true` if the meter is unbounded.
    pub const fn is_infinite(&self) -> bool {
        self.limit.is_none()
    }

    /// Returns the limit. An unbounded meter reports `u64::MAX`.
    pub const fn limit(&self) -> u64 {
        match self.limit {
            Some(limit) => limit,
            None => u64::MAX,
        }
    }

    /// Returns the gas consumed so far.
    pub const fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Returns the gas left before the limit is reached.
    pub const fn remaining(&self) -> u64 {
        self.limit().saturating_sub(self.consumed)
    }

    /// Consumes `amount` gas for the purpose named by `descriptor`.
    pub fn consume(&mut self, amount: u64, descriptor: &'static str) -> Result<(), AnteError> {
        let limit = self.limit();
        let needed = self.consumed.checked_add(amount).filter(|&needed| needed <= limit).ok_or(
            AnteError::OutOfGas {
                descriptor,
                limit,
                needed: self.consumed.saturating_add(amount),
            },
        )?;
        trace!(target: "evm_ante::gas", amount, descriptor, consumed = needed, "Consumed gas");
        self.consumed = needed;
        Ok(())
    }
}
