//! Block-scoped execution context threaded through the admission stages.

use crate::{DecCoins, GasMeter};

/// The mode a transaction is checked in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecMode {
    /// First mempool admission.
    #[default]
    Check,
    /// Mempool re-admission after a block was committed.
    ReCheck,
    /// Block execution.
    Deliver,
}

/// The header of the block the transaction is checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block height.
    pub height: u64,
    /// Block time, in seconds since the Unix epoch.
    pub time: u64,
    /// Cosmos chain id.
    pub chain_id: String,
}

/// Per-block state that is reset every block and never persisted by the admission stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockTransient {
    /// Gas wanted by the transactions admitted so far in the block.
    pub gas_wanted: u64,
}

/// The context a transaction is admitted in.
///
/// A context is exclusively owned by the block driver. The handler hands each stage a mutable
/// branch of it and writes the branch back only once every stage passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// The block header.
    pub header: BlockHeader,
    /// The mode the transaction is checked in.
    pub exec_mode: ExecMode,
    /// Consensus `max_gas` of a block. `-1` means unlimited.
    pub consensus_max_gas: i64,
    /// Limit of the block gas meter, zero if the block has no gas meter.
    pub block_gas_meter_limit: u64,
    /// Minimum gas prices this node accepts into its mempool.
    pub min_gas_prices: DecCoins,
    /// The transaction gas meter.
    pub gas_meter: GasMeter,
    /// Per-block transient state.
    pub transient: BlockTransient,
}

impl Context {
    /// Creates a context for a block at `height` and `time`.
    pub fn new(chain_id: impl Into<String>, height: u64, time: u64) -> Self {
        Self {
            header: BlockHeader { height, time, chain_id: chain_id.into() },
            consensus_max_gas: -1,
            ..Default::default()
        }
    }

    /// Set the execution mode.
    pub const fn with_exec_mode(mut self, exec_mode: ExecMode) -> Self {
        self.exec_mode = exec_mode;
        self
    }

    /// Set the consensus `max_gas`.
    pub const fn with_consensus_max_gas(mut self, max_gas: i64) -> Self {
        self.consensus_max_gas = max_gas;
        self
    }

    /// Set the block gas meter limit.
    pub const fn with_block_gas_meter_limit(mut self, limit: u64) -> Self {
        self.block_gas_meter_limit = limit;
        self
    }

    /// Set the node-local minimum gas prices.
    pub fn with_min_gas_prices(mut self, min_gas_prices: DecCoins) -> Self {
        self.min_gas_prices = min_gas_prices;
        self
    }

    /// Set the transaction gas meter.
    pub const fn with_gas_meter(mut self, gas_meter: GasMeter) -> Self {
        self.gas_meter = gas_meter;
        self
    }

    /// Returns `true` when checking for the mempool, first admission or re-admission.
    pub const fn is_check_tx(&self) -> bool {
        matches!(self.exec_mode, ExecMode::Check | ExecMode::ReCheck)
    }

    /// Returns `true` when re-checking for the mempool.
    pub const fn is_recheck_tx(&self) -> bool {
        matches!(self.exec_mode, ExecMode::ReCheck)
    }

    /// Returns the gas available to the whole block.
    ///
    /// The block gas meter's limit wins if there is one. Otherwise the consensus `max_gas`
    /// applies, where `-1` means unlimited.
    pub const fn block_gas_limit(&self) -> u64 {
        if self.block_gas_meter_limit != 0 {
            return self.block_gas_meter_limit;
        }
        match self.consensus_max_gas {
            -1 => u64::MAX,
            max_gas if max_gas > 0 => max_gas as u64,
            _ => 0,
        }
    }

    /// Returns a copy of the context for checking a single transaction.
    pub fn branch(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_gas_limit() {
        let ctx = Context::new("test_1-1", 1, 0);
        assert_eq!(ctx.block_gas_limit(), u64::MAX);
        assert_eq!(ctx.clone().with_consensus_max_gas(30_000_000).block_gas_limit(), 30_000_000);
        assert_eq!(ctx.clone().with_consensus_max_gas(0).block_gas_limit(), 0);
        assert_eq!(ctx.clone().with_consensus_max_gas(-7).block_gas_limit(), 0);
        assert_eq!(
            ctx.with_consensus_max_gas(30_000_000).with_block_gas_meter_limit(1_000).block_gas_limit(),
            1_000
        );
    }

    #[test]
    fn test_exec_mode_flags() {
        let ctx = Context::new("test_1-1", 1, 0);
        assert!(ctx.is_check_tx());
        assert!(!ctx.is_recheck_tx());
        let ctx = ctx.with_exec_mode(ExecMode::ReCheck);
        assert!(ctx.is_check_tx() && ctx.is_recheck_tx());
        assert!(!ctx.with_exec_mode(ExecMode::Deliver).is_check_tx());
    }
}
