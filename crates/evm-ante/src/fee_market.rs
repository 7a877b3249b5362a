//! EIP-1559 fee market block hooks.
//!
//! The admission stages accumulate the gas wanted of every admitted transaction into
//! [`BlockTransient::gas_wanted`](crate::BlockTransient). At the end of a block [`end_block`]
//! settles that total into the fee market store, and at the beginning of the next block
//! [`begin_block`] derives the new base fee from it.

use alloy_primitives::U256;
use tracing::debug;

use crate::{AnteError, Context, Dec, FeeMarketKeeper, FeeMarketParams};

/// Returns the base fee that applies at `height`, or `None` if the base fee is not enabled.
pub fn current_base_fee<K: FeeMarketKeeper>(keeper: &K, height: u64) -> Option<U256> {
    let params = keeper.params();
    if !params.is_base_fee_enabled(height) {
        return None;
    }
    keeper.base_fee()
}

/// Computes the base fee of the block at `height` from the parent block's base fee
/// (`params.base_fee`) and gas wanted.
///
/// Returns `None` if the base fee is not enabled at `height`. The first enabled block uses the
/// configured base fee. Otherwise the base fee moves towards the gas target by at most
/// `1 / base_fee_change_denominator`, never dropping below the chain-wide minimum gas price.
pub fn calculate_base_fee(
    params: &FeeMarketParams,
    height: u64,
    parent_gas_wanted: u64,
    consensus_max_gas: i64,
) -> Option<U256> {
    if !params.is_base_fee_enabled(height) {
        return None;
    }
    if height == params.enable_height {
        return Some(params.base_fee);
    }

    let parent_base_fee = params.base_fee;
    let gas_limit = if consensus_max_gas > -1 { consensus_max_gas as u64 } else { u64::MAX };
    let parent_gas_target = gas_limit.checked_div(u64::from(params.elasticity_multiplier))?;
    if parent_gas_target == 0 || params.base_fee_change_denominator == 0 {
        return Some(parent_base_fee);
    }
    let denominator = U256::from(params.base_fee_change_denominator);
    let target = U256::from(parent_gas_target);

    match parent_gas_wanted.cmp(&parent_gas_target) {
        core::cmp::Ordering::Equal => Some(parent_base_fee),
        core::cmp::Ordering::Greater => {
            let delta = U256::from(parent_gas_wanted - parent_gas_target);
            let base_fee_delta =
                (parent_base_fee.checked_mul(delta)? / target / denominator).max(U256::from(1));
            parent_base_fee.checked_add(base_fee_delta)
        }
        core::cmp::Ordering::Less => {
            let delta = U256::from(parent_gas_target - parent_gas_wanted);
            let base_fee_delta = parent_base_fee.checked_mul(delta)? / target / denominator;
            let floor = params.min_gas_price.truncate();
            Some(parent_base_fee.saturating_sub(base_fee_delta).max(floor))
        }
    }
}

/// Returns the gas wanted a block records for the next base fee computation:
/// `max(gas_wanted * min_gas_multiplier, gas_used)`, truncated.
///
/// Scaling the gas wanted down keeps transactions that declare far more gas than they use from
/// moving the base fee on their own.
pub fn settle_block_gas_wanted(
    gas_wanted: u64,
    gas_used: u64,
    min_gas_multiplier: Dec,
) -> Result<u64, AnteError> {
    if gas_wanted > i64::MAX as u64 {
        return Err(AnteError::Overflow("block gas wanted exceeds i64::MAX"));
    }
    if gas_used > i64::MAX as u64 {
        return Err(AnteError::Overflow("block gas used exceeds i64::MAX"));
    }
    let limited = Dec::from(gas_wanted)
        .checked_mul(min_gas_multiplier)
        .ok_or(AnteError::Overflow("limited gas wanted"))?;
    let settled = limited.max(Dec::from(gas_used)).truncate();
    u64::try_from(settled).map_err(|_| AnteError::Overflow("settled gas wanted"))
}

/// Begin block hook: computes the base fee of the current block and stores it.
pub fn begin_block<K: FeeMarketKeeper>(keeper: &K, ctx: &Context) -> Option<U256> {
    let params = keeper.params();
    let base_fee = calculate_base_fee(
        &params,
        ctx.header.height,
        keeper.block_gas_wanted(),
        ctx.consensus_max_gas,
    )?;
    keeper.set_base_fee(base_fee);
    debug!(target: "evm_ante::fee_market", height = ctx.header.height, %base_fee, "Updated base fee");
    Some(base_fee)
}

/// End block hook: settles the gas wanted accumulated by the admission stages and resets the
/// per-block accumulator.
pub fn end_block<K: FeeMarketKeeper>(
    keeper: &K,
    ctx: &mut Context,
    block_gas_used: u64,
) -> Result<u64, AnteError> {
    let params = keeper.params();
    let settled = settle_block_gas_wanted(
        ctx.transient.gas_wanted,
        block_gas_used,
        params.min_gas_multiplier,
    )?;
    keeper.set_block_gas_wanted(settled);
    debug!(
        target: "evm_ante::fee_market",
        height = ctx.header.height,
        gas_wanted = ctx.transient.gas_wanted,
        block_gas_used,
        settled,
        "Settled block gas wanted"
    );
    ctx.transient = Default::default();
    Ok(settled)
}
