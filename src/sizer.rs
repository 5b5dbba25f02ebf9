//! Trade sizing against a bonding-curve snapshot.
//!
//! The output estimate is the linear approximation `spend * token_reserves /
//! sol_reserves` on the current virtual reserves. It deliberately ignores the
//! trade's own price impact: the on-chain program enforces the real curve
//! invariant, the client only sets bounds around it.

use crate::errors::SizeError;

/// One wallet's computed buy, sized immediately before encoding and discarded
/// after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyOrder {
    /// Nominal spend in lamports.
    pub spend_lamports: u64,
    /// Estimated token output at the snapshot's spot price (smallest unit).
    pub expected_output: u64,
    /// Most lamports the buyer will accept paying, nominal cost inflated by
    /// the slippage fraction.
    pub max_cost: u64,
}

/// Size a buy: expected token output plus the slippage-bounded maximum cost.
///
/// Both values derive from the same reserve pair, callers must not mix
/// snapshots within one order. Pure and deterministic.
pub fn size(
    spend_lamports: u64,
    slippage: f64,
    virtual_sol_reserves: u64,
    virtual_token_reserves: u64,
) -> Result<BuyOrder, SizeError> {
    if spend_lamports == 0 {
        return Err(SizeError::ZeroSpend);
    }
    if !(slippage >= 0.0) {
        return Err(SizeError::NegativeSlippage(slippage));
    }
    if virtual_sol_reserves == 0 || virtual_token_reserves == 0 {
        return Err(SizeError::EmptyReserves {
            sol_reserves: virtual_sol_reserves,
            token_reserves: virtual_token_reserves,
        });
    }

    // Widen to u128: u64 * u64 cannot overflow there, and the division brings
    // the result back toward range before the narrowing check.
    let expected_output =
        (spend_lamports as u128) * (virtual_token_reserves as u128) / (virtual_sol_reserves as u128);
    let expected_output = u64::try_from(expected_output)
        .map_err(|_| SizeError::Overflow(format!("expected output {}", expected_output)))?;

    let inflated = (spend_lamports as f64) * (1.0 + slippage);
    if !inflated.is_finite() || inflated >= u64::MAX as f64 {
        return Err(SizeError::Overflow(format!("max cost {}", inflated)));
    }
    // floor() then clamp from below: the bound may never undershoot the
    // nominal spend, even where f64 rounding loses low bits.
    let max_cost = (inflated.floor() as u64).max(spend_lamports);

    Ok(BuyOrder {
        spend_lamports,
        expected_output,
        max_cost,
    })
}
