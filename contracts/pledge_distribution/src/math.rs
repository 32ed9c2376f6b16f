//! # Allocation arithmetic
//!
//! Pure, deterministic integer arithmetic over a basis-points domain where
//! [`BPS_DENOMINATOR`] represents 100%. Every division truncates toward zero;
//! the residue that truncation leaves in custody is the "dust" that
//! `recover_stuck_tokens` can later sweep.
//!
//! No function here wraps: any intermediate that leaves the `i128` domain is
//! reported as [`Error::Overflow`].

use crate::Error;

/// 10,000 basis points = 100%.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// `deposit * conversion_rate / 10_000`.
pub fn raw_allocation(deposit: i128, conversion_rate_bps: u32) -> Result<i128, Error> {
    deposit
        .checked_mul(conversion_rate_bps as i128)
        .map(|v| v / BPS_DENOMINATOR as i128)
        .ok_or(Error::Overflow)
}

/// Raw allocation scaled down by `scaling_ratio_bps`.
pub fn scaled_allocation(
    deposit: i128,
    conversion_rate_bps: u32,
    scaling_ratio_bps: u32,
) -> Result<i128, Error> {
    raw_allocation(deposit, conversion_rate_bps)?
        .checked_mul(scaling_ratio_bps as i128)
        .map(|v| v / BPS_DENOMINATOR as i128)
        .ok_or(Error::Overflow)
}

/// Deposit returned to a participant whose allocation was scaled down.
///
/// The unscaled equivalent of `scaled` (`scaled * 10_000 / ratio`) is what
/// the allocation consumed of the deposit; the rest is refunded. With no
/// scaling (`ratio == 10_000`) the refund is zero.
pub fn refund(deposit: i128, scaled: i128, scaling_ratio_bps: u32) -> Result<i128, Error> {
    if scaling_ratio_bps >= BPS_DENOMINATOR {
        return Ok(0);
    }
    if scaling_ratio_bps == 0 {
        return Err(Error::InvalidRate);
    }
    let consumed = scaled
        .checked_mul(BPS_DENOMINATOR as i128)
        .ok_or(Error::Overflow)?
        / scaling_ratio_bps as i128;
    match deposit.checked_sub(consumed) {
        Some(refund) if refund >= 0 => Ok(refund),
        _ => Err(Error::RefundExceedsDeposit),
    }
}

/// Scaling ratio for a distribution that must pay `required` out of `cap`.
///
/// `10_000` when the cap covers demand; otherwise `cap * 10_000 / required`,
/// floored at `min_ratio_bps`.
pub fn scaling_ratio(required: i128, cap: i128, min_ratio_bps: u32) -> Result<u32, Error> {
    if required <= cap {
        return Ok(BPS_DENOMINATOR);
    }
    let ratio = cap
        .checked_mul(BPS_DENOMINATOR as i128)
        .ok_or(Error::Overflow)?
        / required;
    // cap < required, so ratio < 10_000 and fits in u32.
    Ok((ratio as u32).max(min_ratio_bps))
}

/// Largest single deposit whose conversion cannot overflow.
pub fn max_convertible_deposit(conversion_rate_bps: u32) -> i128 {
    i128::MAX / conversion_rate_bps.max(1) as i128
}
