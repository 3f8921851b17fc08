//! Mathematical utilities for the lending contracts
//! Checked U256 arithmetic, share accounting and loan schedule formulas
use odra::casper_types::U256;
use crate::constants::{BPS_DENOMINATOR, YEAR_MS};
use crate::errors::MathError;

/// 1e18 fixed-point unit
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Safe math operations for U256
pub struct SafeMath;

impl SafeMath {
    /// Safe addition with overflow check
    pub fn add(a: U256, b: U256) -> Result<U256, MathError> {
        a.checked_add(b).ok_or(MathError::Overflow)
    }

    /// Safe subtraction with underflow check
    pub fn sub(a: U256, b: U256) -> Result<U256, MathError> {
        a.checked_sub(b).ok_or(MathError::Underflow)
    }

    /// Safe multiplication with overflow check
    pub fn mul(a: U256, b: U256) -> Result<U256, MathError> {
        a.checked_mul(b).ok_or(MathError::Overflow)
    }

    /// Safe division with zero check
    pub fn div(a: U256, b: U256) -> Result<U256, MathError> {
        if b.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(a / b)
    }

    /// `a * b / c`, rounded down
    pub fn mul_div(a: U256, b: U256, c: U256) -> Result<U256, MathError> {
        Self::div(Self::mul(a, b)?, c)
    }

    /// `a * b / c`, rounded up
    pub fn mul_div_up(a: U256, b: U256, c: U256) -> Result<U256, MathError> {
        if c.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        let product = Self::mul(a, b)?;
        let quotient = product / c;
        if (product % c).is_zero() {
            Ok(quotient)
        } else {
            Self::add(quotient, U256::one())
        }
    }

    /// Portion of `amount` expressed in basis points, rounded down
    pub fn bps(amount: U256, bps: u64) -> Result<U256, MathError> {
        Self::mul_div(amount, U256::from(bps), U256::from(BPS_DENOMINATOR))
    }
}

/// Conversions between pooled assets and the shares that claim them.
///
/// An empty pool always converts 1:1. Every conversion floors unless the
/// `_up` variant is used, so rounding never lets a holder take more than
/// the pool can back.
pub struct ShareMath;

impl ShareMath {
    /// Shares worth `assets` in a pool of `total_assets` backing `total_shares`
    pub fn to_shares(
        assets: U256,
        total_shares: U256,
        total_assets: U256,
    ) -> Result<U256, MathError> {
        if total_shares.is_zero() || total_assets.is_zero() {
            return Ok(assets);
        }
        SafeMath::mul_div(assets, total_shares, total_assets)
    }

    /// Like [`ShareMath::to_shares`] but rounds up; used when burning shares for a fixed amount
    pub fn to_shares_up(
        assets: U256,
        total_shares: U256,
        total_assets: U256,
    ) -> Result<U256, MathError> {
        if total_shares.is_zero() || total_assets.is_zero() {
            return Ok(assets);
        }
        SafeMath::mul_div_up(assets, total_shares, total_assets)
    }

    /// Assets redeemable for `shares`
    pub fn to_assets(
        shares: U256,
        total_shares: U256,
        total_assets: U256,
    ) -> Result<U256, MathError> {
        if total_shares.is_zero() {
            return Ok(U256::zero());
        }
        SafeMath::mul_div(shares, total_assets, total_shares)
    }
}

/// Interest and repayment schedule formulas
pub struct LoanMath;

impl LoanMath {
    /// Interest accrued on `outstanding` over one `interval_ms` at an annual `rate_bps`
    ///
    /// For a 1/12-year interval this is exactly `outstanding * rate_bps / 10_000 / 12`.
    pub fn period_interest(
        outstanding: U256,
        rate_bps: u32,
        interval_ms: u64,
    ) -> Result<U256, MathError> {
        let numerator = SafeMath::mul(U256::from(rate_bps), U256::from(interval_ms))?;
        let denominator = U256::from(BPS_DENOMINATOR) * U256::from(YEAR_MS);
        SafeMath::mul_div(outstanding, numerator, denominator)
    }

    /// Per-period rate in WAD
    pub fn period_rate(rate_bps: u32, interval_ms: u64) -> Result<U256, MathError> {
        Self::period_interest(U256::from(WAD), rate_bps, interval_ms)
    }

    /// Level installment amortizing `principal` over `num_payments` periods
    ///
    /// payment = P * r * (1 + r)^n / ((1 + r)^n - 1)
    pub fn level_payment(
        principal: U256,
        rate_bps: u32,
        interval_ms: u64,
        num_payments: u32,
    ) -> Result<U256, MathError> {
        if num_payments == 0 {
            return Err(MathError::DivisionByZero);
        }
        let rate = Self::period_rate(rate_bps, interval_ms)?;
        if rate.is_zero() {
            return SafeMath::mul_div_up(principal, U256::one(), U256::from(num_payments));
        }

        let wad = U256::from(WAD);
        let step = SafeMath::add(wad, rate)?;
        let mut growth = wad;
        for _ in 0..num_payments {
            growth = SafeMath::mul_div(growth, step, wad)?;
        }

        let numerator = SafeMath::mul(principal, rate)?;
        let denominator = SafeMath::mul(SafeMath::sub(growth, wad)?, wad)?;
        SafeMath::mul_div(numerator, growth, denominator)
    }
}
