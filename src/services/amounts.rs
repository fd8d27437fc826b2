//! Fixed-point helpers shared by the stock ledger and the purchase aggregator.
//!
//! Columns are NUMERIC(12,2). Inputs with more precision than that are
//! rejected instead of being rounded by the store, so the running aggregates
//! and the rows they summarize always agree to the cent.

use crate::errors::ServiceError;
use rust_decimal::{Decimal, RoundingStrategy};

pub const SCALE: u32 = 2;

/// Largest magnitude a NUMERIC(12,2) column can hold.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, SCALE)
}

/// Rejects values with more than two fractional digits or outside the column range.
pub fn check_amount(value: Decimal, field: &str) -> Result<Decimal, ServiceError> {
    if value.normalize().scale() > SCALE {
        return Err(ServiceError::ValidationError(format!(
            "{} must have at most {} decimal places",
            field, SCALE
        )));
    }
    if value.abs() > max_amount() {
        return Err(ServiceError::ValidationError(format!(
            "{} is out of range",
            field
        )));
    }
    Ok(value)
}

pub fn check_non_negative(value: Decimal, field: &str) -> Result<Decimal, ServiceError> {
    let value = check_amount(value, field)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ServiceError::ValidationError(format!(
            "{} must be greater than or equal to 0",
            field
        )));
    }
    Ok(value)
}

pub fn check_positive(value: Decimal, field: &str) -> Result<Decimal, ServiceError> {
    let value = check_amount(value, field)?;
    if value <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(value)
}

/// `quantity * unit_price`, rounded half away from zero to the column scale.
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Result<Decimal, ServiceError> {
    let total = quantity
        .checked_mul(unit_price)
        .ok_or_else(|| ServiceError::ValidationError("Line total is out of range".to_string()))?
        .round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    check_amount(total, "total_price")
}
