//! Monetary conversion into integer minor units.

use crate::error::{Result, StoreError};

/// Minor units per major currency unit.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Convert a decimal major-unit amount (e.g. `10.50`) into minor units.
///
/// The scaled `f64` is rounded half away from zero. Ties are judged on the
/// binary value, so a decimal such as `1.005` (stored just below the tie)
/// becomes `100`, not `101`. Non-finite input, or a value that rounds to zero
/// or below, is rejected.
pub fn to_minor_units(major: f64) -> Result<i64> {
    if !major.is_finite() {
        return Err(StoreError::invalid(format!("amount {major} is not a number")));
    }
    let scaled = (major * MINOR_PER_MAJOR as f64).round();
    if scaled > i64::MAX as f64 {
        return Err(StoreError::invalid(format!("amount {major} is too large")));
    }
    let minor = scaled as i64;
    ensure_positive(minor)?;
    Ok(minor)
}

/// Reject amounts that are zero or negative.
pub fn ensure_positive(minor: i64) -> Result<()> {
    if minor <= 0 {
        return Err(StoreError::invalid(format!(
            "amount must be positive, got {minor} minor units"
        )));
    }
    Ok(())
}
