//! Discounted price arithmetic.
//!
//! All money flows through `rust_decimal::Decimal`. Revenue is accumulated
//! additively over the lifetime of the service, so binary floating point is
//! not acceptable anywhere on this path.

use rust_decimal::Decimal;

use stockyard_core::{DomainError, DomainResult};

/// Final unit price after applying a percentage discount:
/// `base_price * (1 - discount_percent / 100)`.
///
/// Inputs are constrained to `base_price >= 0` and
/// `0 <= discount_percent <= 100`; anything else is a caller error.
pub fn final_unit_price(base_price: Decimal, discount_percent: Decimal) -> DomainResult<Decimal> {
    if base_price < Decimal::ZERO {
        return Err(DomainError::validation("base price cannot be negative"));
    }
    crate::record::validate_discount(discount_percent)?;

    let factor = Decimal::ONE - discount_percent / Decimal::from(100);
    Ok((base_price * factor).normalize())
}

/// Total for one purchase line.
pub fn line_total(quantity: i64, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}
