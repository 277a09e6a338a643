//! Sign normalization for bill values.
//!
//! Users always type a magnitude. The stored value carries the direction of
//! the cash flow in its sign, so summing a ledger never has to look at the
//! category again.

use rust_decimal::Decimal;

use crate::domain::models::bill::BillCategory;

/// Derive the stored, signed value from a raw magnitude and its category.
///
/// Expenses are never positive and income is never negative. Zero passes
/// through under either category. Total and idempotent.
pub fn normalize(raw_magnitude: Decimal, category: BillCategory) -> Decimal {
    match category {
        BillCategory::Expense if raw_magnitude > Decimal::ZERO => -raw_magnitude,
        BillCategory::Income if raw_magnitude < Decimal::ZERO => -raw_magnitude,
        _ => raw_magnitude,
    }
}
