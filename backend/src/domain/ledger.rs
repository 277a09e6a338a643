//! Running-balance computation over date-ordered bills.
//!
//! `accumulate` is the only place a running balance is produced. Callers hand
//! it a complete snapshot already ordered by the store and get a fresh ledger
//! back; nothing from a previous run is reused.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::models::bill::{Bill, BillCategory};

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub bill_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub category: BillCategory,
    pub value: Decimal,
    /// Sum of every value up to and including this entry
    pub running_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ledger {
    pub entries: Vec<LedgerEntry>,
    pub total: Decimal,
}

impl Ledger {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The running balance left the representable decimal range
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Running balance overflowed at bill {bill_id}")]
pub struct BalanceOverflow {
    pub bill_id: String,
}

/// Compute one ledger entry per bill, in input order.
///
/// The input order is trusted as-is: bills sharing a date keep the order the
/// caller's sort gave them.
pub fn accumulate(bills: &[Bill]) -> Result<Ledger, BalanceOverflow> {
    let mut running_balance = Decimal::ZERO;
    let mut entries = Vec::with_capacity(bills.len());

    for bill in bills {
        running_balance = running_balance
            .checked_add(bill.value)
            .ok_or_else(|| BalanceOverflow {
                bill_id: bill.id.clone(),
            })?;
        entries.push(LedgerEntry {
            bill_id: bill.id.clone(),
            date: bill.date,
            description: bill.description.clone(),
            category: bill.category,
            value: bill.value,
            running_balance,
        });
    }

    Ok(Ledger {
        entries,
        total: running_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bill(id: &str, ymd: (i32, u32, u32), description: &str, value: Decimal) -> Bill {
        let category = if value < Decimal::ZERO {
            BillCategory::Expense
        } else {
            BillCategory::Income
        };
        Bill {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            date: NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap(),
            description: description.to_string(),
            category,
            value,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn balances(ledger: &Ledger) -> Vec<Decimal> {
        ledger.entries.iter().map(|e| e.running_balance).collect()
    }

    #[test]
    fn test_empty_input_gives_empty_ledger() {
        let ledger = accumulate(&[]).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.total, Decimal::ZERO);
    }

    #[test]
    fn test_salary_rent_coffee_scenario() {
        let bills = vec![
            bill("1", (2024, 1, 1), "Salary", dec!(1000)),
            bill("2", (2024, 1, 2), "Rent", dec!(-400)),
            bill("3", (2024, 1, 3), "Coffee", dec!(-5)),
        ];

        let ledger = accumulate(&bills).unwrap();

        assert_eq!(balances(&ledger), vec![dec!(1000), dec!(600), dec!(595)]);
        assert_eq!(ledger.total, dec!(595));
        assert_eq!(ledger.entries[1].description, "Rent");
        assert_eq!(ledger.entries[1].value, dec!(-400));
    }

    #[test]
    fn test_zero_value_still_produces_entry() {
        let bills = vec![
            bill("1", (2024, 1, 1), "Salary", dec!(10)),
            bill("2", (2024, 1, 2), "Nothing", dec!(0)),
        ];

        let ledger = accumulate(&bills).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(balances(&ledger), vec![dec!(10), dec!(10)]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let bills = vec![
            bill("b", (2024, 5, 1), "Second by id", dec!(-3)),
            bill("a", (2024, 5, 1), "First by id", dec!(10)),
        ];

        let ledger = accumulate(&bills).unwrap();

        let ids: Vec<_> = ledger.entries.iter().map(|e| e.bill_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(balances(&ledger), vec![dec!(-3), dec!(7)]);
    }

    #[test]
    fn test_many_small_values_sum_exactly() {
        let bills: Vec<Bill> = (0..1000)
            .map(|i| bill(&i.to_string(), (2024, 1, 1), "Cent", dec!(0.01)))
            .collect();

        let ledger = accumulate(&bills).unwrap();

        assert_eq!(ledger.len(), bills.len());
        assert_eq!(ledger.total, dec!(10.00));
        assert_eq!(ledger.entries.last().unwrap().running_balance, dec!(10.00));
    }

    #[test]
    fn test_last_balance_equals_sum_of_values() {
        let values = [dec!(12.34), dec!(-0.34), dec!(-100), dec!(0), dec!(87.99)];
        let bills: Vec<Bill> = values
            .iter()
            .enumerate()
            .map(|(i, v)| bill(&i.to_string(), (2024, 2, 1 + i as u32), "x", *v))
            .collect();

        let ledger = accumulate(&bills).unwrap();
        let sum: Decimal = values.iter().sum();

        assert_eq!(ledger.len(), values.len());
        assert_eq!(ledger.entries.last().unwrap().running_balance, sum);
        assert_eq!(ledger.total, sum);
    }

    #[test]
    fn test_earlier_insert_shifts_every_later_balance() {
        let mut bills = vec![
            bill("1", (2024, 1, 10), "Salary", dec!(1000)),
            bill("2", (2024, 1, 11), "Rent", dec!(-400)),
        ];
        let before = accumulate(&bills).unwrap();

        bills.insert(0, bill("0", (2023, 12, 31), "Opening", dec!(50)));
        let after = accumulate(&bills).unwrap();

        assert_eq!(balances(&before), vec![dec!(1000), dec!(600)]);
        assert_eq!(balances(&after), vec![dec!(50), dec!(1050), dec!(650)]);
    }

    #[test]
    fn test_accumulate_is_repeatable() {
        let bills = vec![
            bill("1", (2024, 1, 1), "Salary", dec!(1000)),
            bill("2", (2024, 1, 2), "Rent", dec!(-400)),
        ];
        assert_eq!(accumulate(&bills).unwrap(), accumulate(&bills).unwrap());
    }

    #[test]
    fn test_overflow_is_reported_not_panicked() {
        let bills = vec![
            bill("1", (2024, 1, 1), "Huge", Decimal::MAX),
            bill("2", (2024, 1, 2), "Push over", dec!(1)),
        ];

        let err = accumulate(&bills).unwrap_err();

        assert_eq!(err.bill_id, "2");
    }
}
