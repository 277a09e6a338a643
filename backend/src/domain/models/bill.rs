//! Domain model for a bill.
use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display format shared by storage and the API: day/month/year
pub const BILL_DATE_FORMAT: &str = shared::BILL_DATE_FORMAT;

/// `%Y` alone would take "24" as the year 24
static BILL_DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("date pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillCategory {
    Expense,
    Income,
}

impl BillCategory {
    /// Signed stored value for a user-entered magnitude.
    pub fn normalize(self, raw_magnitude: Decimal) -> Decimal {
        crate::domain::bill_normalizer::normalize(raw_magnitude, self)
    }

    /// Whether `value` carries the sign this category requires. Zero fits both.
    pub fn accepts(self, value: Decimal) -> bool {
        match self {
            BillCategory::Expense => value <= Decimal::ZERO,
            BillCategory::Income => value >= Decimal::ZERO,
        }
    }
}

/// A persisted bill, owned by exactly one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub category: BillCategory,
    pub value: Decimal,
    /// Set on creation, kept across replacements; orders same-day bills
    pub created_at: DateTime<Utc>,
}

/// Everything a store needs to write a bill, minus the identity it assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct BillRecord {
    pub date: NaiveDate,
    pub description: String,
    pub category: BillCategory,
    pub value: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn from_record(id: String, user_id: String, record: BillRecord) -> Self {
        Self {
            id,
            user_id,
            date: record.date,
            description: record.description,
            category: record.category,
            value: record.value,
            created_at: record.created_at,
        }
    }
}

pub fn parse_bill_date(date: &str) -> Result<NaiveDate> {
    let trimmed = date.trim();
    if !BILL_DATE_SHAPE.is_match(trimmed) {
        return Err(anyhow!("Invalid date '{}', expected dd/mm/yyyy", date));
    }
    NaiveDate::parse_from_str(trimmed, BILL_DATE_FORMAT)
        .map_err(|e| anyhow!("Invalid date '{}', expected dd/mm/yyyy: {}", date, e))
}

pub fn format_bill_date(date: NaiveDate) -> String {
    date.format(BILL_DATE_FORMAT).to_string()
}
