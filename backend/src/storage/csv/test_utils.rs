use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use std::path::Path;
use tempfile::TempDir;

use super::connection::CsvConnection;
use crate::domain::models::bill::{parse_bill_date, BillCategory, BillRecord};

/// Test environment backed by a temporary data directory
pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub connection: CsvConnection,
}

impl TestEnvironment {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        Ok(Self {
            _temp_dir: temp_dir,
            connection,
        })
    }

    pub fn base_directory(&self) -> &Path {
        self.connection.base_directory()
    }
}

/// Build a bill record dated `date` (dd/mm/yyyy), created now
pub fn record(date: &str, description: &str, category: BillCategory, value: Decimal) -> BillRecord {
    BillRecord {
        date: parse_bill_date(date).unwrap(),
        description: description.to_string(),
        category,
        value,
        created_at: Utc::now(),
    }
}
