use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::connection::CsvConnection;
use crate::domain::models::bill::{format_bill_date, parse_bill_date, Bill, BillCategory, BillRecord};
use crate::storage::traits::{BillSnapshot, BillStore, BillSubscription};

const BILLS_HEADER: [&str; 7] = ["id", "user_id", "date", "description", "category", "value", "created_at"];
const SUBSCRIPTION_BUFFER: usize = 8;

/// One line of `bills.csv`
#[derive(Debug, Serialize, Deserialize)]
struct BillRow {
    id: String,
    user_id: String,
    date: String,
    description: String,
    category: BillCategory,
    value: Decimal,
    created_at: DateTime<Utc>,
}

impl BillRow {
    fn from_bill(bill: &Bill) -> Self {
        Self {
            id: bill.id.clone(),
            user_id: bill.user_id.clone(),
            date: format_bill_date(bill.date),
            description: bill.description.clone(),
            category: bill.category,
            value: bill.value,
            created_at: bill.created_at,
        }
    }

    fn into_bill(self) -> Result<Bill> {
        let date = parse_bill_date(&self.date)
            .with_context(|| format!("Bill {} has an unreadable date", self.id))?;
        if !self.category.accepts(self.value) {
            return Err(anyhow!(
                "Bill {} has value {} which does not fit category {:?}",
                self.id,
                self.value,
                self.category
            ));
        }
        Ok(Bill {
            id: self.id,
            user_id: self.user_id,
            date,
            description: self.description,
            category: self.category,
            value: self.value,
            created_at: self.created_at,
        })
    }
}

/// CSV-based bill repository, one `bills.csv` per user
#[derive(Clone)]
pub struct CsvBillRepository {
    connection: CsvConnection,
}

impl CsvBillRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read all bills for a user, in file order
    fn read_bills(&self, user_id: &str) -> Result<Vec<Bill>> {
        let file_path = self.connection.get_bills_file_path(user_id)?;
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {}", file_path.display()))?;
        let mut csv_reader = ReaderBuilder::new().from_reader(BufReader::new(file));

        let mut bills = Vec::new();
        for row in csv_reader.deserialize::<BillRow>() {
            let row = row.with_context(|| format!("Corrupt row in {}", file_path.display()))?;
            bills.push(row.into_bill()?);
        }
        Ok(bills)
    }

    /// Write all bills for a user through a temp file and an atomic rename
    fn write_bills(&self, user_id: &str, bills: &[Bill]) -> Result<()> {
        self.connection.ensure_user_directory_exists(user_id)?;
        let file_path = self.connection.get_bills_file_path(user_id)?;
        let temp_path = file_path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to open {}", temp_path.display()))?;
            let mut csv_writer = WriterBuilder::new()
                .has_headers(false)
                .from_writer(BufWriter::new(file));

            csv_writer.write_record(BILLS_HEADER)?;
            for bill in bills {
                csv_writer.serialize(BillRow::from_bill(bill))?;
            }
            csv_writer.flush()?;
        }

        fs::rename(&temp_path, &file_path)
            .with_context(|| format!("Failed to replace {}", file_path.display()))?;
        Ok(())
    }

    fn sort_by_date(bills: &mut [Bill]) {
        bills.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}

#[async_trait]
impl BillStore for CsvBillRepository {
    async fn create_bill(&self, user_id: &str, record: &BillRecord) -> Result<Bill> {
        let bill = Bill::from_record(Bill::generate_id(), user_id.to_string(), record.clone());

        {
            let _guard = self.connection.lock_writes().await;
            let mut bills = self.read_bills(user_id)?;
            bills.push(bill.clone());
            self.write_bills(user_id, &bills)?;
        }

        info!("Stored bill {} for user {}", bill.id, user_id);
        self.connection.notify_bills_changed(user_id);
        Ok(bill)
    }

    async fn replace_bill(&self, user_id: &str, bill_id: &str, record: &BillRecord) -> Result<bool> {
        {
            let _guard = self.connection.lock_writes().await;
            let mut bills = self.read_bills(user_id)?;
            let Some(existing) = bills.iter_mut().find(|b| b.id == bill_id) else {
                warn!("Bill {} not found for user {}", bill_id, user_id);
                return Ok(false);
            };
            *existing = Bill::from_record(bill_id.to_string(), user_id.to_string(), record.clone());
            self.write_bills(user_id, &bills)?;
        }

        info!("Replaced bill {} for user {}", bill_id, user_id);
        self.connection.notify_bills_changed(user_id);
        Ok(true)
    }

    async fn delete_bill(&self, user_id: &str, bill_id: &str) -> Result<bool> {
        {
            let _guard = self.connection.lock_writes().await;
            let mut bills = self.read_bills(user_id)?;
            let before = bills.len();
            bills.retain(|b| b.id != bill_id);
            if bills.len() == before {
                return Ok(false);
            }
            self.write_bills(user_id, &bills)?;
        }

        info!("Deleted bill {} for user {}", bill_id, user_id);
        self.connection.notify_bills_changed(user_id);
        Ok(true)
    }

    async fn get_bill(&self, user_id: &str, bill_id: &str) -> Result<Option<Bill>> {
        Ok(self.read_bills(user_id)?.into_iter().find(|b| b.id == bill_id))
    }

    async fn list_bills_by_date(&self, user_id: &str) -> Result<Vec<Bill>> {
        let mut bills = self.read_bills(user_id)?;
        Self::sort_by_date(&mut bills);
        Ok(bills)
    }

    fn subscribe(&self, user_id: &str) -> BillSubscription {
        let (sender, receiver) = mpsc::channel::<BillSnapshot>(SUBSCRIPTION_BUFFER);
        // Register for changes before the first load so no write slips between them
        let mut changes = self.connection.subscribe_to_changes(user_id);
        let repository = self.clone();
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            debug!("Live bill query started for user {}", user_id);
            loop {
                let snapshot = repository.list_bills_by_date(&user_id).await;
                if let Err(e) = &snapshot {
                    warn!("Bill snapshot for user {} failed: {:#}", user_id, e);
                }
                if sender.send(snapshot).await.is_err() {
                    break;
                }

                tokio::select! {
                    _ = sender.closed() => break,
                    change = changes.recv() => match change {
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            // Coalesce a burst of writes into one reload
                            while changes.try_recv().is_ok() {}
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!("Live bill query stopped for user {}", user_id);
        });

        BillSubscription::new(receiver)
    }
}
