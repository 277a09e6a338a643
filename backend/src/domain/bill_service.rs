//! Bill service domain logic for the finance tracker.
//!
//! Turns a submitted bill form into a signed, stored bill. New bills are
//! created; a submission that carries an existing id replaces that bill in
//! place. The ledger is never touched here, it follows the store's live query.
use chrono::{Local, NaiveDate, Utc};
use shared::BillFormRequest;
use tracing::{error, info};

use crate::domain::bill_form::BillFormService;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::bill::{Bill, BillRecord};
use crate::storage::traits::BillStore;

pub struct BillService<S: BillStore> {
    bill_repository: S,
    form_service: BillFormService,
}

impl<S: BillStore> BillService<S> {
    pub fn new(bill_repository: S, form_service: BillFormService) -> Self {
        Self {
            bill_repository,
            form_service,
        }
    }

    pub fn form_service(&self) -> &BillFormService {
        &self.form_service
    }

    /// Create a bill, or replace `bill_id` when given
    pub async fn submit_bill(
        &self,
        user_id: &str,
        bill_id: Option<&str>,
        form: &BillFormRequest,
    ) -> DomainResult<Bill> {
        self.submit_bill_on(user_id, bill_id, form, Local::now().date_naive())
            .await
    }

    /// Same as [`Self::submit_bill`] with an explicit "today" for undated forms
    pub async fn submit_bill_on(
        &self,
        user_id: &str,
        bill_id: Option<&str>,
        form: &BillFormRequest,
        today: NaiveDate,
    ) -> DomainResult<Bill> {
        let draft = self.form_service.to_draft(form, today)?;
        let value = draft.category.normalize(draft.magnitude);
        debug_assert!(draft.category.accepts(value));

        match bill_id {
            None => {
                let record = BillRecord {
                    date: draft.date,
                    description: draft.description,
                    category: draft.category,
                    value,
                    created_at: Utc::now(),
                };
                let bill = self
                    .bill_repository
                    .create_bill(user_id, &record)
                    .await
                    .map_err(|e| {
                        error!("Failed to add bill for user {}: {:#}", user_id, e);
                        DomainError::Store(e)
                    })?;
                info!("Added bill {} ({}) for user {}", bill.id, bill.value, user_id);
                Ok(bill)
            }
            Some(bill_id) => {
                let existing = self.get_bill(user_id, bill_id).await?;
                let record = BillRecord {
                    date: draft.date,
                    description: draft.description,
                    category: draft.category,
                    value,
                    created_at: existing.created_at,
                };
                let replaced = self
                    .bill_repository
                    .replace_bill(user_id, bill_id, &record)
                    .await
                    .map_err(|e| {
                        error!("Failed to update bill {}: {:#}", bill_id, e);
                        DomainError::Store(e)
                    })?;
                if !replaced {
                    return Err(DomainError::NotFound(bill_id.to_string()));
                }
                info!("Updated bill {} for user {}", bill_id, user_id);
                Ok(Bill::from_record(bill_id.to_string(), user_id.to_string(), record))
            }
        }
    }

    pub async fn delete_bill(&self, user_id: &str, bill_id: &str) -> DomainResult<()> {
        let deleted = self
            .bill_repository
            .delete_bill(user_id, bill_id)
            .await
            .map_err(|e| {
                error!("Failed to delete bill {}: {:#}", bill_id, e);
                DomainError::Store(e)
            })?;
        if !deleted {
            return Err(DomainError::NotFound(bill_id.to_string()));
        }
        info!("Deleted bill {} for user {}", bill_id, user_id);
        Ok(())
    }

    /// Fetch one bill, e.g. to prefill the edit form
    pub async fn get_bill(&self, user_id: &str, bill_id: &str) -> DomainResult<Bill> {
        self.bill_repository
            .get_bill(user_id, bill_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(bill_id.to_string()))
    }
}
