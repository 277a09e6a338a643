//! Bill form handling.
//!
//! Everything a client types into the bill form is checked here before a
//! value reaches the normalizer or the store. A form that fails any check is
//! rejected as a whole.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use shared::{BillFormRequest, BillFormValidation, BillValidationError};
use std::str::FromStr;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::bill::{parse_bill_date, BillCategory};
use crate::io::rest::mappers::bill_mapper::BillMapper;

/// Digits with an optional `.` or `,` separator and at most two decimals
static AMOUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]*([.,][0-9]{0,2})?$").expect("amount pattern is valid"));

#[derive(Debug, Clone)]
pub struct BillFormConfig {
    pub max_description_length: usize,
    /// Largest magnitude a single bill may carry
    pub max_amount: Decimal,
}

impl Default for BillFormConfig {
    fn default() -> Self {
        Self {
            max_description_length: 256,
            max_amount: Decimal::from(1_000_000_000u64),
        }
    }
}

/// A fully validated form, ready to be normalized and stored
#[derive(Debug, Clone, PartialEq)]
pub struct BillDraft {
    pub date: NaiveDate,
    pub description: String,
    pub category: BillCategory,
    /// Unsigned amount as typed
    pub magnitude: Decimal,
}

#[derive(Clone, Default)]
pub struct BillFormService {
    config: BillFormConfig,
}

impl BillFormService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BillFormConfig) -> Self {
        Self { config }
    }

    /// Validate the whole form, collecting every problem at once
    pub fn validate(&self, form: &BillFormRequest) -> BillFormValidation {
        let mut errors = Vec::new();

        let description = form.description.trim();
        if description.is_empty() {
            errors.push(BillValidationError::EmptyDescription);
        } else if description.chars().count() > self.config.max_description_length {
            errors.push(BillValidationError::DescriptionTooLong(description.chars().count()));
        }

        if let Some(date) = form.date.as_deref() {
            if let Err(e) = parse_bill_date(date) {
                errors.push(BillValidationError::InvalidDate(e.to_string()));
            }
        }

        let cleaned_amount = match self.parse_amount(&form.amount) {
            Ok(amount) => Some(amount),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let messages = errors.iter().map(|e| self.error_message(e)).collect();

        BillFormValidation {
            is_valid: errors.is_empty(),
            errors,
            messages,
            cleaned_amount,
        }
    }

    /// Turn a form into a draft, or fail with every validation error found
    pub fn to_draft(&self, form: &BillFormRequest, today: NaiveDate) -> DomainResult<BillDraft> {
        let validation = self.validate(form);
        if !validation.is_valid {
            return Err(DomainError::InvalidForm(validation.errors));
        }

        let date = match form.date.as_deref() {
            Some(date) => parse_bill_date(date).map_err(|e| {
                DomainError::InvalidForm(vec![BillValidationError::InvalidDate(e.to_string())])
            })?,
            None => today,
        };
        let magnitude = validation
            .cleaned_amount
            .ok_or(DomainError::InvalidForm(vec![BillValidationError::EmptyAmount]))?;

        Ok(BillDraft {
            date,
            description: form.description.trim().to_string(),
            category: BillMapper::to_domain_category(form.category),
            magnitude,
        })
    }

    /// Parse the amount text. `,` is read as the decimal point.
    pub fn parse_amount(&self, amount_input: &str) -> Result<Decimal, BillValidationError> {
        let trimmed = amount_input.trim();
        if trimmed.is_empty() {
            return Err(BillValidationError::EmptyAmount);
        }
        if !AMOUNT_PATTERN.is_match(trimmed) {
            return Err(BillValidationError::InvalidAmountFormat(trimmed.to_string()));
        }

        let mut cleaned = trimmed.replace(',', ".");
        if cleaned.ends_with('.') {
            cleaned.pop();
        }
        if cleaned.starts_with('.') {
            cleaned.insert(0, '0');
        }
        if cleaned.is_empty() {
            return Err(BillValidationError::InvalidAmountFormat(trimmed.to_string()));
        }

        let amount = Decimal::from_str(&cleaned)
            .map_err(|e| BillValidationError::InvalidAmountFormat(format!("{}: {}", trimmed, e)))?;
        if amount.is_zero() {
            return Err(BillValidationError::AmountIsZero);
        }
        if amount > self.config.max_amount {
            return Err(BillValidationError::AmountTooLarge(self.config.max_amount));
        }
        Ok(amount)
    }

    pub fn error_message(&self, error: &BillValidationError) -> String {
        match error {
            BillValidationError::EmptyAmount => "Please enter an amount".to_string(),
            BillValidationError::InvalidAmountFormat(input) => {
                format!("Please enter a valid amount (like 5 or 5,00): {}", input)
            }
            BillValidationError::AmountIsZero => "Amount must not be zero".to_string(),
            BillValidationError::AmountTooLarge(max) => format!("Maximum amount is {}", max),
            BillValidationError::EmptyDescription => "Please enter a description".to_string(),
            BillValidationError::DescriptionTooLong(len) => format!(
                "Description is too long ({} characters). Maximum is {}.",
                len, self.config.max_description_length
            ),
            BillValidationError::InvalidDate(msg) => msg.clone(),
        }
    }
}
