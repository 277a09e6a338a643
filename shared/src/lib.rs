use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used for every bill date that crosses the API boundary
pub const BILL_DATE_FORMAT: &str = "%d/%m/%Y";

/// A single dated money movement owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    /// Calendar date in `dd/mm/yyyy` form
    pub date: String,
    pub description: String,
    pub category: BillCategory,
    /// Signed amount: negative for expenses, positive for income
    pub value: Decimal,
}

/// Direction of a bill's cash flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillCategory {
    Expense,
    Income,
}

impl fmt::Display for BillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillCategory::Expense => write!(f, "Expense"),
            BillCategory::Income => write!(f, "Income"),
        }
    }
}

/// A bill annotated with the balance after applying it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub bill_id: String,
    pub date: String,
    pub description: String,
    pub category: BillCategory,
    pub value: Decimal,
    pub running_balance: Decimal,
}

/// Latest ledger computed for the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerResponse {
    pub entries: Vec<LedgerEntry>,
    /// Final balance; zero for an empty ledger
    pub total: Decimal,
    /// Increases every time a new snapshot is applied
    pub version: u64,
    /// Set when the most recent snapshot could not be loaded; entries are then
    /// the last successfully computed ones
    pub last_error: Option<String>,
}

/// Bill form as submitted by a client.
///
/// `amount` is the raw text typed by the user; it is always a magnitude and the
/// stored sign is derived from `category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillFormRequest {
    /// `dd/mm/yyyy`; today when omitted
    pub date: Option<String>,
    pub description: String,
    pub category: BillCategory,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillMutationResponse {
    /// The stored bill; `None` after a delete
    pub bill: Option<Bill>,
    pub success_message: String,
}

/// Validation result for bill form input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillFormValidation {
    pub is_valid: bool,
    pub errors: Vec<BillValidationError>,
    pub messages: Vec<String>,
    pub cleaned_amount: Option<Decimal>,
}

/// Specific bill form validation errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BillValidationError {
    EmptyAmount,
    InvalidAmountFormat(String),
    AmountIsZero,
    /// Carries the configured maximum
    AmountTooLarge(Decimal),
    EmptyDescription,
    DescriptionTooLong(usize),
    InvalidDate(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: String,
    pub email: String,
    /// Bearer token for the `Authorization` header
    pub session_token: String,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user_id: String,
    pub email: String,
    /// Display name from the stored profile, if one was found
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Vec<String>,
}
