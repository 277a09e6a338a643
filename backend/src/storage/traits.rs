//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.
//!
//! Bills live in a per-user collection. Besides plain reads and writes, a bill
//! store offers a live query: a subscription that yields the user's complete,
//! date-ordered collection once up front and again after every change.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::AuthError;
use crate::domain::models::bill::{Bill, BillRecord};
use crate::domain::models::user::{Credentials, Identity, UserProfile};

/// One delivery of a live bill query: the full ordered collection, or the
/// error that prevented loading it
pub type BillSnapshot = Result<Vec<Bill>>;

/// Receiving end of a live bill query.
///
/// Dropping the subscription stops the store from producing further snapshots.
pub struct BillSubscription {
    receiver: mpsc::Receiver<BillSnapshot>,
}

impl BillSubscription {
    pub fn new(receiver: mpsc::Receiver<BillSnapshot>) -> Self {
        Self { receiver }
    }

    /// Wait for the next snapshot. `None` once the store stops publishing.
    pub async fn next_snapshot(&mut self) -> Option<BillSnapshot> {
        self.receiver.recv().await
    }
}

/// Trait defining the interface for bill storage operations
///
/// Every operation is scoped to one user's collection; a bill id is only
/// meaningful together with the user id it was filed under.
#[async_trait]
pub trait BillStore: Send + Sync + 'static {
    /// Store a new bill and return it with its assigned id
    async fn create_bill(&self, user_id: &str, record: &BillRecord) -> Result<Bill>;

    /// Replace an existing bill in full
    /// Returns false if the user has no bill with this id
    async fn replace_bill(&self, user_id: &str, bill_id: &str, record: &BillRecord) -> Result<bool>;

    /// Delete a single bill
    /// Returns true if the bill was found and deleted, false otherwise
    async fn delete_bill(&self, user_id: &str, bill_id: &str) -> Result<bool>;

    /// Retrieve a specific bill by ID
    async fn get_bill(&self, user_id: &str, bill_id: &str) -> Result<Option<Bill>>;

    /// List the user's bills ordered by date ascending
    /// Same-day bills are ordered by creation time, then by id
    async fn list_bills_by_date(&self, user_id: &str) -> Result<Vec<Bill>>;

    /// Start a live query over the user's bills
    fn subscribe(&self, user_id: &str) -> BillSubscription;
}

/// Trait defining the interface for user profile storage operations
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Store (or overwrite) a user's profile
    async fn store_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Retrieve a user's profile
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;
}

/// Trait defining the interface for the authentication provider
///
/// Sessions are identified by an opaque token handed out on sign-in and sign-up.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> std::result::Result<Identity, AuthError>;

    async fn sign_up(&self, credentials: &Credentials) -> std::result::Result<Identity, AuthError>;

    async fn sign_out(&self, session_token: &str) -> std::result::Result<(), AuthError>;

    /// The identity behind a session token, if the session is still open
    async fn current_identity(&self, session_token: &str) -> Option<Identity>;
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type and provides factory
/// methods for creating repositories, so services can be built against any
/// storage backend.
pub trait Connection: Send + Sync + Clone {
    /// The type of BillStore this connection creates
    type BillRepository: BillStore + Clone;

    /// The type of ProfileStore this connection creates
    type ProfileRepository: ProfileStore + Clone + 'static;

    fn create_bill_repository(&self) -> Self::BillRepository;

    fn create_profile_repository(&self) -> Self::ProfileRepository;
}
