use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::bill_repository::CsvBillRepository;
use super::profile_repository::CsvProfileRepository;
use crate::storage::traits::Connection;

const BILLS_FILE_NAME: &str = "bills.csv";
const PROFILE_FILE_NAME: &str = "profile.yaml";
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// CsvConnection manages the data directory layout and per-user change feeds
///
/// ```text
/// <base>/
/// └── <user_id>/
///     ├── bills.csv
///     └── profile.yaml
/// ```
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    /// Serializes read-modify-write cycles on collection files
    write_lock: Arc<tokio::sync::Mutex<()>>,
    change_feeds: Arc<Mutex<HashMap<String, broadcast::Sender<()>>>>,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create data directory {}", base_path.display())
            })?;
        }
        info!("Using data directory {}", base_path.display());

        Ok(Self {
            base_directory: base_path,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            change_feeds: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Default data directory: ~/Documents/Finance Tracker
    pub fn default_data_directory() -> Result<PathBuf> {
        let documents_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow!("Could not determine home directory"))?;
        Ok(documents_dir.join("Finance Tracker"))
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Get the directory holding a user's data
    ///
    /// User ids come from the identity provider; anything that could escape
    /// the base directory is refused.
    pub fn get_user_directory(&self, user_id: &str) -> Result<PathBuf> {
        let is_safe = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !is_safe {
            return Err(anyhow!("Invalid user id '{}'", user_id));
        }
        Ok(self.base_directory.join(user_id))
    }

    pub fn get_bills_file_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.get_user_directory(user_id)?.join(BILLS_FILE_NAME))
    }

    pub fn get_profile_file_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.get_user_directory(user_id)?.join(PROFILE_FILE_NAME))
    }

    /// Create the user's directory if it does not exist yet
    pub fn ensure_user_directory_exists(&self, user_id: &str) -> Result<PathBuf> {
        let user_dir = self.get_user_directory(user_id)?;
        if !user_dir.exists() {
            fs::create_dir_all(&user_dir)
                .with_context(|| format!("Failed to create {}", user_dir.display()))?;
            debug!("Created user directory {}", user_dir.display());
        }
        Ok(user_dir)
    }

    pub(crate) async fn lock_writes(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Subscribe to change notifications for a user's bill collection
    pub fn subscribe_to_changes(&self, user_id: &str) -> broadcast::Receiver<()> {
        self.change_feed(user_id).subscribe()
    }

    /// Tell every live query on this user's collection to reload
    pub fn notify_bills_changed(&self, user_id: &str) {
        let mut feeds = self.lock_feeds();
        let Some(feed) = feeds.get(user_id) else {
            debug!("Bills changed for user {}, no subscribers", user_id);
            return;
        };
        match feed.send(()) {
            Ok(receivers) => {
                debug!("Bills changed for user {}, notified {} subscriber(s)", user_id, receivers)
            }
            Err(_) => {
                feeds.remove(user_id);
                debug!("Dropped idle change feed for user {}", user_id);
            }
        }
    }

    fn change_feed(&self, user_id: &str) -> broadcast::Sender<()> {
        let mut feeds = self.lock_feeds();
        // Feeds whose live queries have all ended are dead weight
        feeds.retain(|owner, feed| owner == user_id || feed.receiver_count() > 0);
        feeds
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0)
            .clone()
    }

    fn lock_feeds(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<()>>> {
        self.change_feeds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn change_feed_count(&self) -> usize {
        self.lock_feeds().len()
    }
}

impl Connection for CsvConnection {
    type BillRepository = CsvBillRepository;
    type ProfileRepository = CsvProfileRepository;

    fn create_bill_repository(&self) -> Self::BillRepository {
        CsvBillRepository::new(self.clone())
    }

    fn create_profile_repository(&self) -> Self::ProfileRepository {
        CsvProfileRepository::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;

    #[tokio::test]
    async fn test_user_directory_layout() {
        let env = TestEnvironment::new().await.unwrap();
        let conn = &env.connection;

        let bills = conn.get_bills_file_path("user-123").unwrap();
        assert_eq!(bills, env.base_directory().join("user-123").join("bills.csv"));

        let profile = conn.get_profile_file_path("user-123").unwrap();
        assert_eq!(profile, env.base_directory().join("user-123").join("profile.yaml"));
    }

    #[tokio::test]
    async fn test_rejects_unsafe_user_ids() {
        let env = TestEnvironment::new().await.unwrap();
        for bad in ["", "..", "../other", "a/b", "a b"] {
            assert!(env.connection.get_user_directory(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[tokio::test]
    async fn test_ensure_user_directory_exists() {
        let env = TestEnvironment::new().await.unwrap();
        let dir = env.connection.ensure_user_directory_exists("user-1").unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_change_notifications_are_per_user() {
        let env = TestEnvironment::new().await.unwrap();
        let mut alice = env.connection.subscribe_to_changes("alice");
        let mut bob = env.connection.subscribe_to_changes("bob");

        env.connection.notify_bills_changed("alice");

        assert!(alice.try_recv().is_ok());
        assert!(bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_idle_change_feeds_are_dropped() {
        let env = TestEnvironment::new().await.unwrap();
        let conn = &env.connection;

        let alice = conn.subscribe_to_changes("alice");
        let bob = conn.subscribe_to_changes("bob");
        assert_eq!(conn.change_feed_count(), 2);

        drop(alice);
        conn.notify_bills_changed("alice");
        assert_eq!(conn.change_feed_count(), 1);

        drop(bob);
        let _carol = conn.subscribe_to_changes("carol");
        assert_eq!(conn.change_feed_count(), 1);
    }

    #[tokio::test]
    async fn test_notify_without_subscribers_creates_no_feed() {
        let env = TestEnvironment::new().await.unwrap();
        env.connection.notify_bills_changed("nobody");
        assert_eq!(env.connection.change_feed_count(), 0);
    }
}
