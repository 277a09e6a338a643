//! # Ledger Service
//!
//! Keeps a live, running-balance view of each signed-in user's bills.
//!
//! ## Key Responsibilities
//!
//! - **Live query**: one background task per watched user consumes the bill
//!   store's subscription
//! - **Recompute**: every snapshot is run through [`accumulate`] from scratch;
//!   no entry from a previous snapshot is patched or reused
//! - **Publish**: the newest view replaces the previous one on a
//!   `tokio::sync::watch` channel, so readers only ever see the latest result
//! - **Failure handling**: a failed snapshot keeps the last good entries and
//!   records the error until the next good snapshot arrives

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ledger::{accumulate, Ledger};
use crate::storage::traits::BillStore;

pub const DEFAULT_FIRST_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

/// The ledger as last published for one user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerView {
    pub ledger: Ledger,
    /// Number of snapshots processed so far; 0 until the first one arrives
    pub version: u64,
    /// Set when the latest snapshot failed to load
    pub last_error: Option<String>,
}

impl LedgerView {
    pub fn is_loaded(&self) -> bool {
        self.version > 0
    }
}

struct UserWatch {
    receiver: watch::Receiver<LedgerView>,
    task: JoinHandle<()>,
}

pub struct LedgerService<S: BillStore> {
    bill_repository: S,
    watches: Mutex<HashMap<String, UserWatch>>,
    first_snapshot_timeout: Duration,
}

impl<S: BillStore> LedgerService<S> {
    pub fn new(bill_repository: S) -> Self {
        Self::with_timeout(bill_repository, DEFAULT_FIRST_SNAPSHOT_TIMEOUT)
    }

    pub fn with_timeout(bill_repository: S, first_snapshot_timeout: Duration) -> Self {
        Self {
            bill_repository,
            watches: Mutex::new(HashMap::new()),
            first_snapshot_timeout,
        }
    }

    /// Start watching a user's bills, or join the watch already running
    pub fn watch(&self, user_id: &str) -> watch::Receiver<LedgerView> {
        let mut watches = self.watches.lock().unwrap_or_else(PoisonError::into_inner);
        watches.retain(|_, w| !w.task.is_finished());

        if let Some(existing) = watches.get(user_id) {
            if !existing.task.is_finished() {
                return existing.receiver.clone();
            }
        }

        let (sender, receiver) = watch::channel(LedgerView::default());
        let mut subscription = self.bill_repository.subscribe(user_id);
        let owner = user_id.to_string();

        let task = tokio::spawn(async move {
            while let Some(snapshot) = subscription.next_snapshot().await {
                sender.send_modify(|view| {
                    view.version += 1;
                    let ledger = snapshot
                        .map_err(|e| format!("Failed to load bills: {:#}", e))
                        .and_then(|bills| accumulate(&bills).map_err(|e| e.to_string()));
                    match ledger {
                        Ok(ledger) => {
                            view.ledger = ledger;
                            view.last_error = None;
                            debug!(
                                "Ledger v{} for user {}: {} entries, total {}",
                                view.version,
                                owner,
                                view.ledger.len(),
                                view.ledger.total
                            );
                        }
                        Err(message) => {
                            warn!("Keeping previous ledger for user {}: {}", owner, message);
                            view.last_error = Some(message);
                        }
                    }
                });
            }
            debug!("Ledger watch for user {} ended", owner);
        });

        info!("Started ledger watch for user {}", user_id);
        watches.insert(
            user_id.to_string(),
            UserWatch {
                receiver: receiver.clone(),
                task,
            },
        );
        receiver
    }

    /// The latest ledger for a user, waiting for the first snapshot if needed
    pub async fn current(&self, user_id: &str) -> DomainResult<LedgerView> {
        let mut receiver = self.watch(user_id);
        let first_snapshot = tokio::time::timeout(
            self.first_snapshot_timeout,
            receiver.wait_for(LedgerView::is_loaded),
        )
        .await;
        let view = match first_snapshot {
            Ok(Ok(view)) => Ok(view.clone()),
            Ok(Err(_)) => Err(DomainError::LedgerUnavailable),
            Err(_) => {
                warn!("No ledger snapshot for user {} within {:?}", user_id, self.first_snapshot_timeout);
                Err(DomainError::LedgerUnavailable)
            }
        };
        view
    }

    /// Stop watching a user's bills
    pub fn release(&self, user_id: &str) {
        let removed = self
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id);
        if let Some(user_watch) = removed {
            user_watch.task.abort();
            info!("Released ledger watch for user {}", user_id);
        }
    }

    pub fn is_watching(&self, user_id: &str) -> bool {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .is_some_and(|w| !w.task.is_finished())
    }

    #[cfg(test)]
    fn watch_count(&self) -> usize {
        self.watches.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<S: BillStore> Drop for LedgerService<S> {
    fn drop(&mut self) {
        let watches = self.watches.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, user_watch) in watches.drain() {
            user_watch.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::bill::{Bill, BillCategory, BillRecord};
    use crate::storage::csv::test_utils::{record, TestEnvironment};
    use crate::storage::csv::CsvBillRepository;
    use crate::storage::traits::{BillSnapshot, BillSubscription};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    /// Store whose live query is fed by the test
    struct ScriptedStore {
        feed: Mutex<Option<mpsc::Receiver<BillSnapshot>>>,
        subscriptions: Arc<AtomicUsize>,
    }

    impl ScriptedStore {
        fn new() -> (Self, mpsc::Sender<BillSnapshot>, Arc<AtomicUsize>) {
            let (sender, receiver) = mpsc::channel(8);
            let subscriptions = Arc::new(AtomicUsize::new(0));
            let store = Self {
                feed: Mutex::new(Some(receiver)),
                subscriptions: subscriptions.clone(),
            };
            (store, sender, subscriptions)
        }
    }

    #[async_trait]
    impl BillStore for ScriptedStore {
        async fn create_bill(&self, _: &str, _: &BillRecord) -> Result<Bill> {
            unimplemented!()
        }
        async fn replace_bill(&self, _: &str, _: &str, _: &BillRecord) -> Result<bool> {
            unimplemented!()
        }
        async fn delete_bill(&self, _: &str, _: &str) -> Result<bool> {
            unimplemented!()
        }
        async fn get_bill(&self, _: &str, _: &str) -> Result<Option<Bill>> {
            unimplemented!()
        }
        async fn list_bills_by_date(&self, _: &str) -> Result<Vec<Bill>> {
            unimplemented!()
        }

        fn subscribe(&self, _: &str) -> BillSubscription {
            self.subscriptions.fetch_add(1, Ordering::SeqCst);
            let receiver = self.feed.lock().unwrap().take().unwrap_or_else(|| mpsc::channel(1).1);
            BillSubscription::new(receiver)
        }
    }

    fn bill(id: &str, day: u32, value: Decimal) -> Bill {
        let category = if value < Decimal::ZERO {
            BillCategory::Expense
        } else {
            BillCategory::Income
        };
        Bill {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            description: id.to_string(),
            category,
            value,
            created_at: Utc::now(),
        }
    }

    async fn wait_for_version(receiver: &mut watch::Receiver<LedgerView>, version: u64) -> LedgerView {
        timeout(Duration::from_secs(5), receiver.wait_for(|v| v.version >= version))
            .await
            .unwrap()
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_snapshot_is_accumulated() {
        let (store, feed, _) = ScriptedStore::new();
        let service = LedgerService::new(store);
        let mut receiver = service.watch("user-1");

        feed.send(Ok(vec![
            bill("salary", 1, dec!(1000)),
            bill("rent", 2, dec!(-400)),
            bill("coffee", 3, dec!(-5)),
        ]))
        .await
        .unwrap();

        let view = wait_for_version(&mut receiver, 1).await;
        let balances: Vec<_> = view.ledger.entries.iter().map(|e| e.running_balance).collect();
        assert_eq!(balances, vec![dec!(1000), dec!(600), dec!(595)]);
        assert_eq!(view.ledger.total, dec!(595));
        assert_eq!(view.last_error, None);
    }

    #[tokio::test]
    async fn test_failed_snapshot_keeps_previous_entries() {
        let (store, feed, _) = ScriptedStore::new();
        let service = LedgerService::new(store);
        let mut receiver = service.watch("user-1");

        feed.send(Ok(vec![bill("salary", 1, dec!(1000))])).await.unwrap();
        let first = wait_for_version(&mut receiver, 1).await;

        feed.send(Err(anyhow!("disk unplugged"))).await.unwrap();
        let failed = wait_for_version(&mut receiver, 2).await;
        assert_eq!(failed.ledger, first.ledger);
        assert!(failed.last_error.unwrap().contains("disk unplugged"));

        feed.send(Ok(vec![bill("salary", 1, dec!(1000)), bill("rent", 2, dec!(-400))]))
            .await
            .unwrap();
        let recovered = wait_for_version(&mut receiver, 3).await;
        assert_eq!(recovered.last_error, None);
        assert_eq!(recovered.ledger.total, dec!(600));
    }

    #[tokio::test]
    async fn test_balance_overflow_keeps_previous_entries() {
        let (store, feed, _) = ScriptedStore::new();
        let service = LedgerService::new(store);
        let mut receiver = service.watch("user-1");

        feed.send(Ok(vec![bill("salary", 1, dec!(1000))])).await.unwrap();
        let first = wait_for_version(&mut receiver, 1).await;

        feed.send(Ok(vec![bill("huge", 1, Decimal::MAX), bill("more", 2, Decimal::MAX)]))
            .await
            .unwrap();
        let overflowed = wait_for_version(&mut receiver, 2).await;
        assert_eq!(overflowed.ledger, first.ledger);
        assert!(overflowed.last_error.unwrap().contains("overflowed"));

        // The watch task survives and keeps serving
        assert!(service.is_watching("user-1"));
        let current = service.current("user-1").await.unwrap();
        assert_eq!(current.version, 2);
    }

    #[tokio::test]
    async fn test_each_snapshot_is_recomputed_from_scratch() {
        let (store, feed, _) = ScriptedStore::new();
        let service = LedgerService::new(store);
        let mut receiver = service.watch("user-1");

        feed.send(Ok(vec![bill("a", 1, dec!(10)), bill("b", 3, dec!(-3))])).await.unwrap();
        wait_for_version(&mut receiver, 1).await;

        // An earlier bill shifts every later balance
        feed.send(Ok(vec![
            bill("c", 1, dec!(5)),
            bill("a", 2, dec!(10)),
            bill("b", 3, dec!(-3)),
        ]))
        .await
        .unwrap();
        let view = wait_for_version(&mut receiver, 2).await;
        let balances: Vec<_> = view.ledger.entries.iter().map(|e| e.running_balance).collect();
        assert_eq!(balances, vec![dec!(5), dec!(15), dec!(12)]);
    }

    #[tokio::test]
    async fn test_watch_is_shared_per_user() {
        let (store, _feed, subscriptions) = ScriptedStore::new();
        let service = LedgerService::new(store);

        let _first = service.watch("user-1");
        let _second = service.watch("user-1");
        assert_eq!(subscriptions.load(Ordering::SeqCst), 1);
        assert!(service.is_watching("user-1"));
    }

    #[tokio::test]
    async fn test_ended_watches_are_pruned() {
        let (store, feed, _) = ScriptedStore::new();
        let service = LedgerService::new(store);

        service.watch("user-1");
        drop(feed);
        timeout(Duration::from_secs(5), async {
            while service.is_watching("user-1") {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(service.watch_count(), 1);

        service.watch("user-2");
        assert_eq!(service.watch_count(), 1);
    }

    #[tokio::test]
    async fn test_current_times_out_without_snapshot() {
        let (store, _feed, _) = ScriptedStore::new();
        let service = LedgerService::with_timeout(store, Duration::from_millis(50));

        let result = service.current("user-1").await;
        assert!(matches!(result, Err(DomainError::LedgerUnavailable)));
    }

    #[tokio::test]
    async fn test_release_stops_watch() {
        let (store, _feed, subscriptions) = ScriptedStore::new();
        let service = LedgerService::new(store);

        service.watch("user-1");
        service.release("user-1");
        assert!(!service.is_watching("user-1"));

        service.watch("user-1");
        assert_eq!(subscriptions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_current_follows_csv_store_writes() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = CsvBillRepository::new(env.connection.clone());
        let service = LedgerService::new(repo.clone());

        let initial = service.current("user-1").await.unwrap();
        assert!(initial.ledger.is_empty());

        repo.create_bill("user-1", &record("02/01/2024", "Rent", BillCategory::Expense, dec!(-400)))
            .await
            .unwrap();
        repo.create_bill("user-1", &record("01/01/2024", "Salary", BillCategory::Income, dec!(1000)))
            .await
            .unwrap();

        let mut receiver = service.watch("user-1");
        let view = timeout(Duration::from_secs(5), receiver.wait_for(|v| v.ledger.len() == 2))
            .await
            .unwrap()
            .unwrap()
            .clone();
        assert_eq!(view.ledger.entries[0].description, "Salary");
        assert_eq!(view.ledger.entries[1].running_balance, dec!(600));
    }
}
