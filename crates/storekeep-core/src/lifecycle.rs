//! Store lifecycle coordination
//!
//! `Lifecycle` initializes the product store once per process and
//! broadcasts the outcome to every observer through a `watch` channel.
//!
//! States move `Uninitialized → Initializing → Ready`, or end in `Failed`.
//! A failure is final for the life of the coordinator; nothing retries it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::storage::{StoreError, StoreResult};
use crate::store::ProductStore;

/// Initialization state of the product store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InitState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    /// Initialization failed with this message
    Failed(String),
}

/// Snapshot published to observers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readiness {
    pub state: InitState,
}

impl Readiness {
    /// True once the store can be used
    pub fn is_ready(&self) -> bool {
        self.state == InitState::Ready
    }

    /// Human-readable failure message, if initialization failed
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            InitState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// True when initialization has finished, either way
    pub fn is_settled(&self) -> bool {
        matches!(self.state, InitState::Ready | InitState::Failed(_))
    }
}

/// Runs store initialization once and gates access until it succeeds
pub struct Lifecycle {
    store: Arc<ProductStore>,
    readiness: watch::Sender<Readiness>,
}

impl Lifecycle {
    pub fn new(store: Arc<ProductStore>) -> Self {
        let (readiness, _) = watch::channel(Readiness::default());
        Self { store, readiness }
    }

    /// Initialize the store
    ///
    /// Only the first call does any work. Later or concurrent calls wait
    /// for that attempt to settle and return its outcome. If the first call
    /// is dropped before it finishes, the attempt settles as `Failed`.
    pub async fn start(&self) -> Readiness {
        let claimed = self.readiness.send_if_modified(|current| {
            if current.state == InitState::Uninitialized {
                current.state = InitState::Initializing;
                true
            } else {
                false
            }
        });

        if !claimed {
            return self.wait_until_settled().await;
        }

        let pending = PendingStart::new(&self.readiness);
        info!(location = %self.store.location(), "Initializing product store");
        let store = Arc::clone(&self.store);
        let state = match tokio::task::spawn_blocking(move || store.initialize()).await {
            Ok(Ok(())) => InitState::Ready,
            Ok(Err(e)) => InitState::Failed(e.to_string()),
            Err(e) => InitState::Failed(format!("Initialization task failed: {}", e)),
        };

        match &state {
            InitState::Ready => info!("Product store ready"),
            InitState::Failed(message) => warn!(error = %message, "Product store unavailable"),
            _ => {}
        }

        pending.settle(state)
    }

    /// Current readiness snapshot
    pub fn readiness(&self) -> Readiness {
        self.readiness.borrow().clone()
    }

    /// Subscribe to readiness changes
    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.readiness.subscribe()
    }

    /// Wait until initialization is `Ready` or `Failed`
    ///
    /// Does not return while the state is `Uninitialized` and nobody calls
    /// `start`.
    pub async fn wait_until_settled(&self) -> Readiness {
        let mut receiver = self.readiness.subscribe();
        let settled = receiver
            .wait_for(Readiness::is_settled)
            .await
            .map(|readiness| (*readiness).clone());
        settled.unwrap_or_else(|_| self.readiness())
    }

    /// Get the store once it is ready
    pub fn store(&self) -> StoreResult<&ProductStore> {
        match self.readiness().state {
            InitState::Ready => Ok(&self.store),
            InitState::Failed(message) => Err(StoreError::unavailable(
                self.store.location().to_string(),
                message,
            )),
            InitState::Uninitialized | InitState::Initializing => {
                Err(StoreError::NotInitialized {
                    operation: "access the product store",
                })
            }
        }
    }
}

/// Holds a claimed `Initializing` state until the attempt settles
struct PendingStart<'a> {
    readiness: &'a watch::Sender<Readiness>,
    settled: bool,
}

impl<'a> PendingStart<'a> {
    fn new(readiness: &'a watch::Sender<Readiness>) -> Self {
        Self {
            readiness,
            settled: false,
        }
    }

    fn settle(mut self, state: InitState) -> Readiness {
        self.settled = true;
        let readiness = Readiness { state };
        self.readiness.send_replace(readiness.clone());
        readiness
    }
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Product store initialization was cancelled");
            self.readiness.send_replace(Readiness {
                state: InitState::Failed("Initialization was cancelled".to_string()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_start_reaches_ready() {
        let lifecycle = Lifecycle::new(Arc::new(ProductStore::in_memory()));
        assert_eq!(lifecycle.readiness().state, InitState::Uninitialized);

        let readiness = lifecycle.start().await;

        assert!(readiness.is_ready());
        assert!(readiness.error().is_none());
        assert!(lifecycle.store().is_ok());
    }

    #[tokio::test]
    async fn test_store_gated_before_start() {
        let lifecycle = Lifecycle::new(Arc::new(ProductStore::in_memory()));
        assert!(matches!(
            lifecycle.store(),
            Err(StoreError::NotInitialized { .. })
        ));
    }

    #[tokio::test]
    async fn test_second_start_does_not_reinitialize() {
        let lifecycle = Lifecycle::new(Arc::new(ProductStore::in_memory()));
        lifecycle.start().await;

        let id = lifecycle
            .store()
            .unwrap()
            .create(&NewProduct::new("Widget", 1, 1.0))
            .unwrap();

        let readiness = lifecycle.start().await;
        assert!(readiness.is_ready());
        assert!(lifecycle.store().unwrap().get_by_id(id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_subscribers_see_ready() {
        let lifecycle = Lifecycle::new(Arc::new(ProductStore::in_memory()));
        let mut receiver = lifecycle.subscribe();
        assert!(!receiver.borrow().is_ready());

        lifecycle.start().await;

        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().is_ready());
    }

    #[tokio::test]
    async fn test_concurrent_starts_settle_together() {
        let lifecycle = Lifecycle::new(Arc::new(ProductStore::in_memory()));

        let (first, second) = tokio::join!(lifecycle.start(), lifecycle.start());

        assert!(first.is_ready());
        assert!(second.is_ready());
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "file, not directory").unwrap();

        let lifecycle = Lifecycle::new(Arc::new(ProductStore::open(blocker.join("db.sqlite"))));
        let readiness = lifecycle.start().await;

        assert!(!readiness.is_ready());
        assert!(readiness
            .error()
            .is_some_and(|msg| msg.contains("Storage unavailable")));
        assert!(matches!(
            lifecycle.store(),
            Err(StoreError::StorageUnavailable { .. })
        ));

        // The blocker goes away, but nothing retries
        std::fs::remove_file(&blocker).unwrap();
        let again = lifecycle.start().await;
        assert!(again.error().is_some());
        assert!(lifecycle.store().is_err());
    }

    #[tokio::test]
    async fn test_wait_until_settled_after_start() {
        let lifecycle = Lifecycle::new(Arc::new(ProductStore::in_memory()));
        lifecycle.start().await;
        assert!(lifecycle.wait_until_settled().await.is_settled());
    }

    #[test]
    fn test_unsettled_claim_fails_on_drop() {
        let lifecycle = Lifecycle::new(Arc::new(ProductStore::in_memory()));
        lifecycle.readiness.send_replace(Readiness {
            state: InitState::Initializing,
        });

        drop(PendingStart::new(&lifecycle.readiness));

        let readiness = lifecycle.readiness();
        assert_eq!(readiness.error(), Some("Initialization was cancelled"));
        assert!(matches!(
            lifecycle.store(),
            Err(StoreError::StorageUnavailable { .. })
        ));
    }

    #[test]
    fn test_settled_claim_keeps_outcome_on_drop() {
        let lifecycle = Lifecycle::new(Arc::new(ProductStore::in_memory()));

        let readiness = PendingStart::new(&lifecycle.readiness).settle(InitState::Ready);

        assert!(readiness.is_ready());
        assert!(lifecycle.readiness().is_ready());
    }

    #[tokio::test]
    async fn test_cancelled_start_does_not_block_later_starts() {
        let lifecycle = Lifecycle::new(Arc::new(ProductStore::in_memory()));
        let _ = tokio::time::timeout(Duration::ZERO, lifecycle.start()).await;

        // Whether or not the first attempt finished, the next call settles
        let readiness = tokio::time::timeout(Duration::from_secs(5), lifecycle.start())
            .await
            .expect("start should settle after a cancelled attempt");
        assert!(readiness.is_settled());
        assert_eq!(readiness, lifecycle.readiness());
    }
}
