use crate::config::RefreshConfig;
use crate::error::GitResult;
use crate::explorer::NodeRepository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Cheap per-repository snapshot used to detect stash changes
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn raw_listing(&self, repo_path: &Path) -> GitResult<Option<String>>;
}

#[async_trait]
impl ListingSource for NodeRepository {
    async fn raw_listing(&self, repo_path: &Path) -> GitResult<Option<String>> {
        self.get_raw_listing(repo_path).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Explicit user request; always re-renders
    Force,
    /// Filesystem signal for one repository; re-renders only on a listing change
    Passive(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    All,
    Repository(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    All,
    Repository(PathBuf),
}

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Debounces refresh triggers into render events
///
/// Each logical refresh owns one timer slot; a new trigger aborts and replaces the
/// pending timer instead of queueing another firing.
pub struct RefreshScheduler {
    shared: Arc<Shared>,
}

struct Shared {
    config: RefreshConfig,
    source: Arc<dyn ListingSource>,
    events: UnboundedSender<RefreshEvent>,
    pending: Mutex<HashMap<Slot, PendingTimer>>,
    last_seen: Mutex<HashMap<PathBuf, Option<String>>>,
    next_generation: AtomicU64,
}

impl RefreshScheduler {
    pub fn new(
        config: RefreshConfig,
        source: Arc<dyn ListingSource>,
    ) -> (Self, UnboundedReceiver<RefreshEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            config,
            source,
            events,
            pending: Mutex::new(HashMap::new()),
            last_seen: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        });
        (Self { shared }, receiver)
    }

    /// Schedule a refresh; must be called from within a tokio runtime
    pub fn trigger(&self, trigger: RefreshTrigger) {
        let (slot, delay) = match trigger {
            RefreshTrigger::Force => (
                Slot::All,
                Duration::from_millis(self.shared.config.force_debounce_ms),
            ),
            RefreshTrigger::Passive(path) => (
                Slot::Repository(path),
                Duration::from_millis(self.shared.config.passive_debounce_ms),
            ),
        };

        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::clone(&self.shared);
        let task_slot = slot.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire(&task_slot).await;
            shared.finish(&task_slot, generation);
        });

        let previous = self
            .shared
            .pending()
            .insert(slot, PendingTimer { generation, handle });
        if let Some(previous) = previous {
            debug!("Replacing pending refresh timer");
            previous.handle.abort();
        }
    }

    /// Record the listing that was last rendered for a repository
    pub fn prime(&self, repo_path: &Path, listing: Option<String>) {
        self.shared.last_seen().insert(repo_path.to_path_buf(), listing);
    }

    /// Drop state for a repository that is no longer shown
    pub fn forget(&self, repo_path: &Path) {
        self.shared.last_seen().remove(repo_path);
        if let Some(timer) = self
            .shared
            .pending()
            .remove(&Slot::Repository(repo_path.to_path_buf()))
        {
            timer.handle.abort();
        }
    }

    /// Last listing seen for a repository; `None` when never recorded
    pub fn last_seen(&self, repo_path: &Path) -> Option<Option<String>> {
        self.shared.last_seen().get(repo_path).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending().len()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        for (_, timer) in self.shared.pending().drain() {
            timer.handle.abort();
        }
    }
}

impl Shared {
    async fn fire(&self, slot: &Slot) {
        let event = match slot {
            Slot::All => Some(RefreshEvent::All),
            Slot::Repository(path) => match self.source.raw_listing(path).await {
                Ok(listing) => {
                    if self.record(path, listing) {
                        Some(RefreshEvent::Repository(path.clone()))
                    } else {
                        debug!("Stash listing unchanged for {}", path.display());
                        None
                    }
                }
                Err(e) => {
                    warn!("Refresh of {} failed: {}", path.display(), e);
                    None
                }
            },
        };

        if let Some(event) = event
            && self.events.send(event).is_err()
        {
            debug!("Refresh receiver dropped");
        }
    }

    /// Store `listing`; true when it differs from the previous value
    fn record(&self, path: &Path, listing: Option<String>) -> bool {
        let mut last_seen = self.last_seen();
        match last_seen.get(path) {
            Some(previous) if *previous == listing => false,
            _ => {
                last_seen.insert(path.to_path_buf(), listing);
                true
            }
        }
    }

    fn finish(&self, slot: &Slot, generation: u64) {
        let mut pending = self.pending();
        if pending.get(slot).is_some_and(|t| t.generation == generation) {
            pending.remove(slot);
        }
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<Slot, PendingTimer>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn last_seen(&self) -> MutexGuard<'_, HashMap<PathBuf, Option<String>>> {
        self.last_seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
