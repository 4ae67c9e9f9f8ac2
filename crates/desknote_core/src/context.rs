//! Explicit runtime context shared by controllers of one process.
//!
//! # Responsibility
//! - Carry the store handle, the bus, the style session registry, the
//!   change feed and the loaded config to every component that needs them.
//!
//! # Invariants
//! - Clones share the same store, bus, registry and feed origin.
//! - Every event published through `publish` is also recorded in the
//!   durable change log.
//! - Opening a context prunes change log entries past the configured
//!   retention; failure to prune is logged and does not block startup.

use crate::config::AppConfig;
use crate::repo::note_store::{ChangeLog, NoteStore, SqliteNoteStore, StoreResult};
use crate::service::style_session::SessionRegistry;
use crate::sync::{ChangeFeed, NoteEvent, SyncBus};
use log::{info, warn};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Clone)]
pub struct NoteContext {
    store: Arc<dyn NoteStore>,
    bus: SyncBus,
    sessions: SessionRegistry,
    feed: Arc<ChangeFeed>,
    config: Arc<AppConfig>,
}

impl NoteContext {
    pub fn new(store: Arc<dyn NoteStore>, config: AppConfig) -> StoreResult<Self> {
        prune_change_log(&*store, config.change_retention_days);
        let feed = ChangeFeed::new(&*store)?;
        info!(
            "event=context_init module=context status=ok origin={}",
            feed.origin()
        );
        Ok(Self {
            store,
            bus: SyncBus::new(),
            sessions: SessionRegistry::new(),
            feed: Arc::new(feed),
            config: Arc::new(config),
        })
    }

    /// Opens the SQLite store at `config.db_path`.
    pub fn open(config: AppConfig) -> StoreResult<Self> {
        let store = SqliteNoteStore::open(&config.db_path)?;
        Self::new(Arc::new(store), config)
    }

    /// In-memory store with default config.
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = SqliteNoteStore::open_in_memory()?;
        Self::new(Arc::new(store), AppConfig::default())
    }

    pub fn store(&self) -> &dyn NoteStore {
        &*self.store
    }

    pub fn bus(&self) -> &SyncBus {
        &self.bus
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Origin id tagging this context's entries in the change log.
    pub fn origin(&self) -> &str {
        self.feed.origin()
    }

    /// Records `event` in the change log and fans it out on the local bus.
    ///
    /// Returns the number of local subscribers it was queued for.
    pub fn publish(&self, event: NoteEvent) -> usize {
        self.feed.record(&*self.store, &event);
        self.bus.publish(event)
    }

    /// Relays events other processes recorded since the last poll.
    pub fn poll_external_changes(&self) -> StoreResult<Vec<NoteEvent>> {
        self.feed.poll(&*self.store, &self.bus)
    }
}

fn prune_change_log(store: &dyn NoteStore, retention_days: u32) {
    if retention_days == 0 {
        return;
    }
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
    let cutoff_ms = now_ms.saturating_sub(i64::from(retention_days).saturating_mul(DAY_MS));
    match store.prune_changes(cutoff_ms) {
        Ok(0) => {}
        Ok(removed) => {
            info!("event=change_prune module=context status=ok removed={removed} retention_days={retention_days}");
        }
        Err(err) => {
            warn!("event=change_prune module=context status=error error={err}");
        }
    }
}
