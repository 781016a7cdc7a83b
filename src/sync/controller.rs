//! Sync Controller
//!
//! Bridges the Remote Item Service to the item cache: every operation
//! dispatches its lifecycle actions into the store, and the controller owns
//! the single push-channel subscription tied to the current credential.
//!
//! Collaborators are injected explicitly: the session owner constructs the
//! store and the controller once and hands out `Arc`s, there is no ambient
//! lookup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::store::{Action, ItemStore};
use crate::client::{ItemService, PushHandle};
use crate::protocol::{ChangeEvent, ChangeType, Item, RequestError};

/// Capability flags for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Open the push channel and merge incoming change events into the
    /// cache. Off means no connection is opened at all.
    pub live_updates: bool,
    /// Capacity of the event channel between the push reader and the
    /// forwarder task.
    pub push_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            live_updates: true,
            push_buffer: 64,
        }
    }
}

struct PushSubscription {
    handle: PushHandle,
    forwarder: JoinHandle<()>,
}

pub struct SyncController {
    service: Arc<dyn ItemService>,
    store: Arc<ItemStore>,
    config: SessionConfig,
    credential: RwLock<Option<String>>,
    /// Bumped on credential change and shutdown; a fetch started under a
    /// stale epoch discards its result without dispatching.
    epoch: AtomicU64,
    push: Mutex<Option<PushSubscription>>,
    last_loaded_at: RwLock<Option<DateTime<Utc>>>,
}

impl SyncController {
    pub fn new(service: Arc<dyn ItemService>, store: Arc<ItemStore>, config: SessionConfig) -> Self {
        Self {
            service,
            store,
            config,
            credential: RwLock::new(None),
            epoch: AtomicU64::new(0),
            push: Mutex::new(None),
            last_loaded_at: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &Arc<ItemStore> {
        &self.store
    }

    /// When the last successful fetch resolved.
    pub fn last_loaded_at(&self) -> Option<DateTime<Utc>> {
        *self.last_loaded_at.read()
    }

    fn valid_credential(&self) -> Option<String> {
        self.credential
            .read()
            .as_ref()
            .filter(|t| !t.trim().is_empty())
            .cloned()
    }

    /// Install or clear the session credential.
    ///
    /// Any open push subscription is closed and in-flight fetches are
    /// invalidated. With a new valid credential, exactly one fresh push
    /// subscription is opened (when `live_updates` is on) and the item list
    /// is refetched.
    pub async fn set_credential(&self, credential: Option<String>) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.close_push().await;
        *self.credential.write() = credential;

        if self.valid_credential().is_some() {
            if self.config.live_updates {
                self.open_push().await;
            }
            self.load().await;
        }
    }

    /// Fetch the full item list into the cache.
    ///
    /// Without a valid credential this is a deliberate no-op, not an error.
    /// A credential change or shutdown while the request is in flight
    /// discards the result: neither success nor failure is dispatched.
    pub async fn load(&self) {
        let Some(credential) = self.valid_credential() else {
            debug!("load skipped: no credential");
            return;
        };
        let epoch = self.epoch.load(Ordering::Acquire);

        debug!("load started");
        self.store.dispatch(Action::FetchStarted);
        let result = self.service.list_items(&credential).await;

        if self.epoch.load(Ordering::Acquire) != epoch {
            debug!("load result discarded: session changed");
            return;
        }
        match result {
            Ok(items) => {
                debug!(count = items.len(), "load succeeded");
                *self.last_loaded_at.write() = Some(Utc::now());
                self.store.dispatch(Action::FetchSucceeded(items));
            }
            Err(error) => {
                warn!(%error, "load failed");
                self.store.dispatch(Action::FetchFailed(error));
            }
        }
    }

    /// Create or update `item`: create when it has no id, update otherwise.
    ///
    /// Resolves only after the outcome has been dispatched, so a caller can
    /// sequence navigation on completion. Errors land in `saving_error`,
    /// never in a return value, and there is no automatic retry.
    pub async fn save(&self, item: Item) {
        let Some(credential) = self.valid_credential() else {
            self.store.dispatch(Action::SaveFailed(RequestError::Unauthorized(
                "no session credential".to_string(),
            )));
            return;
        };

        debug!(persisted = item.is_persisted(), "save started");
        self.store.dispatch(Action::SaveStarted);
        let result = if item.id.is_none() {
            self.service.create_item(&credential, &item).await
        } else {
            self.service.update_item(&credential, &item).await
        };

        match result {
            Ok(saved) => {
                debug!(id = ?saved.id, "save succeeded");
                self.store.dispatch(Action::SaveSucceeded(saved));
            }
            Err(error) => {
                warn!(%error, "save failed");
                self.store.dispatch(Action::SaveFailed(error));
            }
        }
    }

    /// Delete `item` from the service and the cache.
    ///
    /// The service echoes nothing on delete; the original item identifies
    /// the cache entry to drop.
    pub async fn remove(&self, item: Item) {
        let Some(credential) = self.valid_credential() else {
            self.store.dispatch(Action::DeleteFailed(RequestError::Unauthorized(
                "no session credential".to_string(),
            )));
            return;
        };

        debug!("delete started");
        self.store.dispatch(Action::DeleteStarted);
        let Some(id) = item.id.clone() else {
            self.store.dispatch(Action::DeleteFailed(RequestError::Protocol(
                "cannot delete an unsaved item".to_string(),
            )));
            return;
        };

        match self.service.delete_item(&credential, &id).await {
            Ok(()) => {
                debug!(%id, "delete succeeded");
                self.store.dispatch(Action::DeleteSucceeded(item));
            }
            Err(error) => {
                warn!(%error, "delete failed");
                self.store.dispatch(Action::DeleteFailed(error));
            }
        }
    }

    /// Tear down the session: invalidate in-flight fetches, close the push
    /// channel, retire the store.
    pub async fn shutdown(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.close_push().await;
        self.store.retire();
        debug!("controller shut down");
    }

    async fn open_push(&self) {
        let Some(credential) = self.valid_credential() else {
            return;
        };

        let (tx, mut rx) = mpsc::channel(self.config.push_buffer);
        match self.service.open_push_channel(&credential, tx).await {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                let forwarder = tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        apply_remote_event(&store, event);
                    }
                });
                *self.push.lock().await = Some(PushSubscription { handle, forwarder });
                debug!("push subscription opened");
            }
            // the session still works without live updates
            Err(error) => warn!(%error, "push channel open failed"),
        }
    }

    async fn close_push(&self) {
        if let Some(subscription) = self.push.lock().await.take() {
            subscription.handle.close().await;
            let _ = subscription.forwarder.await;
            debug!("push subscription closed");
        }
    }
}

fn apply_remote_event(store: &ItemStore, event: ChangeEvent) {
    match event.type_ {
        ChangeType::Insert | ChangeType::Update => match event.item {
            Some(item) => {
                store.dispatch(Action::RemoteUpserted(item));
            }
            None => warn!(id = %event.id, "change event without payload"),
        },
        ChangeType::Delete => {
            store.dispatch(Action::RemoteDeleted(event.id));
        }
    }
}
