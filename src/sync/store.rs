//! Item Cache Store
//!
//! The authoritative in-memory list of items plus request-lifecycle flags
//! and the last error per operation class, driven by a pure reducer over
//! tagged actions. [`ItemStore`] wraps the state for shared access and
//! notifies observers through a watch channel on every applied dispatch.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::protocol::{Item, RequestError};

/// Cache state read by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct ItemsState {
    /// `None` until the first fetch resolves.
    pub items: Option<Vec<Item>>,
    pub fetching: bool,
    pub saving: bool,
    pub deleting: bool,
    pub fetching_error: Option<RequestError>,
    pub saving_error: Option<RequestError>,
    pub deleting_error: Option<RequestError>,
}

/// State transitions of the item cache.
///
/// Non-exhaustive so new action kinds can be introduced without breaking
/// downstream matches; transition logic that predates a variant treats it
/// as a no-op. The `Remote*` variants carry changes made elsewhere and
/// delivered over the push channel; they touch neither the in-flight flags
/// nor the error fields.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Action {
    FetchStarted,
    FetchSucceeded(Vec<Item>),
    FetchFailed(RequestError),
    SaveStarted,
    SaveSucceeded(Item),
    SaveFailed(RequestError),
    DeleteStarted,
    DeleteSucceeded(Item),
    DeleteFailed(RequestError),
    RemoteUpserted(Item),
    RemoteDeleted(String),
}

impl ItemsState {
    /// Pure transition function: consumes the current state, returns the
    /// next one. Starting an operation clears only that operation's own
    /// error field.
    pub fn apply(self, action: Action) -> ItemsState {
        match action {
            Action::FetchStarted => ItemsState {
                fetching: true,
                fetching_error: None,
                ..self
            },
            Action::FetchSucceeded(items) => ItemsState {
                items: Some(items),
                fetching: false,
                ..self
            },
            Action::FetchFailed(error) => ItemsState {
                fetching_error: Some(error),
                fetching: false,
                ..self
            },
            Action::SaveStarted => ItemsState {
                saving: true,
                saving_error: None,
                ..self
            },
            Action::SaveSucceeded(item) => ItemsState {
                items: Some(upsert(self.items, item)),
                saving: false,
                ..self
            },
            Action::SaveFailed(error) => ItemsState {
                saving_error: Some(error),
                saving: false,
                ..self
            },
            Action::DeleteStarted => ItemsState {
                deleting: true,
                deleting_error: None,
                ..self
            },
            Action::DeleteSucceeded(item) => ItemsState {
                items: Some(remove(self.items, item.id.as_deref())),
                deleting: false,
                ..self
            },
            Action::DeleteFailed(error) => ItemsState {
                deleting_error: Some(error),
                deleting: false,
                ..self
            },
            Action::RemoteUpserted(item) => ItemsState {
                items: Some(upsert(self.items, item)),
                ..self
            },
            Action::RemoteDeleted(id) => ItemsState {
                items: Some(remove(self.items, Some(&id))),
                ..self
            },
        }
    }
}

/// Replace the entry with a matching id in place, otherwise prepend.
/// Matching only on present ids keeps the no-duplicate-ids invariant.
fn upsert(items: Option<Vec<Item>>, item: Item) -> Vec<Item> {
    let mut items = items.unwrap_or_default();
    let position = item
        .id
        .as_ref()
        .and_then(|id| items.iter().position(|it| it.id.as_ref() == Some(id)));
    match position {
        Some(index) => items[index] = item,
        None => items.insert(0, item),
    }
    items
}

/// Remove every entry with the given id, preserving the order of the rest.
fn remove(items: Option<Vec<Item>>, id: Option<&str>) -> Vec<Item> {
    let mut items = items.unwrap_or_default();
    items.retain(|it| it.id.as_deref() != id);
    items
}

/// Shared, observable wrapper around [`ItemsState`].
///
/// Dispatch applies the reducer under a lock, so transitions never
/// interleave, and bumps a version watch channel so observers re-read. A
/// retired store suppresses every further dispatch; late completions from
/// operations that outlive the session land harmlessly.
pub struct ItemStore {
    state: RwLock<ItemsState>,
    live: AtomicBool,
    version: watch::Sender<u64>,
}

impl ItemStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            state: RwLock::new(ItemsState::default()),
            live: AtomicBool::new(true),
            version,
        }
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> ItemsState {
        self.state.read().clone()
    }

    /// Observe state versions; receivers wake on every applied dispatch.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Mark the store as torn down. Subsequent dispatches are no-ops.
    pub fn retire(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Apply `action` to the state; returns whether it was applied.
    pub fn dispatch(&self, action: Action) -> bool {
        if !self.is_live() {
            tracing::debug!(?action, "dispatch suppressed: store retired");
            return false;
        }
        {
            let mut state = self.state.write();
            let current = std::mem::take(&mut *state);
            *state = current.apply(action);
        }
        self.version.send_modify(|v| *v += 1);
        true
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(items: Vec<Item>) -> ItemsState {
        ItemsState {
            items: Some(items),
            ..ItemsState::default()
        }
    }

    #[test]
    fn test_fetch_lifecycle() {
        let state = ItemsState::default().apply(Action::FetchStarted);
        assert!(state.fetching);
        assert_eq!(state.fetching_error, None);

        let items = vec![Item::with_id("1", "A"), Item::with_id("2", "B")];
        let state = state.apply(Action::FetchSucceeded(items.clone()));
        assert!(!state.fetching);
        assert_eq!(state.items, Some(items));
    }

    #[test]
    fn test_fetch_failure_is_stored_not_thrown() {
        let state = ItemsState::default()
            .apply(Action::FetchStarted)
            .apply(Action::FetchFailed(RequestError::Connection(
                "timed out".to_string(),
            )));
        assert!(!state.fetching);
        assert_eq!(
            state.fetching_error,
            Some(RequestError::Connection("timed out".to_string()))
        );
        // a failed fetch leaves the cache untouched
        assert_eq!(state.items, None);
    }

    #[test]
    fn test_save_with_known_id_replaces_in_place() {
        let state = state_with(vec![
            Item::with_id("1", "A"),
            Item::with_id("2", "B"),
            Item::with_id("3", "C"),
        ])
        .apply(Action::SaveSucceeded(Item::with_id("2", "B2")));

        let items = state.items.unwrap();
        assert_eq!(
            items,
            vec![
                Item::with_id("1", "A"),
                Item::with_id("2", "B2"),
                Item::with_id("3", "C"),
            ]
        );
        assert!(!state.saving);
    }

    #[test]
    fn test_save_with_new_id_prepends() {
        let state = state_with(vec![Item::with_id("1", "A")])
            .apply(Action::SaveSucceeded(Item::with_id("2", "B")));
        assert_eq!(
            state.items.unwrap(),
            vec![Item::with_id("2", "B"), Item::with_id("1", "A")]
        );
    }

    #[test]
    fn test_save_into_unloaded_cache() {
        let state = ItemsState::default().apply(Action::SaveSucceeded(Item::with_id("7", "New")));
        assert_eq!(state.items.unwrap(), vec![Item::with_id("7", "New")]);
    }

    #[test]
    fn test_no_duplicate_ids_across_action_sequences() {
        let mut state = ItemsState::default();
        let actions = vec![
            Action::FetchSucceeded(vec![Item::with_id("1", "A"), Item::with_id("2", "B")]),
            Action::SaveSucceeded(Item::with_id("1", "A2")),
            Action::RemoteUpserted(Item::with_id("2", "B2")),
            Action::SaveSucceeded(Item::with_id("3", "C")),
            Action::RemoteUpserted(Item::with_id("3", "C2")),
        ];
        for action in actions {
            state = state.apply(action);
            let items = state.items.clone().unwrap_or_default();
            let mut ids: Vec<_> = items.iter().filter_map(|it| it.id.clone()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), items.len(), "duplicate id after an action");
        }
    }

    #[test]
    fn test_starting_an_operation_clears_only_its_own_error() {
        let err = |msg: &str| RequestError::Server(msg.to_string());
        let state = ItemsState {
            fetching_error: Some(err("fetch")),
            saving_error: Some(err("save")),
            deleting_error: Some(err("delete")),
            ..ItemsState::default()
        };

        let after_fetch = state.clone().apply(Action::FetchStarted);
        assert_eq!(after_fetch.fetching_error, None);
        assert_eq!(after_fetch.saving_error, Some(err("save")));
        assert_eq!(after_fetch.deleting_error, Some(err("delete")));

        let after_save = state.clone().apply(Action::SaveStarted);
        assert_eq!(after_save.saving_error, None);
        assert_eq!(after_save.fetching_error, Some(err("fetch")));
        assert_eq!(after_save.deleting_error, Some(err("delete")));

        let after_delete = state.apply(Action::DeleteStarted);
        assert_eq!(after_delete.deleting_error, None);
        assert_eq!(after_delete.fetching_error, Some(err("fetch")));
        assert_eq!(after_delete.saving_error, Some(err("save")));
    }

    #[test]
    fn test_delete_removes_all_matches_and_preserves_order() {
        let state = state_with(vec![
            Item::with_id("1", "A"),
            Item::with_id("2", "B"),
            Item::with_id("3", "C"),
        ])
        .apply(Action::DeleteSucceeded(Item::with_id("2", "B")));

        assert_eq!(
            state.items.unwrap(),
            vec![Item::with_id("1", "A"), Item::with_id("3", "C")]
        );
        assert!(!state.deleting);
    }

    #[test]
    fn test_remote_upsert_does_not_touch_flags_or_errors() {
        let state = ItemsState {
            saving: true,
            fetching_error: Some(RequestError::Server("old".to_string())),
            ..state_with(vec![Item::with_id("1", "A")])
        }
        .apply(Action::RemoteUpserted(Item::with_id("2", "B")));

        assert!(state.saving);
        assert_eq!(
            state.fetching_error,
            Some(RequestError::Server("old".to_string()))
        );
        assert_eq!(
            state.items.unwrap(),
            vec![Item::with_id("2", "B"), Item::with_id("1", "A")]
        );
    }

    #[test]
    fn test_remote_delete_removes_entry() {
        let state = state_with(vec![Item::with_id("1", "A"), Item::with_id("2", "B")])
            .apply(Action::RemoteDeleted("1".to_string()));
        assert_eq!(state.items.unwrap(), vec![Item::with_id("2", "B")]);
    }

    #[test]
    fn test_dispatch_bumps_version() {
        let store = ItemStore::new();
        let rx = store.watch();
        assert_eq!(*rx.borrow(), 0);

        assert!(store.dispatch(Action::FetchStarted));
        assert_eq!(*rx.borrow(), 1);
        assert!(store.snapshot().fetching);
    }

    #[test]
    fn test_retired_store_suppresses_dispatch() {
        let store = ItemStore::new();
        store.dispatch(Action::FetchStarted);
        store.retire();

        let rx = store.watch();
        let version = *rx.borrow();
        assert!(!store.dispatch(Action::FetchSucceeded(vec![Item::with_id("1", "A")])));
        assert_eq!(*rx.borrow(), version);
        // the suppressed dispatch left the state as it was
        assert!(store.snapshot().fetching);
        assert_eq!(store.snapshot().items, None);
    }
}
