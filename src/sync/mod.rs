//! Client-side data synchronization: the item cache store, the sync
//! controller, and the pagination window.

pub mod controller;
pub mod pager;
pub mod store;

pub use controller::{SessionConfig, SyncController};
pub use pager::{PageConfig, PageWindow};
pub use store::{Action, ItemStore, ItemsState};
