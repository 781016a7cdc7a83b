//! Booklist Rust Client
//!
//! Client-side data synchronization layer for the Booklist item service:
//! an authenticated HTTP client, a reducer-driven item cache, a sync
//! controller that owns the push-channel subscription, and a pagination
//! window over the cached list.
//!
//! Screens read the cache through [`ItemStore::snapshot`] (or react via
//! [`ItemStore::watch`]) and call the controller's operations; request
//! failures are stored as data in the per-operation error fields, never
//! returned to the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use booklist_client::{
//!     BooklistClientBuilder, Item, ItemStore, SessionConfig, SyncController,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), booklist_client::RequestError> {
//!     let client = BooklistClientBuilder::new("http://localhost:3000")
//!         .auth("alice", "secret")
//!         .build()
//!         .await?;
//!     let token = client.token().map(str::to_string);
//!
//!     let store = Arc::new(ItemStore::new());
//!     let controller = SyncController::new(
//!         Arc::new(client),
//!         Arc::clone(&store),
//!         SessionConfig::default(),
//!     );
//!
//!     // installs the credential, opens the push channel, fetches the list
//!     controller.set_credential(token).await;
//!
//!     controller.save(Item::new("The Name of the Rose")).await;
//!     println!("{:?}", store.snapshot().items);
//!
//!     controller.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod protocol;
pub mod sync;

pub use client::{BooklistClientBuilder, HttpClient, ItemService, PushChannel, PushHandle};
pub use protocol::{ChangeEvent, ChangeType, Item, RequestError};
pub use sync::{
    Action, ItemStore, ItemsState, PageConfig, PageWindow, SessionConfig, SyncController,
};
