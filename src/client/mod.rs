mod builder;
mod http_client;
mod push;

pub use builder::BooklistClientBuilder;
pub use http_client::HttpClient;
pub use push::{PushChannel, PushHandle};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::protocol::{ChangeEvent, Item, RequestError};

/// Contract of the Remote Item Service as consumed by the sync layer.
///
/// [`HttpClient`] is the production implementation; tests drive the sync
/// controller against an in-process mock.
#[async_trait]
pub trait ItemService: Send + Sync {
    async fn list_items(&self, credential: &str) -> Result<Vec<Item>, RequestError>;

    /// Create a new item. The server assigns the id; the echoed item is
    /// canonical.
    async fn create_item(&self, credential: &str, item: &Item) -> Result<Item, RequestError>;

    /// Replace an existing item. Fails with [`RequestError::NotFound`] when
    /// the id is unknown.
    async fn update_item(&self, credential: &str, item: &Item) -> Result<Item, RequestError>;

    async fn delete_item(&self, credential: &str, id: &str) -> Result<(), RequestError>;

    /// Open the push channel scoped to `credential`. Parsed change events
    /// are forwarded into `events` until the returned handle is closed or
    /// the service hangs up.
    async fn open_push_channel(
        &self,
        credential: &str,
        events: mpsc::Sender<ChangeEvent>,
    ) -> Result<PushHandle, RequestError>;
}
