//! Minimal demo driving a live Booklist service.
//!
//! Usage: booklist-demo [addr] [username] [password]

use std::sync::Arc;

use booklist_client::{
    BooklistClientBuilder, Item, ItemStore, PageConfig, PageWindow, RequestError, SessionConfig,
    SyncController,
};

#[tokio::main]
async fn main() -> Result<(), RequestError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let addr = args
        .next()
        .unwrap_or_else(|| "http://localhost:3000".to_string());
    let username = args.next().unwrap_or_else(|| "alice".to_string());
    let password = args.next().unwrap_or_else(|| "secret".to_string());

    let client = BooklistClientBuilder::new(&addr)
        .auth(&username, &password)
        .build()
        .await?;
    let token = client.token().map(str::to_string);

    let store = Arc::new(ItemStore::new());
    let controller = SyncController::new(
        Arc::new(client),
        Arc::clone(&store),
        SessionConfig::default(),
    );
    controller.set_credential(token).await;

    if let Some(error) = store.snapshot().fetching_error {
        eprintln!("fetch failed: {}", error);
    }

    let mut window = PageWindow::new(Arc::clone(&store), PageConfig::default());
    for item in window.visible() {
        println!("{}  {}", item.id.as_deref().unwrap_or("-"), item.text);
    }
    if !window.exhausted() {
        window.reveal_more().await;
        println!("... {} of the list revealed", window.visible().len());
    }

    controller.save(Item::new("added from the demo")).await;
    if let Some(error) = store.snapshot().saving_error {
        eprintln!("save failed: {}", error);
    }

    controller.shutdown().await;
    Ok(())
}
