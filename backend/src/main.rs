use std::net::SocketAddr;

use tracing::{info, Level};

use todo_backend::domain::TodoStore;
use todo_backend::rest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Seeding todo store with sample data");
    let store = TodoStore::with_sample_data();

    let app = rest::app(store);

    let addr = SocketAddr::from(([127, 0, 0, 1], 8000));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
