use std::sync::Arc;
use std::time::Duration;

use tgt_store::KeyValueStore;
use tracing::{error, info};

/// Periodically drops expired entries from stores without native expiry.
pub async fn start_store_sweeper(store: Arc<dyn KeyValueStore>, every: Duration) {
    info!("Store sweeper started for {} backend, every {:?}", store.backend(), every);

    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if let Err(e) = store.purge_expired().await {
            error!("Store sweep failed: {}", e);
        }
    }
}
