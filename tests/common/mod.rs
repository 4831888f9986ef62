use std::sync::Arc;
use std::time::Duration;

use pathkv::Update;
use pathkv::Watcher;
use tokio::time::timeout;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Receives `n` updates, failing the test if any of them takes too long.
pub async fn recv_n(
    watcher: &mut Watcher,
    n: usize,
) -> Vec<Arc<Update>> {
    let mut updates = Vec::with_capacity(n);
    for i in 0..n {
        let update = timeout(RECV_TIMEOUT, watcher.recv())
            .await
            .unwrap_or_else(|_| panic!("Timeout waiting for update {i} of {n}"))
            .expect("Subscription closed early");
        updates.push(update);
    }
    updates
}
