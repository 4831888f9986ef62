use std::sync::Arc;

use tracing::info;

use crate::config::StoreConfig;
use crate::config::WatchConfig;
use crate::ChangeBus;
use crate::Settings;
use crate::VersionedStore;

/// One store wired to one change bus.
///
/// This is the handle a request gateway holds: reads and writes go through
/// [`store`](Self::store), watch requests through [`bus`](Self::bus).
#[derive(Debug, Clone)]
pub struct Database {
    store: Arc<VersionedStore>,
    bus: ChangeBus,
}

impl Database {
    pub fn new(
        store_config: StoreConfig,
        watch_config: WatchConfig,
    ) -> Self {
        let bus = ChangeBus::new(watch_config);
        let store = Arc::new(VersionedStore::new(store_config, bus.clone()));
        Self { store, bus }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        info!(
            tombstone_versions = ?settings.store.tombstone_versions,
            queue_capacity = settings.watch.queue_capacity,
            "Opening database"
        );
        Self::new(settings.store.clone(), settings.watch.clone())
    }

    pub fn store(&self) -> &Arc<VersionedStore> {
        &self.store
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(StoreConfig::default(), WatchConfig::default())
    }
}
