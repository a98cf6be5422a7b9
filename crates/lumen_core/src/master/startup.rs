use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::info;

use super::Master;

impl Master {
    pub(super) fn log_startup(&self) {
        info!(target: "lumen::master", "Starting LUMEN MASTER");
        info!(
            target: "lumen::master",
            worker_connections = self.cfg.global.worker_connections(),
            log_level = %self.cfg.global.log_level(),
            cache_clear_interval_secs = self.cfg.http.cache_clear_interval_secs(),
            "Global configuration loaded"
        );
    }

    pub(super) fn init_semaphore(&self) -> Arc<Semaphore> {
        let max_conns = usize::from(self.cfg.global.worker_connections()).max(1);
        let semaphore = Arc::new(Semaphore::new(max_conns));
        info!(
            target: "lumen::master",
            max_conns,
            "Global connection semaphore initialized"
        );
        semaphore
    }
}
