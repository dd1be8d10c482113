//! Configuration file watcher for hot rehash.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::DaemonConfig;

/// Monitors the configuration file and emits freshly validated configs.
///
/// A change that fails to load or validate is logged and dropped; the
/// daemon keeps serving with the configuration it already has.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<DaemonConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<DaemonConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for events to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file changed, starting rehash");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(
                                    error = %e,
                                    "Rehash aborted, keeping current configuration"
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wait for an update whose connection limit matches, skipping any
    /// duplicate events the filesystem watcher delivered along the way.
    async fn update_with(
        updates: &mut mpsc::UnboundedReceiver<DaemonConfig>,
        max_connections: usize,
    ) -> DaemonConfig {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let config = updates.recv().await.expect("watcher channel closed");
                if config.limits.max_connections == max_connections {
                    return config;
                }
            }
        })
        .await
        .expect("config update never arrived")
    }

    #[tokio::test]
    async fn valid_rewrites_flow_and_broken_ones_are_dropped() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[limits]\nmax_connections = 100\n").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(file.path());
        let _watcher_guard = watcher.run().unwrap();

        std::fs::write(file.path(), "[limits]\nmax_connections = 111\n").unwrap();
        let config = update_with(&mut updates, 111).await;
        assert_eq!(config.limits.max_connections, 111);

        // A rewrite that fails to load is logged and dropped; a parse
        // error has no config to send.
        std::fs::write(file.path(), "this is [ not toml").unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // The watcher survives the broken file and delivers the next
        // good one.
        std::fs::write(file.path(), "[limits]\nmax_connections = 222\n").unwrap();
        let config = update_with(&mut updates, 222).await;
        assert_eq!(config.limits.max_connections, 222);
    }
}
