//! Config file watcher for hot reloading.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::{recommended_watcher, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::AppResult;

/// Editors fire several filesystem events per save, and some truncate the
/// file before writing the new content. The reload waits out this quiet
/// window and runs after the last event, so it always reads the final write.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches the config file and invokes the callback on modification.
/// Watching stops when the value is dropped.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn watch<F>(path: &Path, on_change: F) -> AppResult<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let generation = Arc::new(AtomicU64::new(0));
        let on_change = Arc::new(on_change);

        let mut watcher = recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("Config watcher error: {e}");
                    return;
                }
            };

            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }

            // Each event invalidates the previous one; only the burst's
            // last event survives the quiet window and fires the reload.
            let current = generation.fetch_add(1, Ordering::SeqCst) + 1;
            let generation = Arc::clone(&generation);
            let on_change = Arc::clone(&on_change);
            std::thread::spawn(move || {
                std::thread::sleep(DEBOUNCE);
                if generation.load(Ordering::SeqCst) == current {
                    on_change();
                }
            });
        })?;

        watcher.watch(path, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching config file {}", path.display());

        Ok(Self { _watcher: watcher })
    }
}
