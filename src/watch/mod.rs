//! Deletion watcher.
//!
//! Removes derived artifacts as soon as their original disappears, so a
//! deleted upload does not leave a `.webp` (or a fallback link) behind until
//! the next cleanup.

use crate::conversion::ConversionEngine;
use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use webpforge_common::paths::has_extension;

/// Watches the source roots for removed originals
pub struct DeletionWatcher {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
    engine: Arc<ConversionEngine>,
    watcher: Option<RecommendedWatcher>,
}

impl DeletionWatcher {
    pub fn new(roots: Vec<PathBuf>, extensions: Vec<String>, engine: Arc<ConversionEngine>) -> Self {
        Self {
            roots,
            extensions,
            engine,
            watcher: None,
        }
    }

    /// Start watching the roots; events are handled on a spawned task.
    pub async fn start(&mut self) -> Result<()> {
        let (event_tx, mut event_rx) = mpsc::channel::<PathBuf>(100);

        let extensions = self.extensions.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("Watch error: {}", e);
                        return;
                    }
                };
                for path in deleted_originals(&event, &extensions) {
                    if let Err(e) = event_tx.blocking_send(path) {
                        tracing::debug!("Deletion handler gone, dropping {:?}", e.0);
                    }
                }
            },
            Config::default(),
        )
        .context("Failed to create file watcher")?;

        for path in &self.roots {
            if path.is_dir() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .with_context(|| format!("Failed to watch path: {:?}", path))?;
                tracing::info!("Watching for deletions: {:?}", path);
            } else {
                tracing::warn!("Watch path does not exist: {:?}", path);
            }
        }

        self.watcher = Some(watcher);

        let engine = self.engine.clone();
        tokio::spawn(async move {
            while let Some(path) = event_rx.recv().await {
                tracing::debug!("Original removed: {:?}", path);
                engine.on_original_deleted(&path);
            }
        });

        Ok(())
    }

    /// Stop watching
    pub fn stop(&mut self) {
        self.watcher = None;
        tracing::info!("Deletion watcher stopped");
    }
}

/// Originals removed by `event`, filtered by source extension.
pub fn deleted_originals(event: &Event, extensions: &[String]) -> Vec<PathBuf> {
    if !event.kind.is_remove() {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| has_extension(path, extensions))
        .cloned()
        .collect()
}
