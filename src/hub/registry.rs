//! Registry of named hub actors.
//!
//! The registry is responsible for:
//! - Spawning each named actor exactly once
//! - Handing out handles to running actors
//! - Graceful shutdown of all actors

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::{FileKvStore, KvStore, MemoryKvStore};

use super::actor::HubActor;
use super::handle::HubHandle;

/// Where each actor's store lives.
#[derive(Debug, Clone)]
pub enum StoreFactory {
    /// A fresh in-memory store per actor.
    Memory,
    /// `<root>/<actor-name>/` per actor.
    File(PathBuf),
}

impl StoreFactory {
    fn open(&self, name: &str) -> Arc<dyn KvStore> {
        match self {
            Self::Memory => Arc::new(MemoryKvStore::new()),
            Self::File(root) => Arc::new(FileKvStore::new(root.join(name))),
        }
    }
}

/// Registry for hub actors. Thread-safe and cheap to clone.
#[derive(Clone)]
pub struct ActorRegistry {
    handles: Arc<DashMap<String, HubHandle>>,
    /// Actor task handles for graceful shutdown.
    task_handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    stores: StoreFactory,
    shutdown_tx: Arc<watch::Sender<bool>>,
    /// Cloned for each actor.
    shutdown_rx: watch::Receiver<bool>,
}

impl ActorRegistry {
    pub fn new(stores: StoreFactory) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            handles: Arc::new(DashMap::new()),
            task_handles: Arc::new(Mutex::new(Vec::new())),
            stores,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Handle for the actor named `name`, spawning it on first use.
    ///
    /// The map entry stays locked while the actor is spawned, so concurrent
    /// first callers all receive the same actor.
    pub async fn get_or_spawn(&self, name: &str) -> HubHandle {
        let mut spawned = None;
        let handle = self
            .handles
            .entry(name.to_string())
            .or_insert_with(|| {
                let store = self.stores.open(name);
                let (tx, task) = HubActor::spawn(name.to_string(), store, self.shutdown_rx.clone());
                spawned = Some(task);
                HubHandle::new(tx)
            })
            .clone();

        if let Some(task) = spawned {
            debug!(actor = %name, "Spawned hub actor");
            self.task_handles.lock().await.push(task);
        }
        handle
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    /// Signal every actor to drain its queue and stop, then wait for them.
    pub async fn shutdown(&self) {
        info!(actors = self.handles.len(), "Shutting down hub actors");

        if self.shutdown_tx.send(true).is_err() {
            warn!("Failed to send shutdown signal");
        }

        let tasks: Vec<_> = self.task_handles.lock().await.drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = ?e, "Hub actor task panicked during shutdown");
            }
        }

        info!("Actor registry shutdown complete");
    }
}
