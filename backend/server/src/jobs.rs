//! # Jobs
//!
//! Named background tasks owned by the server.
//!
//! - Token renewal keeps the session token ahead of its expiry
//! - One refresh job per view recomputes it on the view's own period
//! - Every job is aborted on shutdown or when the registry is dropped

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use process::models::ViewKind;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::refresh::Orchestrator;

#[derive(Default)]
pub struct Jobs {
    handles: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Jobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces and aborts any job already registered under `name`.
    pub fn register(&self, name: impl Into<String>, handle: JoinHandle<()>) {
        let name = name.into();
        debug!(job = %name, "Registering job");

        if let Some(previous) = self.lock().insert(name.clone(), handle) {
            warn!(job = %name, "Replacing running job");
            previous.abort();
        }
    }

    pub fn deregister(&self, name: &str) -> bool {
        match self.lock().remove(name) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn shutdown(&self) {
        let handles: Vec<(String, JoinHandle<()>)> = self.lock().drain().collect();

        for (name, handle) in handles {
            debug!(job = %name, "Stopping job");
            handle.abort();
        }

        info!("Background jobs stopped");
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Jobs {
    fn drop(&mut self) {
        for handle in self.lock().values() {
            handle.abort();
        }
    }
}

pub struct RefreshJob {
    kind: ViewKind,
    every: Duration,
    orchestrator: Arc<Orchestrator>,
}

impl RefreshJob {
    pub fn new(kind: ViewKind, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            kind,
            every: orchestrator.policies().for_view(kind).refresh_every,
            orchestrator,
        }
    }

    pub fn name(&self) -> String {
        format!("refresh:{}", self.kind.key())
    }

    /// First cycle runs immediately, later ones every `every`.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if let Err(e) = self.orchestrator.scheduled_refresh(self.kind).await {
                    warn!(view = %self.kind, "Scheduled refresh failed, keeping cached view: {e}");
                }
            }
        })
    }
}
