//! Job runner registry.
//!
//! Maps a [`JobRunnerKey`] to the [`JobRunner`] that executes jobs of that
//! type. Registering a key that is already present replaces the previous
//! runner; the last writer wins.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::runner::JobRunner;
use crate::types::JobRunnerKey;

/// Thread-safe registry of job runners.
pub struct JobRunnerRegistry {
    runners: DashMap<JobRunnerKey, Arc<dyn JobRunner>>,
}

impl JobRunnerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            runners: DashMap::new(),
        }
    }

    /// Register a runner, replacing any runner already under `key`.
    ///
    /// Returns the replaced runner, if any.
    pub fn register(
        &self,
        key: JobRunnerKey,
        runner: Arc<dyn JobRunner>,
    ) -> Option<Arc<dyn JobRunner>> {
        debug!(job_runner_key = %key, "Registering job runner");
        self.runners.insert(key, runner)
    }

    /// Remove the runner under `key`. Does nothing if none is registered.
    pub fn unregister(&self, key: &JobRunnerKey) {
        if self.runners.remove(key).is_some() {
            debug!(job_runner_key = %key, "Unregistered job runner");
        }
    }

    /// Get the runner registered under `key`.
    pub fn get(&self, key: &JobRunnerKey) -> Option<Arc<dyn JobRunner>> {
        self.runners.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &JobRunnerKey) -> bool {
        self.runners.contains_key(key)
    }

    /// Snapshot of the registered keys.
    pub fn registered_keys(&self) -> BTreeSet<JobRunnerKey> {
        self.runners.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }
}

impl Default for JobRunnerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
