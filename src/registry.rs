//! Process-wide table of live environments, keyed by id.

use crate::env::Environment;
use crate::error::Result;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to one environment. Readers take the read lock, mutators the write lock.
pub type EnvHandle = Arc<RwLock<Environment>>;

/// Concurrent id -> environment map plus the global mutation lock.
///
/// Ids start at 1, increase monotonically and are never reused. Environments
/// are never removed.
#[derive(Default)]
pub struct EnvRegistry {
    envs: RwLock<HashMap<u64, EnvHandle>>,
    last_id: AtomicU64,
    mutation_lock: Mutex<()>,
}

impl EnvRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes every state-changing operation across all environments.
    pub fn lock_mutations(&self) -> MutexGuard<'_, ()> {
        self.mutation_lock.lock()
    }

    /// Stores `env` under a fresh id.
    pub fn insert(&self, env: Environment) -> u64 {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.envs.write().insert(id, Arc::new(RwLock::new(env)));
        id
    }

    /// Builds an environment under the mutation lock and registers it.
    pub fn create<F>(&self, build: F) -> Result<u64>
    where
        F: FnOnce() -> Result<Environment>,
    {
        let _guard = self.lock_mutations();
        let env = build()?;
        Ok(self.insert(env))
    }

    pub fn get(&self, id: u64) -> Option<EnvHandle> {
        self.envs.read().get(&id).cloned()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.envs.read().contains_key(&id)
    }

    /// Runs `f` against a fully stored environment without taking the mutation lock.
    pub fn read<R>(&self, id: u64, f: impl FnOnce(&Environment) -> R) -> Option<R> {
        let handle = self.get(id)?;
        let env = handle.read();
        Some(f(&env))
    }

    /// Runs `f` with exclusive access, holding the mutation lock for the whole call.
    ///
    /// Returns `None` without locking anything when `id` is unknown.
    pub fn mutate<R>(&self, id: u64, f: impl FnOnce(&mut Environment) -> R) -> Option<R> {
        let handle = self.get(id)?;
        let _guard = self.lock_mutations();
        let mut env = handle.write();
        Some(f(&mut env))
    }

    pub fn len(&self) -> usize {
        self.envs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
