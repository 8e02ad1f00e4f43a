use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct RegistryState {
    /// Running ids mapped to the ticket of the admission that inserted them
    active: HashMap<String, u64>,
    next_ticket: u64,
}

/// Table of bulk operation ids that are currently running.
///
/// Admission is a single check-and-insert under one lock, so two concurrent
/// admissions for the same id can never both succeed. Clones share the same
/// table; create a fresh registry per test for isolation.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // The map holds no invariant a panicking holder could break halfway.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers `id` as running. Returns `false` if it already is.
    pub fn admit(&self, id: &str) -> bool {
        self.admit_ticket(id).is_some()
    }

    fn admit_ticket(&self, id: &str) -> Option<u64> {
        let mut state = self.lock();
        if state.active.contains_key(id) {
            return None;
        }
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.active.insert(id.to_string(), ticket);
        Some(ticket)
    }

    /// Admits `id` and returns a guard that releases it on drop.
    pub fn try_acquire(&self, id: &str) -> Option<RegistryGuard> {
        let ticket = self.admit_ticket(id)?;
        Some(RegistryGuard {
            registry: self.clone(),
            id: id.to_string(),
            ticket,
        })
    }

    /// Removes `id` unconditionally. Releasing an absent id is a no-op.
    pub fn release(&self, id: &str) {
        self.lock().active.remove(id);
    }

    fn release_ticket(&self, id: &str, ticket: u64) -> bool {
        let mut state = self.lock();
        if state.active.get(id) == Some(&ticket) {
            state.active.remove(id);
            true
        } else {
            false
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.lock().active.contains_key(id)
    }

    /// Snapshot of running ids, in no particular order.
    pub fn list_active(&self) -> Vec<String> {
        self.lock().active.keys().cloned().collect()
    }

    /// Frees `id` for a future run and reports whether it was running.
    ///
    /// In-flight operation calls are not interrupted; the run that owned the
    /// id keeps going until its last window finishes.
    pub fn cancel(&self, id: &str) -> bool {
        let removed = self.lock().active.remove(id).is_some();
        if removed {
            log::info!("Cancelled bulk operation: {id}");
        }
        removed
    }
}

/// RAII admission handle for one run.
///
/// Dropping the guard releases the id, including when the run future panics
/// or is dropped. A guard only removes its own admission: after a `cancel`
/// and a re-admission by a newer run, the older guard leaves the entry alone.
#[derive(Debug)]
pub struct RegistryGuard {
    registry: OperationRegistry,
    id: String,
    ticket: u64,
}

impl RegistryGuard {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this admission still owns its id.
    pub fn is_current(&self) -> bool {
        self.registry.lock().active.get(&self.id) == Some(&self.ticket)
    }
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        if self.registry.release_ticket(&self.id, self.ticket) {
            log::debug!("Released bulk operation id '{}'", self.id);
        } else {
            log::debug!(
                "Bulk operation id '{}' was cancelled or re-admitted; leaving entry untouched",
                self.id
            );
        }
    }
}
