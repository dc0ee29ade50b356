//! Circular dependency detection infrastructure.

use std::thread::ThreadId;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{DiError, DiResult, ResolutionChain};
use crate::key::ServiceKey;

/// Keys currently being built by one top-level resolution, outermost first.
///
/// Owned by the resolution itself and threaded through the recursion, so no
/// thread-local state survives a failed or panicking build.
#[derive(Debug)]
pub(crate) struct ResolutionPath {
    stack: Vec<ServiceKey>,
    detect_cycles: bool,
    max_depth: usize,
}

impl ResolutionPath {
    pub(crate) fn new(detect_cycles: bool, max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            detect_cycles,
            max_depth,
        }
    }

    /// Pushes `key`, failing on a cycle or when the depth limit is reached.
    pub(crate) fn enter(&mut self, key: &ServiceKey) -> DiResult<()> {
        // circular detection BEFORE pushing the new key
        if self.detect_cycles && self.stack.contains(key) {
            return Err(DiError::CircularDependency(self.chain_with(key)));
        }
        if self.stack.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.max_depth));
        }
        self.stack.push(key.clone());
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.stack.pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The current path extended with `key`.
    pub(crate) fn chain_with(&self, key: &ServiceKey) -> ResolutionChain {
        let mut keys: Vec<String> = self.stack.iter().map(ToString::to_string).collect();
        keys.push(key.to_string());
        ResolutionChain::from(keys)
    }

    /// The current path extended with every key in `keys`.
    pub(crate) fn chain_through(&self, keys: &[ServiceKey]) -> ResolutionChain {
        let keys: Vec<String> = self.stack.iter().chain(keys).map(ToString::to_string).collect();
        ResolutionChain::from(keys)
    }
}

/// Singleton build locks held and awaited across threads.
///
/// A resolution path only sees its own thread. When two threads each hold a
/// build lock the other needs, the wait-for chain recorded here closes back
/// on the blocked thread and the cycle is reported instead of waiting forever.
#[derive(Debug, Default)]
pub(crate) struct BuildWaits {
    owners: DashMap<ServiceKey, ThreadId>,
    waiting: DashMap<ThreadId, ServiceKey>,
}

impl BuildWaits {
    /// Records `thread` as the holder of `key`'s build lock until the
    /// returned hold is dropped. Reentrant acquisitions leave the record alone.
    pub(crate) fn hold(&self, key: &ServiceKey, thread: ThreadId) -> BuildHold<'_> {
        let key = match self.owners.entry(key.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(thread);
                Some(key.clone())
            }
            Entry::Occupied(_) => None,
        };
        BuildHold { waits: self, key }
    }

    pub(crate) fn wait_for(&self, thread: ThreadId, key: &ServiceKey) {
        self.waiting.insert(thread, key.clone());
    }

    pub(crate) fn stop_waiting(&self, thread: ThreadId) {
        self.waiting.remove(&thread);
    }

    /// Follows lock holders starting at `key`. When the chain comes back to a
    /// lock `thread` holds, returns the keys awaited along the way, ending
    /// with that lock.
    pub(crate) fn deadlock(&self, thread: ThreadId, key: &ServiceKey) -> Option<Vec<ServiceKey>> {
        let mut current = key.clone();
        let mut awaited = Vec::new();
        for _ in 0..=self.waiting.len() {
            let owner = *self.owners.get(&current)?.value();
            if owner == thread {
                return if awaited.is_empty() { None } else { Some(awaited) };
            }
            current = self.waiting.get(&owner)?.value().clone();
            awaited.push(current.clone());
        }
        None
    }
}

/// Ownership record of one build lock; released on drop.
pub(crate) struct BuildHold<'w> {
    waits: &'w BuildWaits,
    key: Option<ServiceKey>,
}

impl Drop for BuildHold<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.waits.owners.remove(&key);
        }
    }
}
