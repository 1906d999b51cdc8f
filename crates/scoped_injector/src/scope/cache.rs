use crate::{DynSvc, ScopeError, ScopeId, ServiceInfo};
use dashmap::{mapref::entry::Entry, DashMap};
use once_cell::sync::OnceCell;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, ThreadId},
};

/// A single cached value, along with the thread currently creating it.
#[derive(Default)]
struct Slot {
    value: OnceCell<DynSvc>,
    creator: Mutex<Option<ThreadId>>,
}

impl Slot {
    fn is_created_by_current_thread(&self) -> bool {
        let creator = self.creator.lock().unwrap_or_else(PoisonError::into_inner);
        *creator == Some(thread::current().id())
    }

    fn begin_creation(&self) -> CreationGuard<'_> {
        *self.creator.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(thread::current().id());
        CreationGuard(&self.creator)
    }
}

/// Clears the creating thread of a slot once its producer returns or unwinds.
struct CreationGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[derive(Default)]
struct EntryState {
    slots: HashMap<ServiceInfo, Arc<Slot>>,
    sealed: bool,
}

/// The values cached for a single open scope.
#[derive(Default)]
struct ScopeEntry {
    state: Mutex<EntryState>,
}

impl ScopeEntry {
    fn lock(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, service_info: ServiceInfo) -> Arc<Slot> {
        // The lock is only held while fetching the slot. Producers run
        // without it, so they can resolve other request-scoped services.
        self.lock().slots.entry(service_info).or_default().clone()
    }

    fn existing(&self, service_info: ServiceInfo) -> Option<DynSvc> {
        self.lock().slots.get(&service_info)?.value.get().cloned()
    }

    fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    fn seal(&self) {
        self.lock().sealed = true;
    }

    fn len(&self) -> usize {
        self.lock()
            .slots
            .values()
            .filter(|slot| slot.value.get().is_some())
            .count()
    }
}

/// Storage for request-scoped values, keyed by scope and then by service
/// type.
///
/// Scopes are added only by [`open`](Self::open) and removed only by
/// [`close`](Self::close). Within a scope, each service type is created at
/// most once, even when several tasks request it at the same time.
///
/// Once a scope is [sealed](Self::seal), nothing new can be stored in it.
/// Values that already exist can still be read until the scope is closed.
#[derive(Default)]
pub struct ScopeCache {
    scopes: DashMap<ScopeId, Arc<ScopeEntry>>,
}

impl ScopeCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        ScopeCache::default()
    }

    /// Starts caching values for a scope.
    pub fn open(&self, id: ScopeId) -> Result<(), ScopeError> {
        match self.scopes.entry(id) {
            Entry::Occupied(_) => Err(ScopeError::DuplicateScope { id }),
            Entry::Vacant(entry) => {
                entry.insert(Arc::default());
                Ok(())
            }
        }
    }

    /// Stops a scope from accepting new values. Sealing a scope twice does
    /// nothing.
    pub fn seal(&self, id: ScopeId) -> Result<(), ScopeError> {
        self.scopes
            .get(&id)
            .map(|entry| entry.seal())
            .ok_or(ScopeError::UnknownScope { id })
    }

    /// Drops every value cached for a scope.
    pub fn close(&self, id: ScopeId) -> Result<(), ScopeError> {
        let (_, entry) = self
            .scopes
            .remove(&id)
            .ok_or(ScopeError::UnknownScope { id })?;

        // Producers still running for this scope hold their own reference
        entry.seal();
        Ok(())
    }

    /// Gets the value cached for a service in a scope, or creates it with
    /// `producer` if there is none.
    ///
    /// The producer runs at most once per scope and service type. If it
    /// fails, nothing is cached and the error is returned, so a later request
    /// will try again. If the scope is sealed by the time the producer
    /// returns, the value is discarded.
    ///
    /// A producer which requests its own service from the same thread gets
    /// [`ScopeError::ReentrantCreation`] instead of waiting on itself.
    pub fn get_or_create<E, F>(
        &self,
        id: ScopeId,
        service_info: ServiceInfo,
        producer: F,
    ) -> Result<DynSvc, E>
    where
        E: From<ScopeError>,
        F: FnOnce() -> Result<DynSvc, E>,
    {
        let entry = self.entry(id)?;
        let slot = entry.slot(service_info);
        if let Some(value) = slot.value.get() {
            return Ok(value.clone());
        }
        if slot.is_created_by_current_thread() {
            return Err(ScopeError::ReentrantCreation { id, service_info }.into());
        }

        slot.value
            .get_or_try_init(|| {
                let _creating = slot.begin_creation();
                let value = producer()?;
                if entry.is_sealed() {
                    return Err(ScopeError::ScopeNotEstablished.into());
                }
                Ok(value)
            })
            .cloned()
    }

    /// Runs `f` only if a scope is open and unsealed. The scope cannot be
    /// sealed while `f` runs.
    pub fn while_open<R>(
        &self,
        id: ScopeId,
        f: impl FnOnce() -> R,
    ) -> Result<R, ScopeError> {
        let entry = self.entry(id)?;
        let state = entry.lock();
        if state.sealed {
            return Err(ScopeError::ScopeNotEstablished);
        }

        let result = f();
        drop(state);
        Ok(result)
    }

    /// Stores a value created outside of the injector in a scope.
    pub fn seed(
        &self,
        id: ScopeId,
        service_info: ServiceInfo,
        value: DynSvc,
    ) -> Result<(), ScopeError> {
        let entry = self.entry(id)?;
        let mut state = entry.lock();
        if state.sealed {
            return Err(ScopeError::ScopeNotEstablished);
        }

        let slot = state.slots.entry(service_info).or_default();
        slot.value
            .set(value)
            .map_err(|_| ScopeError::AlreadySeeded { id, service_info })
    }

    /// Gets a value stored in a scope.
    pub fn seeded(
        &self,
        id: ScopeId,
        service_info: ServiceInfo,
    ) -> Result<DynSvc, ScopeError> {
        self.entry(id)?
            .existing(service_info)
            .ok_or(ScopeError::NotSeeded { id, service_info })
    }

    /// Gets the number of open scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Checks whether no scopes are open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Checks whether a scope is open.
    #[must_use]
    pub fn contains(&self, id: ScopeId) -> bool {
        self.scopes.contains_key(&id)
    }

    /// Gets the number of values cached in a scope, or `None` if the scope is
    /// not open.
    #[must_use]
    pub fn cached_len(&self, id: ScopeId) -> Option<usize> {
        self.scopes.get(&id).map(|entry| entry.len())
    }

    fn entry(&self, id: ScopeId) -> Result<Arc<ScopeEntry>, ScopeError> {
        // Clone the entry out so the shard guard is released before any
        // producer runs.
        self.scopes
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ScopeError::ScopeNotEstablished)
    }
}
