//! Single-flight bookkeeping for store fetches.
//!
//! [`RequestStates::begin`] either hands out a [`FlightGuard`] or refuses
//! because the same key is already in flight. The guard records the outcome
//! when it goes away, so the key is released on every exit path, including a
//! dropped future.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lifecycle of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Done,
    Failed,
}

impl RequestState {
    pub fn is_in_flight(self) -> bool {
        self == RequestState::InFlight
    }
}

/// Request states keyed by `K`. Keys that were never started are `Idle`.
#[derive(Debug)]
pub struct RequestStates<K> {
    states: Mutex<HashMap<K, RequestState>>,
}

impl<K: Eq + Hash + Clone> RequestStates<K> {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, RequestState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get<Q>(&self, key: &Q) -> RequestState
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().get(key).copied().unwrap_or_default()
    }

    pub fn is_in_flight<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_in_flight()
    }

    /// Marks `key` as in flight, or returns `None` if it already is.
    pub fn begin(&self, key: K) -> Option<FlightGuard<'_, K>> {
        let mut states = self.lock();
        let state = states.entry(key.clone()).or_default();
        if state.is_in_flight() {
            return None;
        }
        *state = RequestState::InFlight;

        Some(FlightGuard {
            owner: self,
            key,
            outcome: RequestState::Failed,
        })
    }

    /// Forgets the finished state of `key`. An in-flight key is left alone.
    pub fn reset<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut states = self.lock();
        if states.get(key).is_some_and(|state| !state.is_in_flight()) {
            states.remove(key);
        }
    }

    /// Forgets every finished state.
    pub fn reset_all(&self) {
        self.lock().retain(|_, state| state.is_in_flight());
    }
}

impl<K: Eq + Hash + Clone> Default for RequestStates<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds a key in flight. Records `Done` after [`FlightGuard::succeed`],
/// `Failed` otherwise.
#[must_use = "dropping the guard immediately releases the request"]
pub struct FlightGuard<'a, K: Eq + Hash + Clone> {
    owner: &'a RequestStates<K>,
    key: K,
    outcome: RequestState,
}

impl<K: Eq + Hash + Clone> FlightGuard<'_, K> {
    pub fn succeed(mut self) {
        self.outcome = RequestState::Done;
    }
}

impl<K: Eq + Hash + Clone> Drop for FlightGuard<'_, K> {
    fn drop(&mut self) {
        self.owner.lock().insert(self.key.clone(), self.outcome);
    }
}
