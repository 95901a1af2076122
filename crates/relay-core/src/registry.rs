//! Connection registry.
//!
//! Tracks, per [`ClientId`]:
//! - the live connection handle (present iff that client's receive loop
//!   is running),
//! - the last profile the client announced via `join` (optional, and
//!   independent of the handle).
//!
//! The registry is a plain data structure generic over the handle type
//! `H`; it does no I/O and no locking. The server wraps it in a single
//! lock so that every operation (and every compound "mutate then
//! snapshot") is serialized across connections.
//!
//! Both maps preserve insertion order, so `presence_update.users` lists
//! profiles in the order clients first joined. Re-joining updates a
//! profile in place.

use indexmap::IndexMap;

use crate::client_id::ClientId;
use crate::profile::Profile;

/// In-memory registry of live connections and announced profiles.
#[derive(Debug)]
pub struct Registry<H> {
    /// ClientId -> connection handle.
    connections: IndexMap<ClientId, H>,

    /// ClientId -> last announced profile.
    profiles: IndexMap<ClientId, Profile>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Registry {
            connections: IndexMap::new(),
            profiles: IndexMap::new(),
        }
    }
}

impl<H: Clone> Registry<H> {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Insert or overwrite the connection entry for `id`.
    ///
    /// Last writer wins. Returns the handle that was replaced, if any,
    /// so the caller can at least notice a duplicate id.
    pub fn register(&mut self, id: ClientId, handle: H) -> Option<H> {
        self.connections.insert(id, handle)
    }

    /// Like [`register`](Self::register), but refuses a new id once
    /// `capacity` connections are live.
    ///
    /// Replacing an existing id does not grow the registry and is always
    /// accepted. On refusal the handle is given back.
    pub fn try_register(&mut self, id: ClientId, handle: H, capacity: usize) -> Result<Option<H>, H> {
        if !self.connections.contains_key(&id) && self.connections.len() >= capacity {
            return Err(handle);
        }
        Ok(self.register(id, handle))
    }

    /// Remove both the connection and the profile for `id`.
    ///
    /// Idempotent. Returns `true` if a connection entry was present.
    pub fn unregister(&mut self, id: &ClientId) -> bool {
        self.profiles.shift_remove(id);
        self.connections.shift_remove(id).is_some()
    }

    /// Store `profile` for `id`, whether or not `id` is connected yet.
    pub fn set_profile(&mut self, id: ClientId, profile: Profile) {
        self.profiles.insert(id, profile);
    }

    /// Handle for `id`, if it is currently registered.
    pub fn lookup(&self, id: &ClientId) -> Option<H> {
        self.connections.get(id).cloned()
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.connections.contains_key(id)
    }

    /// Current set of announced profiles, in registry order.
    pub fn snapshot_profiles(&self) -> Vec<Profile> {
        self.profiles.values().cloned().collect()
    }

    /// Snapshot of every live handle, for fan-out outside the lock.
    pub fn handles(&self) -> Vec<(ClientId, H)> {
        self.connections
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect()
    }

    /// Ids of every live connection, in registration order.
    pub fn client_ids(&self) -> Vec<ClientId> {
        self.connections.keys().cloned().collect()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
