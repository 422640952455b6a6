//! Live sessions, at most one per player.

use alloc::sync::Arc;
use alloc::vec::Vec;
use std::collections::HashMap;

use crate::error::RegistryError;
use crate::id::{MessageHandle, PlayerId};
use crate::sync::Mutex;

use super::session::GameSession;

/// Shared handle to a live session. Lock it before touching the round.
pub type SessionCell = Arc<tokio::sync::Mutex<GameSession>>;

struct Entry {
    handle: MessageHandle,
    session: SessionCell,
}

#[derive(Default)]
struct Slots {
    by_owner: HashMap<PlayerId, Entry>,
    by_handle: HashMap<MessageHandle, PlayerId>,
}

/// Live sessions keyed by owner, with a reverse index by message handle.
///
/// Every operation takes the same lock, so create, lookup and removal for a
/// given owner never interleave.
#[derive(Default)]
pub struct SessionRegistry {
    slots: Mutex<Slots>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `session` for `owner` under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Occupied`] if `owner` already has a live session.
    pub fn create(
        &self,
        owner: PlayerId,
        handle: MessageHandle,
        session: GameSession,
    ) -> Result<SessionCell, RegistryError> {
        let mut slots = self.slots.lock();
        if slots.by_owner.contains_key(&owner) {
            return Err(RegistryError::Occupied);
        }
        let cell = Arc::new(tokio::sync::Mutex::new(session));
        slots.by_owner.insert(
            owner,
            Entry {
                handle,
                session: Arc::clone(&cell),
            },
        );
        slots.by_handle.insert(handle, owner);
        Ok(cell)
    }

    /// Returns the live session of `owner` and the handle it was registered under.
    pub fn get(&self, owner: PlayerId) -> Option<(MessageHandle, SessionCell)> {
        self.slots
            .lock()
            .by_owner
            .get(&owner)
            .map(|entry| (entry.handle, Arc::clone(&entry.session)))
    }

    /// Returns whether `owner` has a live session.
    pub fn contains(&self, owner: PlayerId) -> bool {
        self.slots.lock().by_owner.contains_key(&owner)
    }

    /// Owner of the live session displayed by `handle`.
    pub fn owner_of(&self, handle: MessageHandle) -> Option<PlayerId> {
        self.slots.lock().by_handle.get(&handle).copied()
    }

    /// Removes the session of `owner` only if it is still registered under `handle`.
    ///
    /// Returns whether a session was removed.
    pub fn remove_if_matches(&self, owner: PlayerId, handle: MessageHandle) -> bool {
        let mut slots = self.slots.lock();
        let matches = slots
            .by_owner
            .get(&owner)
            .is_some_and(|entry| entry.handle == handle);
        if matches {
            slots.by_owner.remove(&owner);
            slots.by_handle.remove(&handle);
        }
        matches
    }

    /// All live sessions at this instant.
    pub fn snapshot(&self) -> Vec<(PlayerId, MessageHandle, SessionCell)> {
        self.slots
            .lock()
            .by_owner
            .iter()
            .map(|(owner, entry)| (*owner, entry.handle, Arc::clone(&entry.session)))
            .collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.slots.lock().by_owner.len()
    }

    /// Returns whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().by_owner.is_empty()
    }
}
