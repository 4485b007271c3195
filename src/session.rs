//! Session storage.
//!
//! The signed-in user lives behind [`SessionStore`], injected by the
//! composition root. Nothing in the core reads process-wide state directly.

use std::sync::RwLock;

use crate::model::User;

/// Holds at most one signed-in user.
pub trait SessionStore: Send + Sync {
    /// The current user, if any.
    fn get(&self) -> Option<User>;

    /// Replace the current user.
    fn set(&self, user: User);

    /// Forget the current user.
    fn clear(&self);
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    user: RwLock<Option<User>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, user: User) {
        *self
            .user
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(user);
    }

    fn clear(&self) {
        *self
            .user
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
