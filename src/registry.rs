// src/registry.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use uuid::Uuid;

use crate::session::QuizSession;

struct Entry {
    owner: String,
    session: QuizSession,
}

/// Live sessions hosted for browsers, keyed by session id.
///
/// Each session is visible to its owner only. A user holds at most one
/// session at a time: opening a new one discards the previous ones.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<Uuid, Entry>>>,
}

impl SessionRegistry {
    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers `session` under its context's user and returns its id.
    pub fn insert(&self, session: QuizSession) -> Uuid {
        let owner = session.context().user_id.clone();
        let id = Uuid::new_v4();

        let replaced: Vec<QuizSession> = {
            let mut entries = self.entries();
            let stale: Vec<Uuid> = entries
                .iter()
                .filter(|(_, entry)| entry.owner == owner)
                .map(|(id, _)| *id)
                .collect();
            let replaced = stale
                .iter()
                .filter_map(|id| entries.remove(id))
                .map(|entry| entry.session)
                .collect();
            entries.insert(id, Entry { owner, session });
            replaced
        };

        for session in replaced {
            session.discard();
        }
        id
    }

    pub fn get(&self, id: Uuid, owner: &str) -> Option<QuizSession> {
        self.entries()
            .get(&id)
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.session.clone())
    }

    pub fn remove(&self, id: Uuid, owner: &str) -> Option<QuizSession> {
        let mut entries = self.entries();
        let owned = entries.get(&id).is_some_and(|entry| entry.owner == owner);
        if !owned {
            return None;
        }
        entries.remove(&id).map(|entry| entry.session)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
