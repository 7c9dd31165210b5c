//! Per-user conversation storage.

use chrono::{DateTime, Duration, Local};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::conversation::{ConversationContext, DEFAULT_CONTEXT_EXPIRY_MINUTES};

/// Keyed storage for conversation contexts.
///
/// Expiry is checked when a context is read; nothing sweeps stale entries in
/// the background, so an idle user's context stays in memory until that user
/// writes again or the process exits.
pub trait ContextStore: Send + Sync {
    /// The live context for `user_id`, or `None` if absent or expired.
    /// An expired context is removed as a side effect.
    fn get(&self, user_id: &str, now: DateTime<Local>) -> Option<ConversationContext>;

    /// Inserts or replaces the context under its own user id.
    fn set(&self, context: ConversationContext);

    /// Drops the context for `user_id`. Returns whether one existed.
    fn expire(&self, user_id: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store behind a single read/write lock.
pub struct InMemoryContextStore {
    contexts: RwLock<HashMap<String, ConversationContext>>,
    ttl: Duration,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(DEFAULT_CONTEXT_EXPIRY_MINUTES))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore for InMemoryContextStore {
    fn get(&self, user_id: &str, now: DateTime<Local>) -> Option<ConversationContext> {
        {
            let contexts = self.contexts.read();
            match contexts.get(user_id) {
                None => return None,
                Some(ctx) if !ctx.is_expired(now, self.ttl) => return Some(ctx.clone()),
                Some(_) => {}
            }
        }

        let mut contexts = self.contexts.write();
        // Re-check under the write lock; another writer may have refreshed it.
        match contexts.get(user_id) {
            Some(ctx) if ctx.is_expired(now, self.ttl) => {
                contexts.remove(user_id);
                log::info!("Context for user {} expired. Deleted.", user_id);
                None
            }
            Some(ctx) => Some(ctx.clone()),
            None => None,
        }
    }

    fn set(&self, context: ConversationContext) {
        self.contexts.write().insert(context.user_id.clone(), context);
    }

    fn expire(&self, user_id: &str) -> bool {
        self.contexts.write().remove(user_id).is_some()
    }

    fn len(&self) -> usize {
        self.contexts.read().len()
    }
}
