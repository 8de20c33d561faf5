//! Conversation Memory
//!
//! A bounded, per-session history of English exchanges. Sessions are keyed
//! explicitly so concurrent users never share a history, and each session's
//! memory sits behind its own async mutex: whoever holds the lock is the only
//! writer for the whole duration of a command. The number of live sessions
//! is bounded; the least recently used one is dropped first.

use crate::llm_client::ChatMessage;
use chrono::{DateTime, Local};
use lru::LruCache;
use serde::Serialize;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Session key used when a caller does not supply one.
pub const DEFAULT_SESSION: &str = "default";

/// One exchange, both sides already in English.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
    pub timestamp: DateTime<Local>,
}

/// Ring buffer of the most recent turns; the oldest turn is evicted first.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(ConversationTurn {
            user: user.into(),
            assistant: assistant.into(),
            timestamp: Local::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Oldest-first iterator over all retained turns.
    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ConversationTurn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).cloned().collect()
    }

    /// The last `turns` exchanges as alternating user / assistant messages.
    pub fn context_messages(&self, turns: usize) -> Vec<ChatMessage> {
        self.recent(turns)
            .into_iter()
            .flat_map(|turn| {
                [
                    ChatMessage::User(turn.user),
                    ChatMessage::Assistant(turn.assistant),
                ]
            })
            .collect()
    }
}

/// Session key → that session's memory, least recently used first out.
#[derive(Debug)]
pub struct SessionStore {
    capacity: usize,
    sessions: Mutex<LruCache<String, Arc<tokio::sync::Mutex<ConversationMemory>>>>,
}

impl SessionStore {
    /// `capacity` bounds each session's turns, `max_sessions` the number of
    /// sessions (at least one is always kept).
    pub fn new(capacity: usize, max_sessions: usize) -> Self {
        let max_sessions = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            capacity,
            sessions: Mutex::new(LruCache::new(max_sessions)),
        }
    }

    /// Returns the memory for `session`, creating it on first use and
    /// evicting the least recently used session when the store is full.
    pub fn session(&self, session: &str) -> Arc<tokio::sync::Mutex<ConversationMemory>> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(memory) = sessions.get(session) {
            return memory.clone();
        }
        let memory = Arc::new(tokio::sync::Mutex::new(ConversationMemory::new(self.capacity)));
        if let Some((evicted, _)) = sessions.push(session.to_string(), memory.clone()) {
            debug!(session = %evicted, "Evicted least recently used session");
        }
        memory
    }

    /// Drops a session entirely.
    pub fn remove(&self, session: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop(session)
            .is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn max_sessions(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .cap()
            .get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oldest_turns_are_evicted() {
        let mut memory = ConversationMemory::new(20);
        for i in 0..25 {
            memory.push(format!("command {i}"), format!("reply {i}"));
        }
        assert_eq!(memory.len(), 20);
        let first = memory.turns().next().unwrap();
        assert_eq!(first.user, "command 5");
        assert_eq!(memory.turns().last().unwrap().user, "command 24");
    }

    #[test]
    fn test_context_messages_alternate_and_are_bounded() {
        let mut memory = ConversationMemory::new(20);
        for i in 0..5 {
            memory.push(format!("command {i}"), format!("reply {i}"));
        }
        let context = memory.context_messages(3);
        assert_eq!(context.len(), 6);
        assert_eq!(context[0], ChatMessage::User("command 2".to_string()));
        assert_eq!(context[1], ChatMessage::Assistant("reply 2".to_string()));
        assert_eq!(context[5], ChatMessage::Assistant("reply 4".to_string()));
    }

    #[test]
    fn test_context_with_short_history() {
        let mut memory = ConversationMemory::new(20);
        memory.push("hi", "hello");
        assert_eq!(memory.context_messages(3).len(), 2);
        assert!(ConversationMemory::new(20).context_messages(3).is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut memory = ConversationMemory::new(0);
        memory.push("hi", "hello");
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(20, 10);
        store.session("alice").lock().await.push("hi", "hello");
        assert_eq!(store.session("alice").lock().await.len(), 1);
        assert!(store.session("bob").lock().await.is_empty());
        assert_eq!(store.session_count(), 2);
        assert!(store.remove("bob"));
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_session_count_stays_at_the_bound() {
        let store = SessionStore::new(20, 3);
        store.session("alice").lock().await.push("hi", "hello");
        for i in 0..500 {
            store.session(&format!("client-{i}"));
            store.session("alice");
        }

        assert_eq!(store.session_count(), 3);
        assert_eq!(store.max_sessions(), 3);
        assert_eq!(store.session("alice").lock().await.len(), 1);
        assert!(store.session("client-0").lock().await.is_empty());
    }

    #[test]
    fn test_zero_session_bound_keeps_one() {
        let store = SessionStore::new(20, 0);
        store.session("alice");
        store.session("bob");
        assert_eq!(store.session_count(), 1);
    }
}
