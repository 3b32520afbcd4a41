use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use super::conversation::Conversation;
use super::message::Message;
use crate::error::{ChatGptError, Result};

struct Entry {
    conversation: Conversation,
    /// `None` when the age is too large to represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(conversation: Conversation) -> Self {
        let expires_at = Instant::now().checked_add(conversation.max_age());
        Self {
            conversation,
            expires_at,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Bounded, time-expiring map of conversation id → `Conversation`.
///
/// Every operation runs under one lock. Entries expire `max_age` after they
/// were inserted and are dropped lazily the next time they are touched.
pub struct ConversationStore {
    entries: Mutex<LruCache<String, Entry>>,
    next_generation: AtomicU64,
}

impl ConversationStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            next_generation: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Entry>> {
        // Critical sections never panic halfway through a mutation.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Live entry for `id`, promoted to most recently used. Expired entries
    /// are removed.
    fn live<'a>(cache: &'a mut LruCache<String, Entry>, id: &str) -> Option<&'a mut Entry> {
        let expired = cache.peek(id)?.is_expired();
        if expired {
            cache.pop(id);
            tracing::debug!(conversation = id, "conversation expired");
            return None;
        }
        cache.get_mut(id)
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Number of live (unexpired) conversations.
    pub fn len(&self) -> usize {
        self.lock()
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` is live, without touching its recency.
    pub fn contains(&self, id: &str) -> bool {
        self.lock()
            .peek(id)
            .is_some_and(|entry| !entry.is_expired())
    }

    pub fn get(&self, id: &str) -> Option<Conversation> {
        let mut cache = self.lock();
        Self::live(&mut cache, id).map(|entry| entry.conversation.clone())
    }

    /// Return the live conversation for `id`, or insert the one built by
    /// `create`. An existing entry always wins over the new settings.
    pub fn get_or_create<F>(&self, id: &str, create: F) -> Conversation
    where
        F: FnOnce() -> Conversation,
    {
        let mut cache = self.lock();
        if let Some(entry) = Self::live(&mut cache, id) {
            return entry.conversation.clone();
        }

        if cache.len() >= cache.cap().get() {
            let expired: Vec<String> = cache
                .iter()
                .filter(|(_, entry)| entry.is_expired())
                .map(|(key, _)| key.clone())
                .collect();
            for key in expired {
                cache.pop(&key);
            }
        }

        let mut conversation = create();
        conversation.set_generation(self.next_generation.fetch_add(1, Ordering::Relaxed));
        if let Some((evicted, _)) = cache.push(id.to_string(), Entry::new(conversation.clone())) {
            if evicted != id {
                tracing::info!(conversation = %evicted, "evicted least recently used conversation");
            }
        }
        tracing::info!(conversation = id, model = conversation.model(), "created conversation");
        conversation
    }

    /// Apply `f` to the live conversation for `id`.
    pub fn update<F, R>(&self, id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Conversation) -> R,
    {
        let mut cache = self.lock();
        let entry = Self::live(&mut cache, id).ok_or_else(|| ChatGptError::not_found(id))?;
        Ok(f(&mut entry.conversation))
    }

    pub fn change_model(&self, id: &str, model: &str) -> Result<()> {
        self.update(id, |conversation| conversation.set_model(model))
    }

    /// Append `messages` to the history of `id` in order.
    pub fn append<I>(&self, id: &str, messages: I) -> Result<()>
    where
        I: IntoIterator<Item = Message>,
    {
        self.update(id, |conversation| conversation.extend(messages))
    }

    /// Append `messages` only if `id` still holds the conversation of
    /// `generation`. A reset or expired conversation recreated under the
    /// same id counts as absent.
    pub fn append_if<I>(&self, id: &str, generation: u64, messages: I) -> Result<()>
    where
        I: IntoIterator<Item = Message>,
    {
        let mut cache = self.lock();
        let entry = Self::live(&mut cache, id)
            .filter(|entry| entry.conversation.generation() == generation)
            .ok_or_else(|| ChatGptError::not_found(id))?;
        entry.conversation.extend(messages);
        Ok(())
    }

    /// Drop one conversation. Returns whether it was present.
    pub fn remove(&self, id: &str) -> bool {
        self.lock().pop(id).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::ConversationConfig;
    use std::time::Duration;

    fn conversation(id: &str, context: &str) -> Conversation {
        Conversation::new(
            id,
            ConversationConfig::default().with_context(context),
            &Config::default(),
        )
    }

    fn short_lived(id: &str, max_age: Duration) -> Conversation {
        Conversation::new(
            id,
            ConversationConfig::default().with_max_age(max_age),
            &Config::default(),
        )
    }

    #[test]
    fn existing_entry_wins_over_new_settings() {
        let store = ConversationStore::new(10);
        let first = store.get_or_create("c1", || conversation("c1", "first"));
        let second = store.get_or_create("c1", || conversation("c1", "second"));

        assert_eq!(second.context(), "first");
        assert_eq!(second.created_at(), first.created_at());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let store = ConversationStore::new(3);
        for id in ["a", "b", "c"] {
            store.get_or_create(id, || conversation(id, ""));
        }
        // "a" becomes most recently used, so "b" is the oldest.
        assert!(store.get("a").is_some());

        store.get_or_create("d", || conversation("d", ""));

        assert_eq!(store.len(), 3);
        assert!(store.contains("a"));
        assert!(!store.contains("b"));
        assert!(store.contains("c"));
        assert!(store.contains("d"));
    }

    #[test]
    fn zero_capacity_holds_one() {
        let store = ConversationStore::new(0);
        assert_eq!(store.capacity(), 1);
        store.get_or_create("a", || conversation("a", ""));
        store.get_or_create("b", || conversation("b", ""));
        assert!(!store.contains("a"));
        assert!(store.contains("b"));
    }

    #[test]
    fn expired_entry_is_absent_and_recreated() {
        let store = ConversationStore::new(10);
        store.get_or_create("c1", || short_lived("c1", Duration::from_millis(20)));
        store.append("c1", [Message::user("hi")]).unwrap();

        std::thread::sleep(Duration::from_millis(60));

        assert!(!store.contains("c1"));
        assert!(store.get("c1").is_none());
        assert!(matches!(
            store.change_model("c1", "gpt-3.5-turbo"),
            Err(ChatGptError::ConversationNotFound(_))
        ));

        let fresh = store.get_or_create("c1", || conversation("c1", "fresh"));
        assert_eq!(fresh.context(), "fresh");
        assert!(fresh.is_empty());
    }

    #[test]
    fn expired_entries_make_room_before_live_ones() {
        let store = ConversationStore::new(2);
        store.get_or_create("old", || short_lived("old", Duration::from_millis(20)));
        store.get_or_create("live", || conversation("live", ""));

        std::thread::sleep(Duration::from_millis(60));
        store.get_or_create("new", || conversation("new", ""));

        assert!(store.contains("live"));
        assert!(store.contains("new"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn change_model_mutates_in_place() {
        let store = ConversationStore::new(10);
        store.get_or_create("c1", || conversation("c1", ""));
        store.change_model("c1", "gpt-3.5-turbo").unwrap();
        assert_eq!(store.get("c1").unwrap().model(), "gpt-3.5-turbo");
    }

    #[test]
    fn change_model_on_unknown_id_fails() {
        let store = ConversationStore::new(10);
        let err = store.change_model("missing", "gpt-3.5-turbo").unwrap_err();
        assert!(matches!(err, ChatGptError::ConversationNotFound(ref id) if id == "missing"));
    }

    #[test]
    fn append_keeps_order() {
        let store = ConversationStore::new(10);
        store.get_or_create("c1", || conversation("c1", ""));
        store
            .append("c1", [Message::user("one"), Message::assistant("two")])
            .unwrap();
        store.append("c1", [Message::user("three")]).unwrap();

        let texts: Vec<String> = store
            .get("c1")
            .unwrap()
            .messages()
            .iter()
            .map(|m| m.text.clone())
            .collect();
        assert_eq!(texts, ["one", "two", "three"]);
    }

    #[test]
    fn snapshots_do_not_leak_mutations() {
        let store = ConversationStore::new(10);
        let snapshot = store.get_or_create("c1", || conversation("c1", ""));
        store.append("c1", [Message::user("hi")]).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(store.get("c1").unwrap().len(), 1);
    }

    #[test]
    fn append_if_rejects_recreated_conversation() {
        let store = ConversationStore::new(10);
        let old = store.get_or_create("c1", || conversation("c1", "old"));

        store.remove("c1");
        let fresh = store.get_or_create("c1", || conversation("c1", "new"));
        assert_ne!(old.generation(), fresh.generation());

        let err = store
            .append_if("c1", old.generation(), [Message::user("stale")])
            .unwrap_err();
        assert!(matches!(err, ChatGptError::ConversationNotFound(_)));
        assert!(store.get("c1").unwrap().is_empty());

        store
            .append_if("c1", fresh.generation(), [Message::user("current")])
            .unwrap();
        assert_eq!(store.get("c1").unwrap().messages()[0].text, "current");
    }

    #[test]
    fn cache_hit_keeps_generation() {
        let store = ConversationStore::new(10);
        let first = store.get_or_create("c1", || conversation("c1", ""));
        let again = store.get_or_create("c1", || conversation("c1", ""));
        assert_eq!(first.generation(), again.generation());
    }

    #[test]
    fn remove_and_clear() {
        let store = ConversationStore::new(10);
        for id in ["a", "b", "c"] {
            store.get_or_create(id, || conversation(id, ""));
        }

        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_get_or_create_yields_one_conversation() {
        let store = std::sync::Arc::new(ConversationStore::new(10));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .get_or_create("shared", || conversation("shared", &format!("t{i}")))
                        .context()
                        .to_string()
                })
            })
            .collect();

        let contexts: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(contexts.iter().all(|c| c == &contexts[0]));
        assert_eq!(store.len(), 1);
    }
}
