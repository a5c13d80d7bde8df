//! Change notifications published by the comment provider.

use serde::Serialize;

use crate::model::Comment;
use crate::threads::ThreadChangeEvent;

/// Thread changes for open documents, with the review's draft state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentThreadChangeEvent {
    #[serde(flatten)]
    pub threads: ThreadChangeEvent,
    pub in_draft_mode: bool,
}

/// Whole-list replacement of the comment collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentsChangedEvent {
    pub comments: Vec<Comment>,
}

/// Handle returned when registering an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Observers of one event stream, notified in registration order.
pub struct Observers<E> {
    entries: Vec<(SubscriptionId, Callback<E>)>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> std::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl<E> Observers<E> {
    pub fn subscribe(&mut self, id: SubscriptionId, callback: impl Fn(&E) + Send + Sync + 'static) {
        self.entries.push((id, Box::new(callback)));
    }

    /// Remove an observer. Returns whether it was registered here.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn emit(&self, event: &E) {
        for (_, callback) in &self.entries {
            callback(event);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Allocates subscription ids unique across a provider's streams.
#[derive(Debug, Default)]
pub struct SubscriptionIds {
    next: u64,
}

impl SubscriptionIds {
    pub fn next_id(&mut self) -> SubscriptionId {
        self.next += 1;
        SubscriptionId(self.next)
    }
}
