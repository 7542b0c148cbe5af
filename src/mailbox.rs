//! Single-slot latest-value cells shared between tasks

use std::sync::Arc;
use tokio::sync::watch;

/// Overwrite-on-post, copy-on-read slot.
///
/// Writers replace the value; readers always see the most recent one and never
/// block each other. Clones share the slot.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Arc<watch::Sender<T>>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self { slot: Arc::clone(&self.slot) }
    }
}

impl<T: Clone> Mailbox<T> {
    pub fn new(initial: T) -> Self {
        let (slot, _) = watch::channel(initial);
        Self { slot: Arc::new(slot) }
    }

    /// Replace the stored value and wake subscribers.
    pub fn post(&self, value: T) {
        self.slot.send_replace(value);
    }

    /// Modify the stored value in place and wake subscribers.
    pub fn update(&self, modify: impl FnOnce(&mut T)) {
        self.slot.send_modify(modify);
    }

    /// Copy of the current value.
    pub fn latest(&self) -> T {
        self.slot.borrow().clone()
    }

    /// Receiver that is notified on every post.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.slot.subscribe()
    }
}

impl<T: Clone + Default> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
