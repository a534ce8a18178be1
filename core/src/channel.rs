//! Typed notification channels consumed by presentation layers.

use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Values a subscriber may leave undrained before new ones are discarded.
pub const SUBSCRIBER_BACKLOG: usize = 256;

/// Fans published values out to every live subscriber.
///
/// Each subscriber owns a receiver holding at most [`SUBSCRIBER_BACKLOG`]
/// values. Subscribers must drain it; while it is full, newly published values
/// skip that subscriber. Subscribers that dropped their receiver are pruned the
/// next time a value is published.
pub struct Publisher<T> {
    senders: Vec<Sender<T>>,
}

impl<T: Clone> Publisher<T> {
    /// Creates a publisher without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Registers a new subscriber and returns its receiving end.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (sender, receiver) = bounded(SUBSCRIBER_BACKLOG);
        self.senders.push(sender);
        receiver
    }

    /// Delivers `value` to every subscriber that is still listening.
    pub fn publish(&mut self, value: T) {
        self.senders.retain(|sender| {
            !matches!(
                sender.try_send(value.clone()),
                Err(TrySendError::Disconnected(_))
            )
        });
    }

    /// Number of subscribers that were live at the last publication.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}

impl<T: Clone> Default for Publisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.senders.len())
            .finish()
    }
}
