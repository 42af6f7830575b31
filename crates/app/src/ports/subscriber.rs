//! Subscriber port — a sink for change notifications.

/// Error raised when a notification cannot be delivered.
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    /// The remote end has gone away.
    #[error("subscriber disconnected")]
    Disconnected,

    /// Any other transport failure.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Receives serialized notifications (`{"messageType": …, "data": …}`).
///
/// Implementations must not block: `send` is called from whatever task
/// performed the mutation. Queue the message and return.
pub trait Subscriber: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriberError`] when the message cannot be queued.
    fn send(&self, message: &str) -> Result<(), SubscriberError>;

    /// Close the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriberError`] when the connection is already gone.
    fn close(&self) -> Result<(), SubscriberError>;
}
