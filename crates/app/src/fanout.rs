//! Notification fan-out to every registered subscriber.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use webthing_domain::id::SubscriberId;
use webthing_domain::notification::Notification;

use crate::ports::Subscriber;

/// The set of subscribers attached to one thing.
///
/// Broadcasting is best effort: a subscriber that fails to accept a message
/// is logged and skipped, and the triggering mutation is never failed.
/// The lock is released before any subscriber is called.
#[derive(Default)]
pub struct SubscriberSet {
    subscribers: Mutex<HashMap<SubscriberId, Arc<dyn Subscriber>>>,
}

impl SubscriberSet {
    /// Register a subscriber, returning its id.
    pub fn add(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId::new();
        self.lock().insert(id, subscriber);
        id
    }

    /// Unregister a subscriber, returning it if it was registered.
    pub fn remove(&self, id: SubscriberId) -> Option<Arc<dyn Subscriber>> {
        self.lock().remove(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Serialize `notification` once and send it to every subscriber.
    ///
    /// Returns the number of subscribers that accepted the message.
    pub fn broadcast(&self, notification: &Notification) -> usize {
        let message = match notification.to_message() {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(
                    message_type = notification.message_type(),
                    error = %err,
                    "failed to serialize notification"
                );
                return 0;
            }
        };

        let targets: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, s)| (*id, Arc::clone(s)))
            .collect();

        let mut delivered = 0;
        for (id, subscriber) in targets {
            match subscriber.send(&message) {
                Ok(()) => delivered += 1,
                Err(err) => tracing::warn!(
                    subscriber = %id,
                    message_type = notification.message_type(),
                    error = %err,
                    "notification delivery failed"
                ),
            }
        }
        delivered
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, Arc<dyn Subscriber>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Mutex, PoisonError};

    use serde_json::Value as JsonValue;

    use crate::ports::{Subscriber, SubscriberError};

    /// Records every message it receives.
    #[derive(Default)]
    pub struct RecordingSubscriber {
        messages: Mutex<Vec<String>>,
        pub closed: Mutex<bool>,
    }

    impl RecordingSubscriber {
        pub fn messages(&self) -> Vec<JsonValue> {
            self.messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|m| serde_json::from_str(m).unwrap())
                .collect()
        }

        pub fn of_type(&self, message_type: &str) -> Vec<JsonValue> {
            self.messages()
                .into_iter()
                .filter(|m| m["messageType"] == message_type)
                .collect()
        }
    }

    impl Subscriber for RecordingSubscriber {
        fn send(&self, message: &str) -> Result<(), SubscriberError> {
            self.messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.to_string());
            Ok(())
        }

        fn close(&self) -> Result<(), SubscriberError> {
            *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
            Ok(())
        }
    }

    /// Always fails.
    pub struct BrokenSubscriber;

    impl Subscriber for BrokenSubscriber {
        fn send(&self, _message: &str) -> Result<(), SubscriberError> {
            Err(SubscriberError::Disconnected)
        }

        fn close(&self) -> Result<(), SubscriberError> {
            Err(SubscriberError::Disconnected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{BrokenSubscriber, RecordingSubscriber};
    use super::*;
    use serde_json::json;

    #[test]
    fn should_deliver_to_every_subscriber() {
        let set = SubscriberSet::default();
        let a = Arc::new(RecordingSubscriber::default());
        let b = Arc::new(RecordingSubscriber::default());
        set.add(a.clone());
        set.add(b.clone());

        let delivered = set.broadcast(&Notification::property_status("on", json!(true)));

        assert_eq!(delivered, 2);
        assert_eq!(a.messages().len(), 1);
        assert_eq!(b.messages()[0]["data"]["on"], true);
    }

    #[test]
    fn should_skip_failing_subscriber() {
        let set = SubscriberSet::default();
        let good = Arc::new(RecordingSubscriber::default());
        set.add(Arc::new(BrokenSubscriber));
        set.add(good.clone());

        let delivered = set.broadcast(&Notification::property_status("on", json!(false)));

        assert_eq!(delivered, 1);
        assert_eq!(good.messages().len(), 1);
    }

    #[test]
    fn should_succeed_when_no_subscribers() {
        let set = SubscriberSet::default();
        assert_eq!(
            set.broadcast(&Notification::property_status("on", json!(1))),
            0
        );
    }

    #[test]
    fn should_stop_delivering_after_remove() {
        let set = SubscriberSet::default();
        let sub = Arc::new(RecordingSubscriber::default());
        let id = set.add(sub.clone());

        assert!(set.remove(id).is_some());
        assert!(set.remove(id).is_none());
        set.broadcast(&Notification::property_status("on", json!(1)));

        assert!(sub.messages().is_empty());
        assert!(set.is_empty());
    }
}
