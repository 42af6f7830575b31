//! Value — the last known state of one property.
//!
//! A [`Value`] sits between the thing representation and the physical (or
//! simulated) device. Commanded writes go through [`Value::set`], which
//! forwards the new value to the device before recording it. Device-driven
//! readings go through [`Value::notify_of_external_update`], which skips the
//! forwarders. Both paths converge on a single change check: observers are
//! notified only when the stored value actually changes.
//!
//! `Value` is a cheap, cloneable handle; all clones share the same state,
//! so a device can keep one while the owning property keeps another.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value as JsonValue;

use crate::error::ForwardError;

/// Pushes a commanded value into the device.
pub type Forwarder = Arc<dyn Fn(&JsonValue) -> Result<(), ForwardError> + Send + Sync>;

/// Called with the new value after every change.
pub type Observer = Arc<dyn Fn(&JsonValue) + Send + Sync>;

/// Handle returned by [`Value::observe`], used to detach the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
struct Inner {
    last: Option<JsonValue>,
    forwarders: Vec<Forwarder>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

/// Shared, observable property value.
#[derive(Clone, Default)]
pub struct Value {
    inner: Arc<Mutex<Inner>>,
}

impl Value {
    /// Create a value seeded with `initial`. A JSON `null` leaves it absent.
    #[must_use]
    pub fn new(initial: impl Into<JsonValue>) -> Self {
        let initial = initial.into();
        let value = Self::default();
        if !initial.is_null() {
            value.lock().last = Some(initial);
        }
        value
    }

    /// Add a forwarder, builder style.
    #[must_use]
    pub fn with_forwarder(
        self,
        forwarder: impl Fn(&JsonValue) -> Result<(), ForwardError> + Send + Sync + 'static,
    ) -> Self {
        self.add_forwarder(forwarder);
        self
    }

    pub fn add_forwarder(
        &self,
        forwarder: impl Fn(&JsonValue) -> Result<(), ForwardError> + Send + Sync + 'static,
    ) {
        self.lock().forwarders.push(Arc::new(forwarder));
    }

    /// Register an observer called after every change.
    pub fn observe(&self, observer: impl Fn(&JsonValue) + Send + Sync + 'static) -> ObserverId {
        let mut inner = self.lock();
        let id = ObserverId(inner.next_observer);
        inner.next_observer += 1;
        inner.observers.push((id, Arc::new(observer)));
        id
    }

    /// Detach an observer. Unknown ids are ignored.
    pub fn unobserve(&self, id: ObserverId) {
        self.lock().observers.retain(|(oid, _)| *oid != id);
    }

    /// Last known value, or `None` before the first write.
    #[must_use]
    pub fn get(&self) -> Option<JsonValue> {
        self.lock().last.clone()
    }

    /// Commanded write: forward to the device, then record the value.
    ///
    /// Every forwarder runs even if an earlier one failed, and the value is
    /// recorded regardless.
    ///
    /// # Errors
    ///
    /// Returns the first [`ForwardError`] raised by a forwarder.
    pub fn set(&self, value: JsonValue) -> Result<(), ForwardError> {
        let forwarders = self.lock().forwarders.clone();
        let mut first_error = None;
        for forward in &forwarders {
            if let Err(err) = forward(&value) {
                first_error.get_or_insert(err);
            }
        }

        self.notify_of_external_update(value);

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Device-driven update. Records `value` and notifies observers only
    /// when it is present and differs from the last known value.
    ///
    /// Returns `true` when the value changed.
    pub fn notify_of_external_update(&self, value: JsonValue) -> bool {
        if value.is_null() {
            return false;
        }

        let observers = {
            let mut inner = self.lock();
            if inner.last.as_ref() == Some(&value) {
                return false;
            }
            inner.last = Some(value.clone());
            inner
                .observers
                .iter()
                .map(|(_, observer)| Arc::clone(observer))
                .collect::<Vec<_>>()
        };

        for observer in observers {
            observer(&value);
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Value")
            .field("last", &inner.last)
            .field("forwarders", &inner.forwarders.len())
            .field("observers", &inner.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(value: &Value) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        value.observe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn should_be_absent_before_first_write() {
        assert_eq!(Value::default().get(), None);
        assert_eq!(Value::new(JsonValue::Null).get(), None);
    }

    #[test]
    fn should_return_seeded_value() {
        assert_eq!(Value::new(true).get(), Some(json!(true)));
    }

    #[test]
    fn should_notify_twice_for_two_distinct_values() {
        let value = Value::new(0);
        let count = counting(&value);

        value.set(json!(1)).unwrap();
        value.set(json!(2)).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(value.get(), Some(json!(2)));
    }

    #[test]
    fn should_notify_once_when_same_value_set_twice() {
        let value = Value::new(0);
        let count = counting(&value);

        value.set(json!(5)).unwrap();
        value.set(json!(5)).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_ignore_null_external_update() {
        let value = Value::new(3);
        let count = counting(&value);

        assert!(!value.notify_of_external_update(JsonValue::Null));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(value.get(), Some(json!(3)));
    }

    #[test]
    fn should_call_forwarders_on_set_but_not_on_external_update() {
        let forwarded = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&forwarded);
        let value = Value::new(false).with_forwarder(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        value.set(json!(true)).unwrap();
        value.notify_of_external_update(json!(false));

        assert_eq!(forwarded.load(Ordering::SeqCst), 1);
        assert_eq!(value.get(), Some(json!(false)));
    }

    #[test]
    fn should_record_value_and_surface_error_when_forwarder_fails() {
        let second_called = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&second_called);
        let value = Value::new(1)
            .with_forwarder(|_| Err(ForwardError::new("device offline")))
            .with_forwarder(move |_| {
                s.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let result = value.set(json!(2));

        assert!(result.is_err());
        assert_eq!(second_called.load(Ordering::SeqCst), 1);
        assert_eq!(value.get(), Some(json!(2)));
    }

    #[test]
    fn should_stop_notifying_after_unobserve() {
        let value = Value::new(0);
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let id = value.observe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        value.unobserve(id);
        value.set(json!(1)).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn should_share_state_between_clones() {
        let value = Value::new("a");
        let device_side = value.clone();
        device_side.notify_of_external_update(json!("b"));
        assert_eq!(value.get(), Some(json!("b")));
    }
}
