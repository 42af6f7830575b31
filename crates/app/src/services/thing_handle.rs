//! Thread-safe handle around a domain [`Thing`].
//!
//! All mutation of the thing's collections is serialized by one mutex. The
//! lock is never held across an `.await`, nor while forwarders, observers,
//! action factories or subscribers run: every operation takes what it needs
//! under the lock, releases it, then calls out and notifies.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value as JsonValue};
use tokio::task::JoinHandle;
use webthing_domain::action::Action;
use webthing_domain::error::{NotFoundError, WebThingError};
use webthing_domain::event::Event;
use webthing_domain::id::{ActionId, SubscriberId};
use webthing_domain::notification::Notification;
use webthing_domain::property::Property;
use webthing_domain::schema::{BasicSchemaValidator, SchemaValidator};
use webthing_domain::thing::Thing;
use webthing_domain::value::{ObserverId, Value};

use crate::fanout::SubscriberSet;
use crate::ports::{ActionFactory, ActionHandler, Subscriber};
use crate::services::executor;

/// Shared handle to one thing. Clones refer to the same thing.
#[derive(Clone)]
pub struct ThingHandle {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    subscribers: SubscriberSet,
    validator: Arc<dyn SchemaValidator>,
}

struct State {
    thing: Thing,
    factories: HashMap<String, Arc<dyn ActionFactory>>,
    handlers: HashMap<ActionId, Arc<dyn ActionHandler>>,
    observers: HashMap<String, (Value, ObserverId)>,
}

impl ThingHandle {
    /// Wrap `thing`, validating action input with [`BasicSchemaValidator`].
    #[must_use]
    pub fn new(thing: Thing) -> Self {
        Self::with_validator(thing, Arc::new(BasicSchemaValidator))
    }

    /// Wrap `thing` with a custom schema validator.
    ///
    /// Properties already on `thing` are hooked into the notification path
    /// the same way [`add_property`](Self::add_property) hooks new ones.
    #[must_use]
    pub fn with_validator(thing: Thing, validator: Arc<dyn SchemaValidator>) -> Self {
        let values: Vec<(String, Value)> = thing
            .iter_properties()
            .map(|p| (p.name().to_string(), p.value().clone()))
            .collect();
        let handle = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    thing,
                    factories: HashMap::new(),
                    handlers: HashMap::new(),
                    observers: HashMap::new(),
                }),
                subscribers: SubscriberSet::default(),
                validator,
            }),
        };
        for (name, value) in values {
            let observer = handle.observe(&name, &value);
            handle.lock().observers.insert(name, (value, observer));
        }
        handle
    }

    // -- identity & description ---------------------------------------------

    #[must_use]
    pub fn id(&self) -> String {
        self.lock().thing.id().to_string()
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.lock().thing.title().to_string()
    }

    /// The thing's href (`/` when mounted at the root).
    #[must_use]
    pub fn href(&self) -> String {
        self.lock().thing.href().to_string()
    }

    #[must_use]
    pub fn href_prefix(&self) -> String {
        self.lock().thing.href_prefix().to_string()
    }

    /// Re-root the thing, its properties and live actions under `prefix`.
    pub fn set_href_prefix(&self, prefix: impl Into<String>) {
        self.lock().thing.set_href_prefix(prefix);
    }

    pub fn set_ui_href(&self, href: impl Into<String>) {
        self.lock().thing.set_ui_href(href);
    }

    /// Full thing description.
    #[must_use]
    pub fn description(&self) -> JsonValue {
        self.lock().thing.as_thing_description()
    }

    // -- properties ---------------------------------------------------------

    /// Add a property and hook its value into the notification path.
    ///
    /// Replacing a property of the same name detaches the previous one.
    pub fn add_property(&self, property: Property) {
        let name = property.name().to_string();
        let value = property.value().clone();
        let observer = self.observe(&name, &value);

        let replaced = {
            let mut state = self.lock();
            state.thing.add_property(property);
            state.observers.insert(name, (value, observer))
        };
        if let Some((old_value, old_observer)) = replaced {
            old_value.unobserve(old_observer);
        }
    }

    /// Remove a property. Returns `false` when it did not exist.
    pub fn remove_property(&self, name: &str) -> bool {
        let (removed, observer) = {
            let mut state = self.lock();
            let removed = state.thing.remove_property(name).is_some();
            (removed, state.observers.remove(name))
        };
        if let Some((value, id)) = observer {
            value.unobserve(id);
        }
        removed
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.lock().thing.has_property(name)
    }

    /// Current value of a property; `null` when it has none yet.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the property does not exist.
    pub fn property_value(&self, name: &str) -> Result<JsonValue, NotFoundError> {
        let state = self.lock();
        if !state.thing.has_property(name) {
            return Err(NotFoundError::new("property", name));
        }
        Ok(state.thing.property_value(name).unwrap_or(JsonValue::Null))
    }

    /// The shared [`Value`] behind a property, for device-side updates.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        self.lock()
            .thing
            .property(name)
            .map(|p| p.value().clone())
    }

    /// `{name: value}` for every property.
    #[must_use]
    pub fn properties(&self) -> Map<String, JsonValue> {
        self.lock().thing.properties()
    }

    /// Validate and write a property, forwarding it to the device.
    ///
    /// Subscribers receive a `propertyStatus` when the value changed.
    ///
    /// # Errors
    ///
    /// - [`WebThingError::NotFound`] for an unknown property
    /// - [`WebThingError::Validation`] when the value is rejected (nothing
    ///   changes)
    /// - [`WebThingError::Forwarding`] when the device rejected the value
    ///   (the value is still recorded)
    pub fn set_property(&self, name: &str, value: JsonValue) -> Result<(), WebThingError> {
        let target = {
            let state = self.lock();
            let property = state
                .thing
                .property(name)
                .ok_or_else(|| NotFoundError::new("property", name))?;
            property.validate_value(&value)?;
            property.value().clone()
        };
        target.set(value)?;
        Ok(())
    }

    // -- actions ------------------------------------------------------------

    /// Register an action type: its metadata (with optional `input` schema)
    /// and the factory producing a handler per request.
    pub fn add_available_action(
        &self,
        name: impl Into<String>,
        metadata: JsonValue,
        factory: impl ActionFactory + 'static,
    ) {
        let name = name.into();
        let mut state = self.lock();
        state.thing.add_available_action(name.clone(), metadata);
        state.factories.insert(name, Arc::new(factory));
    }

    #[must_use]
    pub fn has_available_action(&self, name: &str) -> bool {
        self.lock().thing.available_action(name).is_some()
    }

    /// Validate and record a new action in the `created` state, then notify.
    /// The caller decides when to [`start`](Self::start_action) it.
    ///
    /// # Errors
    ///
    /// - [`WebThingError::NotFound`] for an unknown action name
    /// - [`WebThingError::Validation`] when the input fails the schema
    ///
    /// Nothing is recorded on error.
    pub fn request_action(
        &self,
        name: &str,
        input: Option<JsonValue>,
    ) -> Result<Action, WebThingError> {
        let factory = self.lock().factories.get(name).cloned();
        let handler = factory.map(|f| f.create());

        let action = {
            let mut state = self.lock();
            let action =
                state
                    .thing
                    .request_action(name, input, self.inner.validator.as_ref())?;
            if let Some(handler) = handler {
                state.handlers.insert(action.id(), handler);
            }
            action
        };

        tracing::debug!(action = name, id = %action.id(), "action created");
        self.inner
            .subscribers
            .broadcast(&Notification::action_status(&action));
        Ok(action)
    }

    /// Validate an action request without recording it.
    ///
    /// # Errors
    ///
    /// Same as [`request_action`](Self::request_action).
    pub fn check_action_request(
        &self,
        name: &str,
        input: Option<&JsonValue>,
    ) -> Result<(), WebThingError> {
        self.lock()
            .thing
            .check_action_request(name, input, self.inner.validator.as_ref())
    }

    /// Start a previously requested action on its own task.
    pub fn start_action(&self, action: &Action) -> JoinHandle<()> {
        executor::spawn(self.clone(), action)
    }

    /// Request and immediately start an action.
    ///
    /// Returns the action as created; progress is observed by polling or
    /// through notifications.
    ///
    /// # Errors
    ///
    /// Same as [`request_action`](Self::request_action).
    pub fn perform_action(
        &self,
        name: &str,
        input: Option<JsonValue>,
    ) -> Result<Action, WebThingError> {
        let action = self.request_action(name, input)?;
        drop(self.start_action(&action));
        Ok(action)
    }

    /// Snapshot of a live action. Unknown names or ids yield `None`.
    #[must_use]
    pub fn action(&self, name: &str, id: ActionId) -> Option<Action> {
        self.lock().thing.action(name, id).cloned()
    }

    /// Descriptions of live actions, optionally restricted to one name.
    #[must_use]
    pub fn action_descriptions(&self, name: Option<&str>) -> Vec<JsonValue> {
        self.lock().thing.action_descriptions(name)
    }

    /// Tombstone an action and ask its handler to cancel.
    ///
    /// Returns `false` when no live action matches.
    pub fn remove_action(&self, name: &str, id: ActionId) -> bool {
        let handler = {
            let mut state = self.lock();
            if state.thing.remove_action(name, id).is_none() {
                return false;
            }
            state.handlers.remove(&id)
        };
        if let Some(handler) = handler {
            handler.cancel();
        }
        tracing::debug!(action = name, %id, "action removed");
        true
    }

    pub(crate) fn action_handler(&self, id: ActionId) -> Option<Arc<dyn ActionHandler>> {
        self.lock().handlers.get(&id).cloned()
    }

    /// `created → pending`, notifying on transition.
    pub(crate) fn mark_started(&self, name: &str, id: ActionId) -> bool {
        let started = self.lock().thing.start_action(name, id);
        match started {
            Some(action) => {
                self.inner
                    .subscribers
                    .broadcast(&Notification::action_status(&action));
                true
            }
            None => false,
        }
    }

    /// `→ completed`, notifying on transition.
    pub(crate) fn mark_finished(&self, name: &str, id: ActionId) {
        let finished = {
            let mut state = self.lock();
            state.handlers.remove(&id);
            state.thing.finish_action(name, id)
        };
        if let Some(action) = finished {
            self.inner
                .subscribers
                .broadcast(&Notification::action_status(&action));
        }
    }

    // -- events -------------------------------------------------------------

    pub fn add_available_event(&self, name: impl Into<String>, metadata: JsonValue) {
        self.lock().thing.add_available_event(name, metadata);
    }

    #[must_use]
    pub fn has_available_event(&self, name: &str) -> bool {
        self.lock().thing.available_event(name).is_some()
    }

    /// Record an event and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the event name is not an available
    /// event; the event is recorded but not broadcast.
    pub fn add_event(&self, event: Event) -> Result<(), NotFoundError> {
        let notification = Notification::event(&event);
        self.lock().thing.add_event(event)?;
        self.inner.subscribers.broadcast(&notification);
        Ok(())
    }

    /// Descriptions of logged events, optionally filtered by name.
    #[must_use]
    pub fn event_descriptions(&self, name: Option<&str>) -> Vec<JsonValue> {
        self.lock().thing.event_descriptions(name)
    }

    // -- subscribers --------------------------------------------------------

    pub fn add_subscriber(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = self.inner.subscribers.add(subscriber);
        tracing::debug!(subscriber = %id, "subscriber added");
        id
    }

    /// Unregister and close a subscriber. Returns `false` when unknown.
    pub fn remove_subscriber(&self, id: SubscriberId) -> bool {
        let Some(subscriber) = self.inner.subscribers.remove(id) else {
            return false;
        };
        if let Err(err) = subscriber.close() {
            tracing::debug!(subscriber = %id, error = %err, "subscriber close failed");
        }
        tracing::debug!(subscriber = %id, "subscriber removed");
        true
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Broadcast `propertyStatus` for `name` on every change of `value`.
    fn observe(&self, name: &str, value: &Value) -> ObserverId {
        let weak = Arc::downgrade(&self.inner);
        let observed = name.to_string();
        value.observe(move |v| {
            if let Some(inner) = weak.upgrade() {
                inner
                    .subscribers
                    .broadcast(&Notification::property_status(&observed, v.clone()));
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ThingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ThingHandle")
            .field("id", &state.thing.id())
            .field("title", &state.thing.title())
            .field("subscribers", &self.inner.subscribers)
            .finish_non_exhaustive()
    }
}
