//! Thing — the aggregate root of the model.
//!
//! A [`Thing`] owns its properties, the templates of the actions and events
//! it supports, every action instance requested so far, and the event log.
//! It renders all the JSON descriptions exposed over the wire, keeping every
//! href derived from the current `href_prefix`.
//!
//! `Thing` is a plain value with `&mut self` mutators. Serializing access,
//! spawning action work and delivering notifications is the job of the
//! application layer.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue, json};

use crate::action::Action;
use crate::arena::ActionArena;
use crate::available::{AvailableAction, AvailableEvent};
use crate::error::{NotFoundError, ValidationError, WebThingError};
use crate::event::Event;
use crate::id::ActionId;
use crate::property::Property;
use crate::schema::SchemaValidator;

/// JSON-LD context advertised in every thing description.
pub const DEFAULT_CONTEXT: &str = "https://webthings.io/schemas";

/// A virtual device exposing properties, actions and events.
#[derive(Debug, Clone)]
pub struct Thing {
    id: String,
    context: String,
    at_type: Vec<String>,
    title: String,
    description: String,
    properties: BTreeMap<String, Property>,
    available_actions: BTreeMap<String, AvailableAction>,
    available_events: BTreeMap<String, AvailableEvent>,
    actions: BTreeMap<String, ActionArena>,
    events: Vec<Event>,
    href_prefix: String,
    ui_href: Option<String>,
}

impl Thing {
    /// Create a builder for constructing a [`Thing`].
    #[must_use]
    pub fn builder() -> ThingBuilder {
        ThingBuilder::default()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    #[must_use]
    pub fn at_type(&self) -> &[String] {
        &self.at_type
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The thing's own href; `/` when no prefix is set.
    #[must_use]
    pub fn href(&self) -> &str {
        if self.href_prefix.is_empty() {
            "/"
        } else {
            &self.href_prefix
        }
    }

    #[must_use]
    pub fn href_prefix(&self) -> &str {
        &self.href_prefix
    }

    #[must_use]
    pub fn ui_href(&self) -> Option<&str> {
        self.ui_href.as_deref()
    }

    pub fn set_ui_href(&mut self, href: impl Into<String>) {
        self.ui_href = Some(href.into());
    }

    /// Set the prefix of every href of this thing, its properties and its
    /// live actions.
    pub fn set_href_prefix(&mut self, prefix: impl Into<String>) {
        self.href_prefix = prefix.into();
        for property in self.properties.values_mut() {
            property.set_href_prefix(self.href_prefix.clone());
        }
        for arena in self.actions.values_mut() {
            for action in arena.iter_mut() {
                action.set_href_prefix(self.href_prefix.clone());
            }
        }
    }

    // -- properties ---------------------------------------------------------

    /// Add (or replace) a property, aligning its href with this thing.
    pub fn add_property(&mut self, mut property: Property) {
        property.set_href_prefix(self.href_prefix.clone());
        self.properties.insert(property.name().to_string(), property);
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Property> {
        self.properties.remove(name)
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Every property, ordered by name.
    pub fn iter_properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Current value of a property, if it exists and has a value.
    #[must_use]
    pub fn property_value(&self, name: &str) -> Option<JsonValue> {
        self.properties.get(name)?.value().get()
    }

    /// `{name: value}` for every property; absent values render as `null`.
    #[must_use]
    pub fn properties(&self) -> Map<String, JsonValue> {
        self.properties
            .iter()
            .map(|(name, p)| (name.clone(), p.value().get().unwrap_or(JsonValue::Null)))
            .collect()
    }

    /// `{name: description}` for every property.
    #[must_use]
    pub fn property_descriptions(&self) -> Map<String, JsonValue> {
        self.properties
            .iter()
            .map(|(name, p)| (name.clone(), p.as_description()))
            .collect()
    }

    // -- templates ----------------------------------------------------------

    pub fn add_available_action(&mut self, name: impl Into<String>, metadata: JsonValue) {
        let name = name.into();
        self.actions.entry(name.clone()).or_default();
        self.available_actions
            .insert(name, AvailableAction::new(metadata));
    }

    pub fn add_available_event(&mut self, name: impl Into<String>, metadata: JsonValue) {
        self.available_events
            .insert(name.into(), AvailableEvent::new(metadata));
    }

    #[must_use]
    pub fn available_action(&self, name: &str) -> Option<&AvailableAction> {
        self.available_actions.get(name)
    }

    #[must_use]
    pub fn available_event(&self, name: &str) -> Option<&AvailableEvent> {
        self.available_events.get(name)
    }

    // -- actions ------------------------------------------------------------

    /// Validate a request and record a new action in the `created` state.
    ///
    /// Returns a snapshot of the recorded action.
    ///
    /// # Errors
    ///
    /// - [`WebThingError::NotFound`] when `name` is not an available action
    /// - [`WebThingError::Validation`] ([`ValidationError::InvalidInput`])
    ///   when `input` fails the declared schema
    ///
    /// Nothing is recorded on error.
    pub fn request_action(
        &mut self,
        name: &str,
        input: Option<JsonValue>,
        validator: &dyn SchemaValidator,
    ) -> Result<Action, WebThingError> {
        self.check_action_request(name, input.as_ref(), validator)?;

        let action = Action::new(name, input, &self.href_prefix);
        self.actions
            .entry(name.to_string())
            .or_default()
            .push(action.clone());
        Ok(action)
    }

    /// Check that `name` is available and `input` satisfies its schema,
    /// without recording anything.
    ///
    /// # Errors
    ///
    /// Same as [`request_action`](Self::request_action).
    pub fn check_action_request(
        &self,
        name: &str,
        input: Option<&JsonValue>,
        validator: &dyn SchemaValidator,
    ) -> Result<(), WebThingError> {
        let template = self
            .available_actions
            .get(name)
            .ok_or_else(|| NotFoundError::new("action", name))?;

        template
            .validate_input(input, validator)
            .map_err(|violations| ValidationError::InvalidInput {
                action: name.to_string(),
                violations,
            })?;
        Ok(())
    }

    /// Look up a live action. Total: unknown names and ids yield `None`.
    #[must_use]
    pub fn action(&self, name: &str, id: ActionId) -> Option<&Action> {
        self.actions.get(name)?.get(id)
    }

    /// Move an action to `pending`; returns the snapshot on transition.
    pub fn start_action(&mut self, name: &str, id: ActionId) -> Option<Action> {
        let action = self.actions.get_mut(name)?.get_mut(id)?;
        action.start().then(|| action.clone())
    }

    /// Move an action to `completed`; returns the snapshot on transition.
    pub fn finish_action(&mut self, name: &str, id: ActionId) -> Option<Action> {
        let action = self.actions.get_mut(name)?.get_mut(id)?;
        action.finish().then(|| action.clone())
    }

    /// Tombstone a live action, returning it.
    pub fn remove_action(&mut self, name: &str, id: ActionId) -> Option<Action> {
        self.actions.get_mut(name)?.remove(id)
    }

    /// Live actions of `name` in creation order.
    pub fn actions_named(&self, name: &str) -> impl Iterator<Item = &Action> {
        self.actions.get(name).into_iter().flat_map(ActionArena::iter)
    }

    /// Descriptions of live actions, optionally restricted to one name.
    #[must_use]
    pub fn action_descriptions(&self, name: Option<&str>) -> Vec<JsonValue> {
        match name {
            Some(name) => self
                .actions_named(name)
                .map(Action::as_action_description)
                .collect(),
            None => self
                .actions
                .values()
                .flat_map(ActionArena::iter)
                .map(Action::as_action_description)
                .collect(),
        }
    }

    // -- events -------------------------------------------------------------

    /// Append an event to the log.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the event name is not an available
    /// event. The event is recorded anyway; only notification is refused.
    pub fn add_event(&mut self, event: Event) -> Result<(), NotFoundError> {
        let known = self.available_events.contains_key(event.name());
        let name = event.name().to_string();
        self.events.push(event);
        if known {
            Ok(())
        } else {
            Err(NotFoundError::new("event", name))
        }
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Descriptions of logged events, optionally filtered by name
    /// (case-insensitive).
    #[must_use]
    pub fn event_descriptions(&self, name: Option<&str>) -> Vec<JsonValue> {
        self.events
            .iter()
            .filter(|e| name.is_none_or(|n| e.name().eq_ignore_ascii_case(n)))
            .map(Event::as_event_description)
            .collect()
    }

    // -- description --------------------------------------------------------

    /// Full thing description.
    #[must_use]
    pub fn as_thing_description(&self) -> JsonValue {
        let actions: Map<String, JsonValue> = self
            .available_actions
            .iter()
            .map(|(name, a)| (name.clone(), a.as_description(name, &self.href_prefix)))
            .collect();
        let events: Map<String, JsonValue> = self
            .available_events
            .iter()
            .map(|(name, e)| (name.clone(), e.as_description(name, &self.href_prefix)))
            .collect();

        let mut links: Vec<JsonValue> = ["properties", "actions", "events"]
            .iter()
            .map(|rel| json!({"rel": rel, "href": format!("{}/{rel}", self.href_prefix)}))
            .collect();
        if let Some(ui) = &self.ui_href {
            links.push(json!({"rel": "alternate", "mediaType": "text/html", "href": ui}));
        }

        let mut description = json!({
            "id": self.id,
            "title": self.title,
            "@context": self.context,
            "@type": self.at_type,
            "properties": self.property_descriptions(),
            "actions": actions,
            "events": events,
            "links": links,
            "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
            "security": "nosec_sc",
        });
        if !self.description.is_empty() {
            description["description"] = json!(self.description);
        }
        description
    }
}

/// Step-by-step builder for [`Thing`].
#[derive(Debug, Default)]
pub struct ThingBuilder {
    id: Option<String>,
    title: Option<String>,
    at_type: Vec<String>,
    description: Option<String>,
    context: Option<String>,
}

impl ThingBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add one semantic `@type` tag.
    #[must_use]
    pub fn at_type(mut self, at_type: impl Into<String>) -> Self {
        self.at_type.push(at_type.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Consume the builder and return a [`Thing`].
    ///
    /// The id defaults to a random `urn:uuid:` URN.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] when no title was given.
    pub fn build(self) -> Result<Thing, ValidationError> {
        let title = self.title.unwrap_or_default();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(Thing {
            id: self
                .id
                .unwrap_or_else(|| format!("urn:uuid:{}", uuid::Uuid::new_v4())),
            context: self.context.unwrap_or_else(|| DEFAULT_CONTEXT.to_string()),
            at_type: self.at_type,
            title,
            description: self.description.unwrap_or_default(),
            properties: BTreeMap::new(),
            available_actions: BTreeMap::new(),
            available_events: BTreeMap::new(),
            actions: BTreeMap::new(),
            events: Vec::new(),
            href_prefix: String::new(),
            ui_href: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionStatus;
    use crate::schema::BasicSchemaValidator;
    use crate::value::Value;

    fn lamp() -> Thing {
        let mut thing = Thing::builder()
            .id("urn:dev:ops:my-lamp-1234")
            .title("My Lamp")
            .at_type("OnOffSwitch")
            .at_type("Light")
            .description("A web connected lamp")
            .build()
            .unwrap();
        thing.add_property(Property::new(
            "on",
            Value::new(true),
            json!({"type": "boolean", "title": "On/Off"}),
        ));
        thing.add_available_action(
            "fade",
            json!({
                "title": "Fade",
                "input": {
                    "type": "object",
                    "required": ["brightness", "duration"],
                    "properties": {
                        "brightness": {"type": "integer", "minimum": 0, "maximum": 100},
                        "duration": {"type": "integer", "minimum": 1}
                    }
                }
            }),
        );
        thing.add_available_action("toggle", json!({"title": "Toggle"}));
        thing.add_available_event("overheated", json!({"type": "number"}));
        thing
    }

    #[test]
    fn should_reject_empty_title() {
        let err = Thing::builder().title("  ").build().unwrap_err();
        assert_eq!(err, ValidationError::EmptyTitle);
    }

    #[test]
    fn should_default_id_to_uuid_urn() {
        let thing = Thing::builder().title("x").build().unwrap();
        assert!(thing.id().starts_with("urn:uuid:"));
        assert_eq!(thing.context(), DEFAULT_CONTEXT);
    }

    #[test]
    fn should_report_root_href_without_prefix() {
        let mut thing = lamp();
        assert_eq!(thing.href(), "/");
        thing.set_href_prefix("/things/3");
        assert_eq!(thing.href(), "/things/3");
    }

    #[test]
    fn should_not_create_action_for_unknown_name() {
        let mut thing = lamp();
        let err = thing
            .request_action("explode", None, &BasicSchemaValidator)
            .unwrap_err();
        assert!(matches!(err, WebThingError::NotFound(_)));
        assert!(thing.action_descriptions(None).is_empty());
        assert_eq!(thing.actions_named("explode").count(), 0);
    }

    #[test]
    fn should_not_create_action_when_input_fails_schema() {
        let mut thing = lamp();
        let err = thing
            .request_action("fade", Some(json!({"brightness": 500})), &BasicSchemaValidator)
            .unwrap_err();
        let WebThingError::Validation(ValidationError::InvalidInput { violations, .. }) = err
        else {
            panic!("expected invalid input");
        };
        assert_eq!(violations.len(), 2);
        assert_eq!(thing.actions_named("fade").count(), 0);
    }

    #[test]
    fn should_record_valid_action_in_created_state() {
        let mut thing = lamp();
        let action = thing
            .request_action(
                "fade",
                Some(json!({"brightness": 50, "duration": 5})),
                &BasicSchemaValidator,
            )
            .unwrap();
        assert_eq!(action.status(), ActionStatus::Created);
        assert_eq!(thing.action("fade", action.id()), Some(&action));
    }

    #[test]
    fn should_preserve_creation_order_per_name() {
        let mut thing = lamp();
        let ids: Vec<_> = (0..5)
            .map(|_| {
                thing
                    .request_action("toggle", None, &BasicSchemaValidator)
                    .unwrap()
                    .id()
            })
            .collect();
        let listed: Vec<_> = thing.actions_named("toggle").map(Action::id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn should_run_state_machine_through_thing() {
        let mut thing = lamp();
        let id = thing
            .request_action("toggle", None, &BasicSchemaValidator)
            .unwrap()
            .id();

        assert!(thing.start_action("toggle", id).is_some());
        assert!(thing.start_action("toggle", id).is_none());
        let done = thing.finish_action("toggle", id).unwrap();
        assert_eq!(done.status(), ActionStatus::Completed);
        assert!(done.time_completed().unwrap() >= done.time_requested());
        assert!(thing.finish_action("toggle", id).is_none());
    }

    #[test]
    fn should_remove_action_exactly_once() {
        let mut thing = lamp();
        let id = thing
            .request_action("toggle", None, &BasicSchemaValidator)
            .unwrap()
            .id();

        assert!(thing.remove_action("toggle", id).is_some());
        assert!(thing.remove_action("toggle", id).is_none());
        assert!(thing.action("toggle", id).is_none());
    }

    #[test]
    fn should_return_none_for_lookup_of_unknown_action() {
        let thing = lamp();
        assert!(thing.action("nope", ActionId::new()).is_none());
        assert!(thing.action("toggle", ActionId::new()).is_none());
    }

    #[test]
    fn should_propagate_href_prefix_to_properties_and_actions() {
        let mut thing = lamp();
        let id = thing
            .request_action("toggle", None, &BasicSchemaValidator)
            .unwrap()
            .id();

        thing.set_href_prefix("/things/0");

        let property_href = thing.property("on").unwrap().href();
        let action_href = thing.action("toggle", id).unwrap().href();
        assert!(property_href.starts_with("/things/0"));
        assert!(action_href.starts_with("/things/0"));
    }

    #[test]
    fn should_align_href_of_property_added_after_prefix() {
        let mut thing = lamp();
        thing.set_href_prefix("/things/2");
        thing.add_property(Property::new("brightness", Value::new(1), json!({})));
        assert_eq!(
            thing.property("brightness").unwrap().href(),
            "/things/2/properties/brightness"
        );
    }

    #[test]
    fn should_record_unknown_event_but_report_error() {
        let mut thing = lamp();
        let result = thing.add_event(Event::new("mystery", None));
        assert!(result.is_err());
        assert_eq!(thing.events().len(), 1);
    }

    #[test]
    fn should_filter_event_descriptions_case_insensitively() {
        let mut thing = lamp();
        thing
            .add_event(Event::new("overheated", Some(json!(101))))
            .unwrap();
        let _ = thing.add_event(Event::new("other", None));

        assert_eq!(thing.event_descriptions(None).len(), 2);
        assert_eq!(thing.event_descriptions(Some("OVERHEATED")).len(), 1);
    }

    #[test]
    fn should_render_properties_as_name_value_map() {
        let thing = lamp();
        assert_eq!(JsonValue::Object(thing.properties()), json!({"on": true}));
    }

    #[test]
    fn should_remove_property() {
        let mut thing = lamp();
        assert!(thing.remove_property("on").is_some());
        assert!(!thing.has_property("on"));
    }

    #[test]
    fn should_render_thing_description() {
        let mut thing = lamp();
        thing.set_href_prefix("/things/0");
        thing.set_ui_href("https://example.com/ui");

        let td = thing.as_thing_description();

        assert_eq!(td["id"], "urn:dev:ops:my-lamp-1234");
        assert_eq!(td["title"], "My Lamp");
        assert_eq!(td["@context"], DEFAULT_CONTEXT);
        assert_eq!(td["@type"], json!(["OnOffSwitch", "Light"]));
        assert_eq!(td["description"], "A web connected lamp");
        assert_eq!(
            td["properties"]["on"]["links"][0]["href"],
            "/things/0/properties/on"
        );
        assert_eq!(td["actions"]["fade"]["links"][0]["href"], "/things/0/actions/fade");
        assert_eq!(
            td["events"]["overheated"]["links"][0]["href"],
            "/things/0/events/overheated"
        );
        assert_eq!(td["links"][0], json!({"rel": "properties", "href": "/things/0/properties"}));
        assert_eq!(td["links"][3]["mediaType"], "text/html");
        assert_eq!(td["securityDefinitions"]["nosec_sc"]["scheme"], "nosec");
        assert_eq!(td["security"], "nosec_sc");
    }
}
