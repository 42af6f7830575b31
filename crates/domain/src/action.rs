//! Action — a single requested invocation on a thing.
//!
//! Lifecycle: [`Created`](ActionStatus::Created) →
//! [`Pending`](ActionStatus::Pending) → [`Completed`](ActionStatus::Completed).
//! Each transition happens at most once; [`Action::start`] and
//! [`Action::finish`] report whether they changed anything so callers only
//! notify on real transitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

use crate::id::ActionId;
use crate::time::{self, Timestamp};

/// Status of an action instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    #[default]
    Created,
    Pending,
    Completed,
}

impl ActionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    id: ActionId,
    name: String,
    input: Option<JsonValue>,
    href_prefix: String,
    status: ActionStatus,
    time_requested: Timestamp,
    time_completed: Option<Timestamp>,
}

impl Action {
    /// Create a new action in the `created` state with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, input: Option<JsonValue>, href_prefix: &str) -> Self {
        Self {
            id: ActionId::new(),
            name: name.into(),
            input,
            href_prefix: href_prefix.to_string(),
            status: ActionStatus::Created,
            time_requested: time::now(),
            time_completed: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> ActionId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn input(&self) -> Option<&JsonValue> {
        self.input.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> ActionStatus {
        self.status
    }

    #[must_use]
    pub fn time_requested(&self) -> Timestamp {
        self.time_requested
    }

    #[must_use]
    pub fn time_completed(&self) -> Option<Timestamp> {
        self.time_completed
    }

    #[must_use]
    pub fn href(&self) -> String {
        format!("{}/actions/{}/{}", self.href_prefix, self.name, self.id)
    }

    pub fn set_href_prefix(&mut self, prefix: impl Into<String>) {
        self.href_prefix = prefix.into();
    }

    /// `created` → `pending`. Returns `false` from any other state.
    pub fn start(&mut self) -> bool {
        if self.status != ActionStatus::Created {
            return false;
        }
        self.status = ActionStatus::Pending;
        true
    }

    /// Move to `completed` and stamp the completion time.
    ///
    /// Idempotent: returns `false` and keeps the first timestamp when the
    /// action is already completed.
    pub fn finish(&mut self) -> bool {
        if self.status == ActionStatus::Completed {
            return false;
        }
        self.status = ActionStatus::Completed;
        self.time_completed = Some(time::now().max(self.time_requested));
        true
    }

    /// `{ <name>: {input?, href, status, timeRequested, timeCompleted?} }`
    #[must_use]
    pub fn as_action_description(&self) -> JsonValue {
        let mut body = Map::new();
        if let Some(input) = &self.input {
            body.insert("input".to_string(), input.clone());
        }
        body.insert("href".to_string(), json!(self.href()));
        body.insert("status".to_string(), json!(self.status.as_str()));
        body.insert(
            "timeRequested".to_string(),
            json!(time::format(&self.time_requested)),
        );
        if let Some(completed) = &self.time_completed {
            body.insert("timeCompleted".to_string(), json!(time::format(completed)));
        }

        let mut description = Map::new();
        description.insert(self.name.clone(), JsonValue::Object(body));
        JsonValue::Object(description)
    }
}
