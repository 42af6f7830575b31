//! Resource addressing — maps request paths onto things and their resources.
//!
//! The table is built once at startup and is immutable afterwards.
//!
//! Path shapes, relative to the base path:
//!
//! | mode     | thing root                                   | listing             |
//! |----------|----------------------------------------------|---------------------|
//! | single   | `/`, `/things/0`, `/things/<title>`          | `/things`           |
//! | multiple | `/things/<index>`, `/things/<title>`         | `/`, `/things`      |
//!
//! Below a thing root: `properties[/<name>]`, `actions[/<name>[/<id>]]`,
//! `events[/<name>]`. Trailing slashes are ignored and segments are
//! percent-decoded.

use std::borrow::Cow;

use crate::container::ThingsType;
use crate::services::thing_handle::ThingHandle;

/// A resource below a thing root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Thing,
    Properties,
    Property(String),
    Actions,
    ActionsByName(String),
    /// The id is left unparsed; an invalid id simply matches nothing.
    ActionInstance { name: String, id: String },
    Events,
    EventsByName(String),
}

/// Outcome of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Descriptions of every thing.
    ThingList,
    /// A resource of the thing at `index`.
    Thing { index: usize, resource: Resource },
}

/// Immutable routing table over a [`ThingsType`].
#[derive(Debug, Clone)]
pub struct Addressing {
    base_path: String,
    things: ThingsType,
}

impl Addressing {
    /// Build the table and root every thing's hrefs accordingly.
    ///
    /// A trailing `/` on `base_path` is dropped.
    #[must_use]
    pub fn new(base_path: &str, things: ThingsType) -> Self {
        let base_path = base_path.trim_end_matches('/').to_string();
        match &things {
            ThingsType::Single(thing) => thing.set_href_prefix(base_path.clone()),
            ThingsType::Multiple { things, .. } => {
                for (index, thing) in things.iter().enumerate() {
                    thing.set_href_prefix(format!("{base_path}/things/{index}"));
                }
            }
        }
        Self { base_path, things }
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn things(&self) -> &ThingsType {
        &self.things
    }

    #[must_use]
    pub fn thing(&self, index: usize) -> Option<&ThingHandle> {
        self.things.get(index)
    }

    /// Resolve a request path. `None` means nothing lives there.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<Route> {
        let rest = self.strip_base(path)?;
        let decoded: Vec<Cow<'_, str>> = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).unwrap_or(Cow::Borrowed(s)))
            .collect();
        let segments: Vec<&str> = decoded.iter().map(AsRef::as_ref).collect();

        match (&self.things, segments.as_slice()) {
            (_, ["things"]) => Some(Route::ThingList),
            (ThingsType::Multiple { .. }, []) => Some(Route::ThingList),
            (_, ["things", thing, rest @ ..]) => {
                let index = self.things.position(thing)?;
                Some(Route::Thing {
                    index,
                    resource: parse_resource(rest)?,
                })
            }
            (ThingsType::Single(_), rest) => Some(Route::Thing {
                index: 0,
                resource: parse_resource(rest)?,
            }),
            (ThingsType::Multiple { .. }, _) => None,
        }
    }

    fn strip_base<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.base_path.is_empty() {
            return Some(path);
        }
        let rest = path.strip_prefix(self.base_path.as_str())?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }
}

fn parse_resource(segments: &[&str]) -> Option<Resource> {
    Some(match segments {
        [] => Resource::Thing,
        ["properties"] => Resource::Properties,
        ["properties", name] => Resource::Property((*name).to_string()),
        ["actions"] => Resource::Actions,
        ["actions", name] => Resource::ActionsByName((*name).to_string()),
        ["actions", name, id] => Resource::ActionInstance {
            name: (*name).to_string(),
            id: (*id).to_string(),
        },
        ["events"] => Resource::Events,
        ["events", name] => Resource::EventsByName((*name).to_string()),
        _ => return None,
    })
}
