//! Thing containers: one thing served at the root, or several under `/things`.

use std::borrow::Cow;

use crate::services::thing_handle::ThingHandle;

/// The set of things a server exposes.
#[derive(Debug, Clone)]
pub enum ThingsType {
    /// One thing owning the base path.
    Single(ThingHandle),
    /// Several things addressed by index or title, under a server name.
    Multiple {
        things: Vec<ThingHandle>,
        name: String,
    },
}

impl ThingsType {
    #[must_use]
    pub fn single(thing: ThingHandle) -> Self {
        Self::Single(thing)
    }

    #[must_use]
    pub fn multiple(things: Vec<ThingHandle>, name: impl Into<String>) -> Self {
        Self::Multiple {
            things,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single(_))
    }

    /// Server name: the thing's title in single mode.
    #[must_use]
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Self::Single(thing) => Cow::Owned(thing.title()),
            Self::Multiple { name, .. } => Cow::Borrowed(name),
        }
    }

    #[must_use]
    pub fn things(&self) -> &[ThingHandle] {
        match self {
            Self::Single(thing) => std::slice::from_ref(thing),
            Self::Multiple { things, .. } => things,
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ThingHandle> {
        self.things().get(index)
    }

    /// Resolve a path segment (an index or a title) to a thing index.
    #[must_use]
    pub fn position(&self, segment: &str) -> Option<usize> {
        if let Ok(index) = segment.parse::<usize>()
            && index < self.things().len()
        {
            return Some(index);
        }
        self.things().iter().position(|t| t.title() == segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webthing_domain::thing::Thing;

    fn thing(title: &str) -> ThingHandle {
        ThingHandle::new(Thing::builder().title(title).build().unwrap())
    }

    #[test]
    fn should_expose_single_thing_as_slice() {
        let things = ThingsType::single(thing("Lamp"));
        assert!(things.is_single());
        assert_eq!(things.things().len(), 1);
        assert_eq!(things.name(), "Lamp");
    }

    #[test]
    fn should_find_thing_by_index_or_title() {
        let things = ThingsType::multiple(vec![thing("Lamp"), thing("Sensor")], "Home");
        assert_eq!(things.name(), "Home");
        assert_eq!(things.position("1"), Some(1));
        assert_eq!(things.position("Sensor"), Some(1));
        assert_eq!(things.position("7"), None);
        assert_eq!(things.position("Toaster"), None);
    }
}
