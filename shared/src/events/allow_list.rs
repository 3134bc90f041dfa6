use std::collections::HashSet;

use super::event::EventKind;

/// Set of event kinds a deployment role will send or accept
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowList {
    kinds: HashSet<EventKind>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&mut self, kind: EventKind) -> &mut Self {
        self.kinds.insert(kind);
        self
    }

    pub fn contains(&self, kind: &EventKind) -> bool {
        self.kinds.contains(kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl FromIterator<EventKind> for AllowList {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}
