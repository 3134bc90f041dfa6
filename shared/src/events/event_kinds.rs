use std::collections::HashMap;

use crate::protocol::ProtocolError;

use super::event::EventKind;

/// Registration table of event kinds, each with a unique name
#[derive(Clone, Debug, Default)]
pub struct EventKinds {
    names: HashMap<EventKind, String>,
    kinds: HashMap<String, EventKind>,
}

impl EventKinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&mut self, kind: EventKind, name: &str) -> Result<(), ProtocolError> {
        if self.names.contains_key(&kind) {
            return Err(ProtocolError::DuplicateEventKind { kind });
        }
        if self.kinds.contains_key(name) {
            return Err(ProtocolError::DuplicateEventName {
                name: name.to_string(),
            });
        }
        self.names.insert(kind, name.to_string());
        self.kinds.insert(name.to_string(), kind);
        Ok(())
    }

    pub fn contains(&self, kind: &EventKind) -> bool {
        self.names.contains_key(kind)
    }

    pub fn name(&self, kind: &EventKind) -> Option<&str> {
        self.names.get(kind).map(String::as_str)
    }

    pub fn kind(&self, name: &str) -> Option<EventKind> {
        self.kinds.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
