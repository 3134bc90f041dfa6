use std::collections::HashMap;

use log::trace;

use tessera_shared::{Event, EventKind, InboundEnvelope};

use crate::TesseraServerError;

type Handler<M, C> = Box<dyn FnMut(&mut C, &InboundEnvelope<M>) + Send>;

struct Registration<M, C> {
    name: String,
    handler: Handler<M, C>,
}

/// Maps inbound event kinds to named handler closures. Kinds and names are
/// both unique within a registry.
pub struct HandlerRegistry<M: Event, C> {
    handlers: HashMap<EventKind, Registration<M, C>>,
    names: HashMap<String, EventKind>,
}

impl<M: Event, C> HandlerRegistry<M, C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            names: HashMap::new(),
        }
    }

    pub fn register<F>(
        &mut self,
        kind: EventKind,
        name: &str,
        handler: F,
    ) -> Result<&mut Self, TesseraServerError>
    where
        F: FnMut(&mut C, &InboundEnvelope<M>) + Send + 'static,
    {
        if self.handlers.contains_key(&kind) {
            return Err(TesseraServerError::DuplicateHandlerKind { kind });
        }
        if self.names.contains_key(name) {
            return Err(TesseraServerError::DuplicateHandlerName {
                name: name.to_string(),
            });
        }

        self.names.insert(name.to_string(), kind);
        self.handlers.insert(
            kind,
            Registration {
                name: name.to_string(),
                handler: Box::new(handler),
            },
        );
        Ok(self)
    }

    /// Removes the handler registered under `name`
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(kind) = self.names.remove(name) else {
            return false;
        };
        self.handlers.remove(&kind).is_some()
    }

    pub fn has_handler(&self, kind: &EventKind) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn handler_name(&self, kind: &EventKind) -> Option<&str> {
        self.handlers
            .get(kind)
            .map(|registration| registration.name.as_str())
    }

    pub fn kind_of(&self, name: &str) -> Option<EventKind> {
        self.names.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns false if no handler is registered for the event's kind
    pub fn dispatch(&mut self, context: &mut C, envelope: &InboundEnvelope<M>) -> bool {
        let kind = envelope.event.kind();
        let Some(registration) = self.handlers.get_mut(&kind) else {
            trace!("No handler for {}", kind);
            return false;
        };
        (registration.handler)(context, envelope);
        true
    }

    /// Dispatches in order and returns how many envelopes had no handler
    pub fn dispatch_all<I>(&mut self, context: &mut C, envelopes: I) -> usize
    where
        I: IntoIterator<Item = InboundEnvelope<M>>,
    {
        envelopes
            .into_iter()
            .filter(|envelope| !self.dispatch(context, envelope))
            .count()
    }
}

impl<M: Event, C> Default for HandlerRegistry<M, C> {
    fn default() -> Self {
        Self::new()
    }
}
