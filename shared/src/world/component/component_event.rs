use std::{
    collections::VecDeque,
    sync::{Arc, RwLock, Weak},
};

use log::warn;

use crate::EntityId;

use super::error::ComponentError;

/// A change notification emitted by a [`ComponentStore`](super::ComponentStore)
/// once a commit has been applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentEvent {
    Added(EntityId),
    Removed(EntityId),
    Modified(EntityId),
}

impl ComponentEvent {
    pub fn entity(&self) -> EntityId {
        match self {
            ComponentEvent::Added(entity)
            | ComponentEvent::Removed(entity)
            | ComponentEvent::Modified(entity) => *entity,
        }
    }
}

type EventQueue = RwLock<VecDeque<ComponentEvent>>;

// ComponentEventSender
pub(crate) struct ComponentEventSender {
    component: &'static str,
    receivers: Vec<Weak<EventQueue>>,
}

impl ComponentEventSender {
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            receivers: Vec::new(),
        }
    }

    pub fn new_receiver(&mut self) -> ComponentEventReceiver {
        let queue = Arc::new(RwLock::new(VecDeque::new()));
        self.receivers.push(Arc::downgrade(&queue));

        ComponentEventReceiver {
            component: self.component,
            queue,
        }
    }

    pub fn send(&mut self, events: &[ComponentEvent]) {
        if events.is_empty() {
            return;
        }

        // dropped receivers are pruned here
        let component = self.component;
        self.receivers.retain(|receiver| {
            let Some(queue) = receiver.upgrade() else {
                return false;
            };
            let Ok(mut queue) = queue.write() else {
                warn!("Dropping {} events for a poisoned {} receiver", events.len(), component);
                return true;
            };
            queue.extend(events.iter().copied());
            true
        });
    }

    pub fn receiver_count(&self) -> usize {
        self.receivers
            .iter()
            .filter(|receiver| receiver.strong_count() > 0)
            .count()
    }
}

// ComponentEventReceiver
/// The receiving end of a store subscription. Events accumulate until
/// [`receive`](Self::receive) drains them.
#[derive(Clone)]
pub struct ComponentEventReceiver {
    component: &'static str,
    queue: Arc<EventQueue>,
}

impl ComponentEventReceiver {
    /// Name of the component type this receiver is subscribed to
    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Takes every event received since the last call, oldest first
    pub fn receive(&self) -> Result<Vec<ComponentEvent>, ComponentError> {
        let mut queue = self
            .queue
            .write()
            .map_err(|_| ComponentError::ReceiverPoisoned {
                component: self.component,
            })?;
        Ok(queue.drain(..).collect())
    }

    pub fn is_empty(&self) -> Result<bool, ComponentError> {
        let queue = self
            .queue
            .read()
            .map_err(|_| ComponentError::ReceiverPoisoned {
                component: self.component,
            })?;
        Ok(queue.is_empty())
    }
}
