use std::marker::PhantomData;

use crate::{EntityId, World};

use super::{
    component_event::{ComponentEvent, ComponentEventReceiver},
    component_store::Component,
    error::ComponentError,
};

/// Predicate over entity ids, evaluated against the current World
pub trait EntityFilter: Send + Sync {
    fn should_accept(&self, world: &World, entity: &EntityId) -> bool;
}

impl<F: Fn(&World, &EntityId) -> bool + Send + Sync> EntityFilter for F {
    fn should_accept(&self, world: &World, entity: &EntityId) -> bool {
        self(world, entity)
    }
}

/// Accepts every entity
pub fn accept_all() -> impl EntityFilter {
    |_: &World, _: &EntityId| true
}

/// Accepts entities that have `T` committed or pending. Used for
/// first-visibility gating, so a tag added this tick is seen before its
/// commit.
pub fn has_component<T: Component>() -> HasComponent<T> {
    HasComponent {
        phantom_t: PhantomData,
    }
}

pub struct HasComponent<T: Component> {
    phantom_t: PhantomData<fn() -> T>,
}

impl<T: Component> EntityFilter for HasComponent<T> {
    fn should_accept(&self, world: &World, entity: &EntityId) -> bool {
        world
            .store::<T>()
            .is_some_and(|store| store.contains_or_pending(entity))
    }
}

/// Narrows a store's change stream to the entities accepted by a filter
pub struct ComponentEventFilter {
    receiver: ComponentEventReceiver,
    filter: Box<dyn EntityFilter>,
}

impl ComponentEventFilter {
    pub fn new<F: EntityFilter + 'static>(receiver: ComponentEventReceiver, filter: F) -> Self {
        Self {
            receiver,
            filter: Box::new(filter),
        }
    }

    pub fn should_accept(&self, world: &World, entity: &EntityId) -> bool {
        self.filter.should_accept(world, entity)
    }

    /// Drains the underlying receiver, keeping only accepted events
    pub fn receive(&mut self, world: &World) -> Result<Vec<ComponentEvent>, ComponentError> {
        let events = self.receiver.receive()?;
        Ok(events
            .into_iter()
            .filter(|event| self.filter.should_accept(world, &event.entity()))
            .collect())
    }

    /// Drains the underlying receiver, pairing each event with the filter's
    /// verdict instead of dropping rejected ones
    pub fn receive_classified(
        &mut self,
        world: &World,
    ) -> Result<Vec<(ComponentEvent, bool)>, ComponentError> {
        let events = self.receiver.receive()?;
        Ok(events
            .into_iter()
            .map(|event| {
                let accepted = self.filter.should_accept(world, &event.entity());
                (event, accepted)
            })
            .collect())
    }
}
