use std::{any::type_name, collections::HashMap, mem};

use crate::EntityId;

use super::{
    component_event::{ComponentEvent, ComponentEventReceiver, ComponentEventSender},
    error::ComponentError,
};

/// Marker for values that can live in a [`ComponentStore`]
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

enum Mutation<T> {
    Add(T),
    Update(T),
    Remove,
}

// net effect of a commit on one entity
struct Touched {
    was_present: bool,
    changed: bool,
}

/// Dense storage for one component type.
///
/// Mutations are staged with [`add`](Self::add), [`update`](Self::update) and
/// [`remove`](Self::remove) and only become visible to readers when
/// [`commit`](Self::commit) runs. Subscribers are notified after the whole
/// queue has been applied, so a notified consumer always reads post-commit
/// values.
pub struct ComponentStore<T: Component> {
    entities: Vec<EntityId>,
    values: Vec<T>,
    slots: HashMap<EntityId, usize>,
    queue: Vec<(EntityId, Mutation<T>)>,
    // net presence after the queued mutations, only for entities in the queue
    pending: HashMap<EntityId, bool>,
    sender: ComponentEventSender,
}

impl<T: Component> ComponentStore<T> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            values: Vec::new(),
            slots: HashMap::new(),
            queue: Vec::new(),
            pending: HashMap::new(),
            sender: ComponentEventSender::new(type_name::<T>()),
        }
    }

    // Staging

    /// Queues the addition of a component. Fails if the entity has the
    /// component once every mutation queued so far is applied.
    pub fn add(&mut self, entity: EntityId, value: T) -> Result<(), ComponentError> {
        if self.net_contains(&entity) {
            return Err(ComponentError::DuplicateComponent {
                entity,
                component: type_name::<T>(),
            });
        }
        self.queue.push((entity, Mutation::Add(value)));
        self.pending.insert(entity, true);
        Ok(())
    }

    /// Queues a new value for an existing component
    pub fn update(&mut self, entity: EntityId, value: T) -> Result<(), ComponentError> {
        if !self.net_contains(&entity) {
            return Err(ComponentError::ComponentNotFound {
                entity,
                component: type_name::<T>(),
            });
        }
        self.queue.push((entity, Mutation::Update(value)));
        Ok(())
    }

    /// Queues removal of a component. Returns false and queues nothing if the
    /// entity will not have the component anyway.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        if !self.net_contains(&entity) {
            return false;
        }
        self.queue.push((entity, Mutation::Remove));
        self.pending.insert(entity, false);
        true
    }

    // Reads

    /// Returns the committed value, ignoring anything still queued
    pub fn get(&self, entity: &EntityId) -> Option<&T> {
        self.slots.get(entity).map(|slot| &self.values[*slot])
    }

    pub fn contains(&self, entity: &EntityId) -> bool {
        self.slots.contains_key(entity)
    }

    /// True if the component is not committed yet but will be once the
    /// queued mutations are applied. An add followed by a remove in the same
    /// tick is not pending.
    pub fn is_pending_add(&self, entity: &EntityId) -> bool {
        !self.contains(entity) && self.pending.get(entity) == Some(&true)
    }

    /// Committed, or about to be
    pub fn contains_or_pending(&self, entity: &EntityId) -> bool {
        self.contains(entity) || self.is_pending_add(entity)
    }

    pub fn has_pending_mutations(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &T)> {
        self.entities.iter().zip(self.values.iter())
    }

    // Subscriptions

    /// Registers a new subscriber. It receives notifications for every commit
    /// from now on.
    pub fn subscribe(&mut self) -> ComponentEventReceiver {
        self.sender.new_receiver()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    // Commit

    /// Applies every queued mutation in FIFO order, then notifies subscribers.
    /// Returns the notifications that were sent.
    pub fn commit(&mut self) -> Vec<ComponentEvent> {
        let queue = mem::take(&mut self.queue);
        self.pending.clear();
        if queue.is_empty() {
            return Vec::new();
        }

        let mut order = Vec::new();
        let mut touched: HashMap<EntityId, Touched> = HashMap::new();

        for (entity, mutation) in queue {
            let state = touched.entry(entity).or_insert_with(|| {
                order.push(entity);
                Touched {
                    was_present: self.slots.contains_key(&entity),
                    changed: false,
                }
            });
            match mutation {
                Mutation::Add(value) => {
                    if state.was_present {
                        state.changed = true;
                    }
                    self.insert_committed(entity, value);
                }
                Mutation::Update(value) => {
                    if let Some(slot) = self.slots.get(&entity) {
                        self.values[*slot] = value;
                        state.changed = true;
                    }
                }
                Mutation::Remove => {
                    self.remove_committed(&entity);
                    state.changed = true;
                }
            }
        }

        let mut events = Vec::with_capacity(order.len());
        for entity in order {
            let Some(state) = touched.get(&entity) else {
                continue;
            };
            let is_present = self.slots.contains_key(&entity);
            let event = match (state.was_present, is_present) {
                (false, true) => ComponentEvent::Added(entity),
                (true, false) => ComponentEvent::Removed(entity),
                (true, true) if state.changed => ComponentEvent::Modified(entity),
                _ => continue,
            };
            events.push(event);
        }

        self.sender.send(&events);

        events
    }

    // Private

    fn net_contains(&self, entity: &EntityId) -> bool {
        match self.pending.get(entity) {
            Some(present) => *present,
            None => self.slots.contains_key(entity),
        }
    }

    fn insert_committed(&mut self, entity: EntityId, value: T) {
        if let Some(slot) = self.slots.get(&entity) {
            self.values[*slot] = value;
            return;
        }
        self.slots.insert(entity, self.values.len());
        self.entities.push(entity);
        self.values.push(value);
    }

    fn remove_committed(&mut self, entity: &EntityId) -> Option<T> {
        let slot = self.slots.remove(entity)?;
        let value = self.values.swap_remove(slot);
        self.entities.swap_remove(slot);
        if let Some(moved) = self.entities.get(slot) {
            self.slots.insert(*moved, slot);
        }
        Some(value)
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
