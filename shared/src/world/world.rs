use std::{
    any::{type_name, Any, TypeId},
    collections::{HashMap, HashSet},
};

use log::debug;

use crate::EntityId;

use super::component::{
    component_event::ComponentEventReceiver,
    component_store::{Component, ComponentStore},
    error::ComponentError,
};

trait ErasedStore: Send + Sync {
    fn commit(&mut self) -> usize;
    fn stage_remove(&mut self, entity: EntityId) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn commit(&mut self) -> usize {
        ComponentStore::commit(self).len()
    }

    fn stage_remove(&mut self, entity: EntityId) -> bool {
        self.remove(entity)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns one [`ComponentStore`] per registered component type and hands out
/// entity ids.
///
/// The World belongs to the tick loop. Systems stage mutations through it
/// during a tick and [`commit`](Self::commit) applies them all at the tick
/// boundary.
pub struct World {
    stores: HashMap<TypeId, Box<dyn ErasedStore>>,
    commit_order: Vec<TypeId>,
    next_entity: u64,
    entities: HashSet<EntityId>,
    despawning: Vec<EntityId>,
}

impl World {
    pub fn new() -> Self {
        Self {
            stores: HashMap::new(),
            commit_order: Vec::new(),
            next_entity: 1,
            entities: HashSet::new(),
            despawning: Vec::new(),
        }
    }

    // Components

    pub fn register<T: Component>(&mut self) -> Result<(), ComponentError> {
        let type_id = TypeId::of::<T>();
        if self.stores.contains_key(&type_id) {
            return Err(ComponentError::AlreadyRegistered {
                component: type_name::<T>(),
            });
        }
        self.stores
            .insert(type_id, Box::new(ComponentStore::<T>::new()));
        self.commit_order.push(type_id);
        Ok(())
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.stores.contains_key(&TypeId::of::<T>())
    }

    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|store| store.as_any().downcast_ref::<ComponentStore<T>>())
    }

    pub fn store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<T>>())
    }

    pub fn subscribe<T: Component>(&mut self) -> Result<ComponentEventReceiver, ComponentError> {
        Ok(self.try_store_mut::<T>()?.subscribe())
    }

    // Entities

    /// Allocates a fresh entity id. Ids are never reused.
    pub fn spawn(&mut self) -> EntityId {
        let entity = EntityId::from_u64(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(entity);
        entity
    }

    /// Registers an id allocated elsewhere, such as an entity restored by
    /// persistence. Later [`spawn`](Self::spawn) calls skip past it.
    pub fn insert_entity(&mut self, entity: EntityId) -> Result<(), ComponentError> {
        if self.entities.contains(&entity) {
            return Err(ComponentError::EntityAlreadyExists { entity });
        }
        self.entities.insert(entity);
        self.next_entity = self.next_entity.max(entity.to_u64().saturating_add(1));
        Ok(())
    }

    /// Queues removal of every component of the entity. The id stops being
    /// valid at the next commit.
    pub fn despawn(&mut self, entity: &EntityId) -> Result<(), ComponentError> {
        if !self.entities.contains(entity) || self.despawning.contains(entity) {
            return Err(ComponentError::EntityNotFound { entity: *entity });
        }
        for store in self.stores.values_mut() {
            store.stage_remove(*entity);
        }
        self.despawning.push(*entity);
        Ok(())
    }

    pub fn has_entity(&self, entity: &EntityId) -> bool {
        self.entities.contains(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // Staging

    pub fn add<T: Component>(&mut self, entity: &EntityId, value: T) -> Result<(), ComponentError> {
        self.check_live(entity)?;
        self.try_store_mut::<T>()?.add(*entity, value)
    }

    pub fn update<T: Component>(
        &mut self,
        entity: &EntityId,
        value: T,
    ) -> Result<(), ComponentError> {
        self.check_live(entity)?;
        self.try_store_mut::<T>()?.update(*entity, value)
    }

    /// Returns whether a removal was queued
    pub fn remove<T: Component>(&mut self, entity: &EntityId) -> Result<bool, ComponentError> {
        Ok(self.try_store_mut::<T>()?.remove(*entity))
    }

    pub fn get<T: Component>(&self, entity: &EntityId) -> Option<&T> {
        self.store::<T>()?.get(entity)
    }

    // Commit

    /// Commits every store in registration order. Returns the number of
    /// notifications sent.
    pub fn commit(&mut self) -> usize {
        let mut notifications = 0;
        for type_id in &self.commit_order {
            if let Some(store) = self.stores.get_mut(type_id) {
                notifications += store.commit();
            }
        }
        for entity in self.despawning.drain(..) {
            self.entities.remove(&entity);
            debug!("Despawned {}", entity);
        }
        notifications
    }

    // Private

    fn check_live(&self, entity: &EntityId) -> Result<(), ComponentError> {
        if self.entities.contains(entity) && !self.despawning.contains(entity) {
            Ok(())
        } else {
            Err(ComponentError::EntityNotFound { entity: *entity })
        }
    }

    fn try_store_mut<T: Component>(&mut self) -> Result<&mut ComponentStore<T>, ComponentError> {
        self.store_mut::<T>().ok_or(ComponentError::NotRegistered {
            component: type_name::<T>(),
        })
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
