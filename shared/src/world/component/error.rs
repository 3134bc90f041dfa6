use thiserror::Error;

use crate::EntityId;

/// Errors that can occur while staging mutations against component storage
///
/// Every variant here is an invariant violation surfaced to the system that
/// attempted the mutation. The caller decides whether to retry within the
/// same tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// Attempted to add a component that the entity already has (or will have
    /// once the queued mutations commit)
    #[error("Component {component} already exists on {entity}")]
    DuplicateComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// Attempted to update a component that the entity does not have (or will
    /// not have once the queued mutations commit)
    #[error("Component {component} not found on {entity}")]
    ComponentNotFound {
        entity: EntityId,
        component: &'static str,
    },

    /// The component type has no store in the World
    #[error("Component {component} has not been registered with the World")]
    NotRegistered { component: &'static str },

    /// The component type was registered twice
    #[error("Component {component} is already registered with the World")]
    AlreadyRegistered { component: &'static str },

    /// Attempted to mutate an entity that was never spawned or is already despawned
    #[error("{entity} does not exist in the World")]
    EntityNotFound { entity: EntityId },

    /// Attempted to insert an externally allocated id that is already live
    #[error("{entity} already exists in the World")]
    EntityAlreadyExists { entity: EntityId },

    /// The lock guarding a subscriber's event queue was poisoned
    #[error("Event queue for component {component} is poisoned")]
    ReceiverPoisoned { component: &'static str },
}
