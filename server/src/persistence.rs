use tessera_shared::Position;

/// Backing store for world contents. Calls return immediately; retrieved
/// entities arrive later as ordinary component adds on the tick loop.
pub trait Persistence: Send {
    /// Requests every persisted entity whose position lies in `[min, max)`
    fn retrieve_entities_in_range(&mut self, min: Position, max: Position);

    /// Requests that current world state be written back
    fn synchronize(&mut self);
}

/// Persistence that stores nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPersistence;

impl Persistence for NoPersistence {
    fn retrieve_entities_in_range(&mut self, _: Position, _: Position) {}

    fn synchronize(&mut self) {}
}
