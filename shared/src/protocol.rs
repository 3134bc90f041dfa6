use std::collections::HashMap;

use crate::{
    events::{allow_list::AllowList, event::EventKind, event_kinds::EventKinds, role::Role},
    HostType,
};

pub mod error;
pub use error::ProtocolError;

// Protocol Plugin
pub trait ProtocolPlugin {
    fn build(&self, protocol: &mut Protocol) -> Result<(), ProtocolError>;
}

/// Everything both ends agree on about replicated events: which kinds
/// exist, which kinds each deployment role sends and accepts, and which role
/// an entity needs to submit a kind.
#[derive(Clone, Debug)]
pub struct Protocol {
    pub event_kinds: EventKinds,
    outbound: HashMap<HostType, AllowList>,
    inbound: HashMap<HostType, AllowList>,
    required_roles: HashMap<EventKind, Role>,
    locked: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            event_kinds: EventKinds::new(),
            outbound: HashMap::new(),
            inbound: HashMap::new(),
            required_roles: HashMap::new(),
            locked: false,
        }
    }
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_plugin<P: ProtocolPlugin>(&mut self, plugin: P) -> Result<&mut Self, ProtocolError> {
        self.check_lock()?;
        plugin.build(self)?;
        Ok(self)
    }

    pub fn add_event(&mut self, kind: EventKind, name: &str) -> Result<&mut Self, ProtocolError> {
        self.check_lock()?;
        self.event_kinds.add_event(kind, name)?;
        Ok(self)
    }

    /// Lets `host` send events of `kind` to the wire
    pub fn allow_outbound(
        &mut self,
        host: HostType,
        kind: EventKind,
    ) -> Result<&mut Self, ProtocolError> {
        self.check_known(&kind)?;
        self.outbound.entry(host).or_default().allow(kind);
        Ok(self)
    }

    /// Lets `host` accept events of `kind` from the wire
    pub fn allow_inbound(
        &mut self,
        host: HostType,
        kind: EventKind,
    ) -> Result<&mut Self, ProtocolError> {
        self.check_known(&kind)?;
        self.inbound.entry(host).or_default().allow(kind);
        Ok(self)
    }

    /// Only entities holding `role` may submit events of `kind`
    pub fn require_role(&mut self, kind: EventKind, role: Role) -> Result<&mut Self, ProtocolError> {
        self.check_known(&kind)?;
        self.required_roles.insert(kind, role);
        Ok(self)
    }

    pub fn outbound_allow_list(&self, host: HostType) -> AllowList {
        self.outbound.get(&host).cloned().unwrap_or_default()
    }

    pub fn inbound_allow_list(&self, host: HostType) -> AllowList {
        self.inbound.get(&host).cloned().unwrap_or_default()
    }

    pub fn required_role(&self, kind: &EventKind) -> Option<Role> {
        self.required_roles.get(kind).copied()
    }

    pub fn required_roles(&self) -> &HashMap<EventKind, Role> {
        &self.required_roles
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }

    fn check_lock(&self) -> Result<(), ProtocolError> {
        if self.locked {
            return Err(ProtocolError::AlreadyLocked);
        }
        Ok(())
    }

    fn check_known(&self, kind: &EventKind) -> Result<(), ProtocolError> {
        self.check_lock()?;
        if !self.event_kinds.contains(kind) {
            return Err(ProtocolError::UnknownEventKind { kind: *kind });
        }
        Ok(())
    }
}
