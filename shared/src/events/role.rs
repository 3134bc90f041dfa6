use std::collections::HashSet;

/// A permission held by an entity, such as "admin"
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Role(u16);

impl Role {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleSet {
    roles: HashSet<Role>,
}

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the role was already held
    pub fn grant(&mut self, role: Role) -> bool {
        self.roles.insert(role)
    }

    /// Returns false if the role was not held
    pub fn revoke(&mut self, role: &Role) -> bool {
        self.roles.remove(role)
    }

    pub fn has(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
