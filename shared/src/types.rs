pub type Tick = u16;

/// The deployment role of a process. Allow-lists are configured per role, so
/// a Client and a Server built from the same Protocol accept different event kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn invert(self) -> Self {
        match self {
            HostType::Server => HostType::Client,
            HostType::Client => HostType::Server,
        }
    }
}
