mod server;
pub use server::Server;

mod server_config;
pub use server_config::{MovementConfig, ServerConfig};

mod time_manager;
pub use time_manager::{TickAdvance, TimeManager};
