pub mod allow_list;
pub mod event;
pub mod event_kinds;
pub mod role;
