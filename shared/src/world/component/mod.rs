pub mod component_event;
pub mod component_filter;
pub mod component_store;
pub mod error;
