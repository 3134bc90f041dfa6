pub mod component;
pub mod entity;
pub mod segment;
pub mod world;
