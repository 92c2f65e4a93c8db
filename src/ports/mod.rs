//! Port traits (interfaces) for hexagonal architecture.

pub mod config_port;
pub mod indicator_source;
pub mod publisher;
