//! Concrete adapter implementations for ports.

pub mod env_config_adapter;
pub mod file_archive;
pub mod file_config_adapter;
pub mod gist_publisher;
pub mod http;
pub mod replay_source;
pub mod stdout_publisher;
pub mod taapi_source;
