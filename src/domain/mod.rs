//! Core domain types and logic.

pub mod bar;
pub mod config_validation;
pub mod decision;
pub mod error;
pub mod gap_fill;
pub mod indicator;
pub mod merge;
pub mod sample;
pub mod settings;
pub mod snapshot;
pub mod trend;
