//! feedbrief domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `usecases`: The aggregation pipeline and summarization
//! - `clean`: Markup to plain text
//! - `filter`: Inclusion/exclusion rules

pub mod clean;
pub mod filter;
pub mod model;
pub mod ports;
pub mod usecases;

pub use filter::{FilterConfigError, FilterField, FilterMode, FilterRule};
pub use model::*;
pub use ports::*;
