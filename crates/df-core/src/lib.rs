//! df-core/src/lib.rs
//!
//! The central domain types and interface definitions for DevFlow.

pub mod error;
pub mod models;
pub mod pagination;
pub mod query;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use pagination::*;
pub use query::*;
pub use traits::*;
