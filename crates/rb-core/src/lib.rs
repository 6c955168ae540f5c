//! recipe-board/crates/rb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for recipe-board.

pub mod classify;
pub mod error;
pub mod models;
pub mod resolve;
pub mod service;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use classify::*;
pub use error::*;
pub use models::*;
pub use service::{Kitchen, Ports};
pub use traits::*;
