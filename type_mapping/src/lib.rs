//! Unified value mapping between Rust types and SQL bind parameters
//! This crate provides the value sum shared by the clause model, the drivers and the hydrator

pub mod serialize;
pub mod types;
pub mod wire;

pub use serialize::{from_json, record_to_json, to_json};
pub use types::Value;
pub use wire::WireType;
