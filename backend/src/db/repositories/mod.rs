//! Repository implementations module.
//!
//! This module contains the implementations of the `MetricRepository` trait:
//! - `synthetic`: data generated on every read
//! - `local`: in-memory warehouse snapshot for local development and tests
//! - `warehouse`: SQL warehouse over Diesel (`warehouse` feature)
pub mod local;
pub mod synthetic;
pub mod warehouse;

pub use local::LocalRepository;
pub use synthetic::SyntheticRepository;
pub use warehouse::{AuthStrategy, WarehouseConfig};
#[cfg(feature = "warehouse")]
pub use warehouse::WarehouseRepository;
