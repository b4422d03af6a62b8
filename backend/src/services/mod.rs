//! Service layer for business logic and orchestration.
//!
//! This module sits between the repositories and the HTTP layer: it generates
//! synthetic data, composes charts, and drives per-session refreshes.

pub mod charts;
pub mod controller;
pub mod generator;
pub mod session;

pub use charts::{compose_chart, Figure};
pub use controller::{ControllerError, DashboardController};
pub use generator::SyntheticGenerator;
pub use session::{DashboardSession, SessionStore};
