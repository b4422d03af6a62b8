//! # Fuel Margin Dashboard
//!
//! Backend for a web dashboard of daily fuel-retail margin metrics.
//!
//! Six metric tables (gallons, net margin, market pricing, transactions,
//! margin components and market price delta) are read over a user-selected
//! date range from one of several interchangeable sources and rendered as
//! Plotly figures.
//!
//! ## Architecture
//!
//! - [`models`]: Date ranges, metric rows and tables
//! - [`db`]: Repository trait, configuration and the synthetic, local and warehouse backends
//! - [`services`]: Data generator, chart composer, sessions and the dashboard controller
//! - [`api`]: Serializable view types shared by the controller and the HTTP layer
//! - [`http`]: Axum-based HTTP server, embedded page and SSE updates
//! - [`logging`]: `tracing` subscriber setup for the binaries
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod logging;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
