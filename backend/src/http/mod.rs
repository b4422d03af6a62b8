//! HTTP server module for the dashboard.
//!
//! This module provides an axum-based HTTP server that serves the dashboard
//! page and a small JSON API over the controller.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Query/body parsing, forwarded token extraction         │
//! │  - JSON and SSE responses                                 │
//! │  - CORS, compression, error handling                      │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  DashboardController (services)                           │
//! │  - Sessions, refresh ordering, chart composition          │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db/)                                   │
//! │  - Synthetic / Local / Warehouse                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod page;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
