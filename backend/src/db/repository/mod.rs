//! Repository abstraction over the metric data sources.

pub mod error;
pub mod metrics;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use metrics::{MetricRepository, QueryContext};
