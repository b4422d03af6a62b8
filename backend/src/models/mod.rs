pub mod date_range;
pub mod macros;
pub mod metric;

pub use date_range::*;
pub use metric::*;
