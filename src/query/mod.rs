//! Bounded query execution.

mod executor;

pub use executor::{Execution, QueryExecutor};
