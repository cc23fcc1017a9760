pub mod body;
pub mod connector;
pub mod error;
pub mod facet;
pub mod math;
pub mod operations;

pub use error::{GeofacetError, Result};
