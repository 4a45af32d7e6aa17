//! Network preprocessing: dense indices and sampled, scaled parameters.

pub mod indices;
pub mod parameters;

pub use indices::{build_index, get_index_from_prop, IndexError, Indices, IndexingSet};
pub use parameters::{resolve_index_from_prop, ModelParameters, ParameterError, ScaleConfig};
