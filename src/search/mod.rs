//! Search over the application directory.
//!
//! - `filter`: the pure query/facet filter
//! - `query`: raw input normalization
//! - `engine`: debounce, cancellation, and generation-guarded publication

pub mod engine;
pub mod filter;
pub mod query;

pub use engine::{SearchEngine, SearchPhase, SearchRequest, SearchSink, Trigger, OFFLOAD_THRESHOLD};
pub use filter::{filter, normalize_query, FacetSelection};
pub use query::QueryInput;
