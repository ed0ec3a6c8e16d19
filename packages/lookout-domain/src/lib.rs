pub mod saved_search;
pub mod schema;
pub mod triage;

pub use saved_search::SavedSearch;
pub use schema::{Salvaged, SchemaError};
