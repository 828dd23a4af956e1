//! External catalog types.
//!
//! Snapshots of entries coming back from the external audiobook catalog.
//! Raw responses are validated here, at the adapter boundary, before they
//! reach the matching engine.

mod types;

pub use types::{Asin, CatalogItem, EnrichedItem, RawCatalogRecord};
