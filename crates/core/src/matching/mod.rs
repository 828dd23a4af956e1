//! Audiobook identity matching.
//!
//! Reconciles external catalog entries against the local media library and
//! in-flight requests: staged identifier matching first, fuzzy text
//! similarity as the fallback.

mod engine;
mod text;

pub use engine::{MatchQuery, MatcherConfig, MatchingEngine};
pub use text::{normalize, normalize_isbn, similarity};
