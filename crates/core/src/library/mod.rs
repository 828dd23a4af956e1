//! Media library view.
//!
//! Entries already present in the media library, owned by an external
//! library-sync process. This core only reads them, always in batch.

mod types;

pub use types::{LibraryEntry, LibraryError, LibraryStore, RawLibraryRecord};
