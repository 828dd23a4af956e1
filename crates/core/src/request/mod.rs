//! Request and download-history persistence.
//!
//! A `Request` is a user's ask for one catalog item to be acquired; each
//! acquisition attempt is a `DownloadHistory` row carrying exactly one
//! protocol handle. The store enforces the one-live-request-per-identifier
//! invariant.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteRequestStore;
pub use store::{NewDownloadHistory, NewRequest, RequestStore, StoreError};
pub use types::{
    ClientKind, DownloadHandle, DownloadHistory, DownloadStatus, Lifecycle, Request, RequestStatus,
};
