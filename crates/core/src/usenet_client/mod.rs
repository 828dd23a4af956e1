//! Usenet download client adapters.

mod sabnzbd;
mod types;

pub use sabnzbd::SabnzbdClient;
pub use types::{UsenetClient, UsenetClientError};
