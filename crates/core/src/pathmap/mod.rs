//! Remote path mapping.
//!
//! Download clients often run in a container or on another host and report
//! file paths in their own filesystem view. These pure functions translate a
//! client-reported path into the path visible here.

use std::path::MAIN_SEPARATOR;

use crate::config::RemotePathConfig;
use crate::error::CoreError;

/// Translate a client-reported path into the host's view.
///
/// Returns the input unchanged when mapping is disabled or when the path does
/// not start with the configured remote prefix. Otherwise the prefix is
/// replaced with the local one, the remainder is preserved, and separators
/// are normalized for the host platform.
pub fn transform(remote_path: &str, config: &RemotePathConfig) -> String {
    if !config.enabled || config.remote_path.is_empty() {
        return remote_path.to_string();
    }

    let Some(remainder) = remote_path.strip_prefix(&config.remote_path) else {
        return remote_path.to_string();
    };

    let local = config.local_path.trim_end_matches(['/', '\\']);
    let joined = if remainder.is_empty() || remainder.starts_with(['/', '\\']) {
        format!("{local}{remainder}")
    } else {
        format!("{local}{MAIN_SEPARATOR}{remainder}")
    };

    joined.replace(['/', '\\'], &MAIN_SEPARATOR.to_string())
}

/// Reject a mapping config that is enabled with either path missing.
///
/// Both paths are required together or not at all.
pub fn validate(config: &RemotePathConfig) -> Result<(), CoreError> {
    if config.enabled && (config.remote_path.is_empty() || config.local_path.is_empty()) {
        return Err(CoreError::Configuration(
            "remote path mapping is enabled but remote_path/local_path is empty".to_string(),
        ));
    }
    Ok(())
}
