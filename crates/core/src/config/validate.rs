use std::collections::HashSet;

use crate::request::ClientKind;

use super::{types::Config, ConfigError, IndexerSeedingPolicy};

/// Validate configuration
/// Currently validates:
/// - The configured default client has a client section
/// - Remote path mapping fields are present when enabled
/// - Seeding policy indexer names are unique and thresholds are sane
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    match config.download.default_client {
        ClientKind::Torrent => {
            if config.qbittorrent.is_none() {
                return Err(ConfigError::ValidationError(
                    "download.default_client is \"torrent\" but [qbittorrent] is missing"
                        .to_string(),
                ));
            }
        }
        ClientKind::Usenet => {
            if config.sabnzbd.is_none() {
                return Err(ConfigError::ValidationError(
                    "download.default_client is \"usenet\" but [sabnzbd] is missing".to_string(),
                ));
            }
        }
    }

    if let Some(qbt) = &config.qbittorrent {
        if qbt.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "qbittorrent.url cannot be empty".to_string(),
            ));
        }
    }
    if let Some(sab) = &config.sabnzbd {
        if sab.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "sabnzbd.url cannot be empty".to_string(),
            ));
        }
    }

    // Both mapping paths are required together or not at all.
    if config.remote_path.enabled
        && (config.remote_path.remote_path.is_empty() || config.remote_path.local_path.is_empty())
    {
        return Err(ConfigError::ValidationError(
            "remote_path is enabled but remote_path/local_path is empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for policy in &config.seeding_policies {
        if policy.indexer().is_empty() {
            return Err(ConfigError::ValidationError(
                "seeding policy indexer name cannot be empty".to_string(),
            ));
        }
        if !seen.insert(policy.indexer()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate seeding policy for indexer \"{}\"",
                policy.indexer()
            )));
        }
        if let IndexerSeedingPolicy::Torrent {
            seeding_time_minutes: 0,
            name,
        } = policy
        {
            return Err(ConfigError::ValidationError(format!(
                "seeding_time_minutes for \"{}\" cannot be 0",
                name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_from_str, QBittorrentConfig, RemotePathConfig};

    fn make_config() -> Config {
        let mut config = Config::default();
        config.qbittorrent = Some(QBittorrentConfig {
            url: "http://localhost:8080".to_string(),
            username: "admin".to_string(),
            password: "adminadmin".to_string(),
            timeout_secs: 30,
        });
        config
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&make_config()).is_ok());
    }

    #[test]
    fn test_validate_missing_client_section() {
        let config = Config::default();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_enabled_mapping_with_empty_local_path() {
        let mut config = make_config();
        config.remote_path = RemotePathConfig {
            enabled: true,
            remote_path: "/downloads".to_string(),
            local_path: String::new(),
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_disabled_mapping_with_empty_fields_ok() {
        let mut config = make_config();
        config.remote_path = RemotePathConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_duplicate_policy_names() {
        let mut config = make_config();
        config.seeding_policies = vec![
            IndexerSeedingPolicy::Torrent {
                name: "IndexerA".to_string(),
                seeding_time_minutes: 30,
            },
            IndexerSeedingPolicy::Usenet {
                name: "IndexerA".to_string(),
                remove_after_processing: false,
            },
        ];
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_seeding_time() {
        let mut config = make_config();
        config.seeding_policies = vec![IndexerSeedingPolicy::Torrent {
            name: "IndexerA".to_string(),
            seeding_time_minutes: 0,
        }];
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_parsed_config() {
        let config = load_config_from_str(
            r#"
[qbittorrent]
url = "http://localhost:8080"
username = "admin"
password = "adminadmin"
"#,
        )
        .unwrap();
        assert!(validate_config(&config).is_ok());
    }
}
