mod file_config;

pub use file_config::{FileConfig, MetadataConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub metadata_url: String,
    pub metadata_timeout_sec: u64,
    pub enrichment_file: PathBuf,
    pub disable_enrichment_file: bool,
    pub mock_metadata_port: Option<u16>,
    pub cors_allow_all: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub cors_allow_all: bool,
    pub metadata_url: String,
    pub metadata_timeout_sec: u64,
    /// `None` when the local enrichment overlay is disabled.
    pub enrichment_file: Option<PathBuf>,
    pub mock_metadata_port: Option<u16>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let metadata = file.metadata.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.db_path.clone());
        if db_path.as_os_str().is_empty() {
            bail!("db_path must be specified via --db-path or in config file");
        }
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port != 0 && port == metrics_port {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let cors_allow_all = file.cors_allow_all.unwrap_or(cli.cors_allow_all);

        let metadata_url = metadata
            .url
            .unwrap_or_else(|| cli.metadata_url.clone());
        if !metadata_url.starts_with("http://") && !metadata_url.starts_with("https://") {
            bail!(
                "metadata_url must be an http(s) URL, got {:?}",
                metadata_url
            );
        }

        let metadata_timeout_sec = metadata.timeout_sec.unwrap_or(cli.metadata_timeout_sec);
        if metadata_timeout_sec == 0 {
            bail!("metadata_timeout_sec must be greater than zero");
        }

        let disable_enrichment_file = metadata
            .disable_enrichment_file
            .unwrap_or(cli.disable_enrichment_file);
        let enrichment_file = if disable_enrichment_file {
            None
        } else {
            Some(
                metadata
                    .enrichment_file
                    .map(PathBuf::from)
                    .unwrap_or_else(|| cli.enrichment_file.clone()),
            )
        };

        let mock_metadata_port = metadata.mock_port.or(cli.mock_metadata_port);

        Ok(Self {
            db_path,
            port,
            metrics_port,
            logging_level,
            cors_allow_all,
            metadata_url,
            metadata_timeout_sec,
            enrichment_file,
            mock_metadata_port,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn base_cli(dir: &TempDir) -> CliConfig {
        CliConfig {
            db_path: dir.path().join("songs.db"),
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            metadata_url: "http://localhost:8081".to_string(),
            metadata_timeout_sec: 10,
            enrichment_file: PathBuf::from("song_enrichment.json"),
            disable_enrichment_file: false,
            mock_metadata_port: None,
            cors_allow_all: true,
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("body"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            mock_metadata_port: Some(8081),
            logging_level: RequestsLoggingLevel::Headers,
            ..base_cli(&temp_dir)
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_path, temp_dir.path().join("songs.db"));
        assert_eq!(config.port, 3001);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.metadata_url, "http://localhost:8081");
        assert_eq!(config.metadata_timeout_sec, 10);
        assert_eq!(
            config.enrichment_file,
            Some(PathBuf::from("song_enrichment.json"))
        );
        assert_eq!(config.mock_metadata_port, Some(8081));
        assert!(config.cors_allow_all);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = base_cli(&temp_dir);
        let file_config = FileConfig {
            db_path: Some(
                temp_dir
                    .path()
                    .join("other.db")
                    .to_string_lossy()
                    .to_string(),
            ),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            cors_allow_all: Some(false),
            metadata: Some(MetadataConfig {
                url: Some("https://metadata.example.com".to_string()),
                enrichment_file: Some("/etc/tunes/overlay.json".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_path, temp_dir.path().join("other.db"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert!(!config.cors_allow_all);
        assert_eq!(config.metadata_url, "https://metadata.example.com");
        assert_eq!(
            config.enrichment_file,
            Some(PathBuf::from("/etc/tunes/overlay.json"))
        );
        // CLI value used when TOML doesn't specify
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.metadata_timeout_sec, 10);
    }

    #[test]
    fn test_resolve_disabled_enrichment_file() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            disable_enrichment_file: true,
            ..base_cli(&temp_dir)
        };

        let config = AppConfig::resolve(&cli, None).unwrap();
        assert!(config.enrichment_file.is_none());
    }

    #[test]
    fn test_resolve_missing_db_path_error() {
        let cli = CliConfig::default();
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_path must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: PathBuf::from("/nonexistent/path/that/should/not/exist/songs.db"),
            ..base_cli(&temp_dir)
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_db_path_is_directory_error() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: temp_dir.path().to_path_buf(),
            ..base_cli(&temp_dir)
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("is a directory"));
    }

    #[test]
    fn test_resolve_rejects_bad_metadata_settings() {
        let temp_dir = TempDir::new().unwrap();

        let cli = CliConfig {
            metadata_url: "localhost:8081".to_string(),
            ..base_cli(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None)
            .unwrap_err()
            .to_string()
            .contains("metadata_url"));

        let cli = CliConfig {
            metadata_timeout_sec: 0,
            ..base_cli(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None)
            .unwrap_err()
            .to_string()
            .contains("metadata_timeout_sec"));
    }

    #[test]
    fn test_resolve_rejects_port_clash() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            metrics_port: 3001,
            ..base_cli(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None)
            .unwrap_err()
            .to_string()
            .contains("must differ"));
    }
}
