mod types;

pub use types::*;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./webpforge.toml",
        "./config.toml",
        "~/.config/webpforge/config.toml",
        "/etc/webpforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Parse an "HH:MM" schedule time.
pub fn parse_schedule_time(time: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .with_context(|| format!("Invalid schedule time '{}', expected HH:MM", time))
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Quality values are range-checked by `Quality` during deserialization

    if config.source_extensions().is_empty() {
        anyhow::bail!("No convertible source extensions configured");
    }

    for root in config.source_roots() {
        if !root.exists() {
            tracing::warn!("Source path does not exist: {:?}", root);
        }
    }

    if !(-20..=19).contains(&config.batch.niceness) {
        anyhow::bail!(
            "Batch niceness {} is outside -20..=19",
            config.batch.niceness
        );
    }

    if config.batch.max_files == Some(0) {
        anyhow::bail!("batch.max_files must be at least 1 when set");
    }

    parse_schedule_time(&config.schedule.time)?;

    match config.metadata.backend {
        MetadataBackend::None => {}
        MetadataBackend::Sqlite | MetadataBackend::Json => {
            if config.metadata.path.is_none() {
                anyhow::bail!(
                    "Metadata backend {:?} requires metadata.path",
                    config.metadata.backend
                );
            }
        }
    }

    if let Some(cwebp) = &config.tools.cwebp_path {
        if !cwebp.exists() {
            tracing::warn!("Configured cwebp path does not exist: {:?}", cwebp);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.source_roots(), vec![Path::new("./uploads")]);
        assert_eq!(config.source_extensions(), vec!["jpg", "jpeg", "png"]);
        assert_eq!(config.batch.niceness, 19);
        assert_eq!(config.schedule.time, "03:00");
        assert_eq!(config.schedule.recurrence, Recurrence::Daily);
        assert_eq!(config.metadata.backend, MetadataBackend::None);
        assert!(!config.watch.enabled);
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_extensions_filter_vector_and_webp() {
        let config: Config = toml::from_str(
            r#"
            [source]
            extensions = ["JPG", ".png", "svg", "webp", "gif", "png"]
            "#,
        )
        .unwrap();
        assert_eq!(config.source_extensions(), vec!["jpg", "png", "gif"]);
    }

    #[test]
    fn test_explicit_paths_replace_base_dir() {
        let config: Config = toml::from_str(
            r#"
            [source]
            base_dir = "/srv/uploads"
            paths = ["/srv/uploads/2024", "/srv/uploads/2025"]
            "#,
        )
        .unwrap();
        assert_eq!(config.source_roots().len(), 2);
        assert_eq!(config.source.base_dir, Path::new("/srv/uploads"));
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [quality]
            webp = 101
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_metadata_backend_requires_path() {
        let config: Config = toml::from_str(
            r#"
            [metadata]
            backend = "sqlite"
            "#,
        )
        .unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_schedule_time() {
        let mut config = Config::default();
        config.schedule.time = "25:61".to_string();
        assert!(validate_config(&config).is_err());

        config.schedule.time = "07:30".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_niceness_range() {
        let mut config = Config::default();
        config.batch.niceness = 20;
        assert!(validate_config(&config).is_err());
        config.batch.niceness = -20;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_recurrence_parsing() {
        let config: Config = toml::from_str(
            r#"
            [schedule]
            time = "04:15"
            recurrence = "twicedaily"
            "#,
        )
        .unwrap();
        assert_eq!(config.schedule.recurrence, Recurrence::TwiceDaily);
        assert_eq!(
            config.schedule.recurrence.interval(),
            chrono::Duration::hours(12)
        );
    }
}
