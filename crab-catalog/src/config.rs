//! Catalog engine configuration

use std::time::Duration;

use crate::retry::RetryPolicy;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// PostgreSQL connection URL (only the binary needs it)
    pub database_url: Option<String>,
    /// Default log filter
    pub log_level: String,
    /// JSON console output
    pub log_json: bool,
    /// Rolling log directory
    pub log_dir: Option<String>,
    /// Settings upsert attempt cap (at least 1)
    pub settings_write_max_attempts: u32,
    /// Linear backoff unit between settings upsert attempts
    pub settings_write_backoff_ms: u64,
    /// Default `maxProducts` of a clone request
    pub clone_max_products: usize,
    /// Product cap of quick copy
    pub quick_copy_max_products: usize,
    /// S3 bucket for physical image duplication
    pub image_s3_bucket: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".into(),
            database_url: None,
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            settings_write_max_attempts: 3,
            settings_write_backoff_ms: 500,
            clone_max_products: 1000,
            quick_copy_max_products: 20,
            image_s3_bucket: "crab-catalog-images".into(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            log_level: lookup("LOG_LEVEL")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.log_level),
            log_json: lookup("LOG_JSON")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.log_json),
            log_dir: lookup("LOG_DIR").filter(|s| !s.is_empty()),
            settings_write_max_attempts: parsed("SETTINGS_WRITE_MAX_ATTEMPTS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.settings_write_max_attempts)
                .max(1),
            settings_write_backoff_ms: parsed("SETTINGS_WRITE_BACKOFF_MS")
                .unwrap_or(defaults.settings_write_backoff_ms),
            clone_max_products: parsed("CLONE_MAX_PRODUCTS")
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.clone_max_products),
            quick_copy_max_products: parsed("QUICK_COPY_MAX_PRODUCTS")
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.quick_copy_max_products),
            image_s3_bucket: lookup("IMAGE_S3_BUCKET")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.image_s3_bucket),
        }
    }

    /// DATABASE_URL, required by the binary
    pub fn require_database_url(&self) -> Result<&str, BoxError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| "DATABASE_URL must be set".into())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.settings_write_max_attempts,
            Duration::from_millis(self.settings_write_backoff_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config_from(&[]), Config::default());
        assert!(config_from(&[]).require_database_url().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/catalog"),
            ("LOG_JSON", "true"),
            ("SETTINGS_WRITE_MAX_ATTEMPTS", "5"),
            ("SETTINGS_WRITE_BACKOFF_MS", "20"),
            ("QUICK_COPY_MAX_PRODUCTS", "7"),
        ]);
        assert_eq!(
            config.require_database_url().unwrap(),
            "postgres://localhost/catalog"
        );
        assert!(config.log_json);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(5, Duration::from_millis(20))
        );
        assert_eq!(config.quick_copy_max_products, 7);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[
            ("SETTINGS_WRITE_MAX_ATTEMPTS", "0"),
            ("CLONE_MAX_PRODUCTS", "lots"),
        ]);
        assert_eq!(config.settings_write_max_attempts, 1);
        assert_eq!(config.clone_max_products, 1000);
    }
}
