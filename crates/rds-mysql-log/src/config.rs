// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ConfigError;

pub const DEFAULT_POS_FILE: &str = "rds-mysql-log-pos.dat";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_TAG: &str = "rds-mysql.log";
pub const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 10;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Static AWS credentials. Without them the ambient credential chain
/// (environment, profile, instance role) is used.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub region: String,
    /// Set when both halves of the key pair were configured.
    pub credentials: Option<StaticCredentials>,
    /// Reported if the ambient credential chain cannot resolve either.
    pub missing_credential: Option<&'static str>,
    pub db_instance_identifier: String,
    pub pos_file: PathBuf,
    /// how often to poll, in seconds
    pub refresh_interval_secs: u64,
    pub tag: String,
    /// HTTP endpoint records are forwarded to. Records go to stdout otherwise.
    pub forward_url: Option<String>,
    pub forward_timeout_secs: u64,
    /// RDS endpoint override (VPC endpoints, local emulators).
    pub endpoint_url: Option<String>,
    pub https_proxy: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            region: String::new(),
            credentials: None,
            missing_credential: Some("access_key_id"),
            db_instance_identifier: String::new(),
            pos_file: PathBuf::from(DEFAULT_POS_FILE),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            tag: DEFAULT_TAG.to_string(),
            forward_url: None,
            forward_timeout_secs: DEFAULT_FORWARD_TIMEOUT_SECS,
            endpoint_url: None,
            https_proxy: None,
            log_level: "info".to_string(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_secs(name: &str, default: u64) -> Result<u64, ConfigError> {
    match non_empty_var(name) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid(format!("{name} must be a number of seconds, got '{value}'"))),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        let region = non_empty_var("RDS_MYSQL_LOG_REGION")
            .or_else(|| non_empty_var("AWS_REGION"))
            .ok_or(ConfigError::Missing("region"))?;
        let db_instance_identifier = non_empty_var("RDS_MYSQL_LOG_DB_INSTANCE_IDENTIFIER")
            .ok_or(ConfigError::Missing("db_instance_identifier"))?;

        let access_key_id = non_empty_var("RDS_MYSQL_LOG_ACCESS_KEY_ID");
        let secret_access_key = non_empty_var("RDS_MYSQL_LOG_SECRET_ACCESS_KEY");
        let (credentials, missing_credential) = match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => (
                Some(StaticCredentials {
                    access_key_id,
                    secret_access_key,
                }),
                None,
            ),
            (Some(_), None) => (None, Some("secret_access_key")),
            (None, _) => (None, Some("access_key_id")),
        };

        let config = Config {
            region,
            credentials,
            missing_credential,
            db_instance_identifier,
            pos_file: non_empty_var("RDS_MYSQL_LOG_POS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_POS_FILE)),
            refresh_interval_secs: parse_secs(
                "RDS_MYSQL_LOG_REFRESH_INTERVAL",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )?,
            tag: non_empty_var("RDS_MYSQL_LOG_TAG").unwrap_or_else(|| DEFAULT_TAG.to_string()),
            forward_url: non_empty_var("RDS_MYSQL_LOG_FORWARD_URL"),
            forward_timeout_secs: parse_secs(
                "RDS_MYSQL_LOG_FORWARD_TIMEOUT_SECS",
                DEFAULT_FORWARD_TIMEOUT_SECS,
            )?,
            endpoint_url: non_empty_var("RDS_MYSQL_LOG_ENDPOINT_URL"),
            https_proxy: non_empty_var("RDS_MYSQL_LOG_PROXY_HTTPS")
                .or_else(|| non_empty_var("HTTPS_PROXY")),
            log_level: non_empty_var("RDS_MYSQL_LOG_LOG_LEVEL")
                .map(|level| level.to_lowercase())
                .unwrap_or_else(|| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::Missing("region"));
        }
        if self.db_instance_identifier.trim().is_empty() {
            return Err(ConfigError::Missing("db_instance_identifier"));
        }
        if self.pos_file.as_os_str().is_empty() {
            return Err(ConfigError::Missing("pos_file"));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval must be greater than 0".to_string(),
            ));
        }
        if self.tag.trim().is_empty() {
            return Err(ConfigError::Missing("tag"));
        }
        if self.forward_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "forward timeout must be greater than 0".to_string(),
            ));
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 13] = [
        "RDS_MYSQL_LOG_REGION",
        "AWS_REGION",
        "RDS_MYSQL_LOG_ACCESS_KEY_ID",
        "RDS_MYSQL_LOG_SECRET_ACCESS_KEY",
        "RDS_MYSQL_LOG_DB_INSTANCE_IDENTIFIER",
        "RDS_MYSQL_LOG_POS_FILE",
        "RDS_MYSQL_LOG_REFRESH_INTERVAL",
        "RDS_MYSQL_LOG_TAG",
        "RDS_MYSQL_LOG_FORWARD_URL",
        "RDS_MYSQL_LOG_FORWARD_TIMEOUT_SECS",
        "RDS_MYSQL_LOG_ENDPOINT_URL",
        "RDS_MYSQL_LOG_LOG_LEVEL",
        "RDS_MYSQL_LOG_PROXY_HTTPS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
        env::remove_var("HTTPS_PROXY");
    }

    fn set_required() {
        env::set_var("RDS_MYSQL_LOG_REGION", "ap-northeast-1");
        env::set_var("RDS_MYSQL_LOG_DB_INSTANCE_IDENTIFIER", "mysql-prod-1");
    }

    fn valid() -> Config {
        Config {
            region: "us-east-1".to_string(),
            db_instance_identifier: "db".to_string(),
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_error_if_no_region() {
        clear_env();
        env::set_var("RDS_MYSQL_LOG_DB_INSTANCE_IDENTIFIER", "mysql-prod-1");
        let config = Config::from_env();
        assert_eq!(config.unwrap_err().to_string(), "region is required");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_error_if_no_instance_identifier() {
        clear_env();
        env::set_var("RDS_MYSQL_LOG_REGION", "ap-northeast-1");
        let config = Config::from_env();
        assert_eq!(
            config.unwrap_err().to_string(),
            "db_instance_identifier is required"
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        set_required();
        let config = Config::from_env().unwrap();
        assert_eq!(config.region, "ap-northeast-1");
        assert_eq!(config.db_instance_identifier, "mysql-prod-1");
        assert_eq!(config.pos_file, PathBuf::from(DEFAULT_POS_FILE));
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.tag, "rds-mysql.log");
        assert_eq!(config.log_level, "info");
        assert!(config.credentials.is_none());
        assert_eq!(config.missing_credential, Some("access_key_id"));
        assert!(config.forward_url.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_region_falls_back_to_aws_region() {
        clear_env();
        env::set_var("AWS_REGION", "eu-west-1");
        env::set_var("RDS_MYSQL_LOG_DB_INSTANCE_IDENTIFIER", "db");
        assert_eq!(Config::from_env().unwrap().region, "eu-west-1");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_static_credentials() {
        clear_env();
        set_required();
        env::set_var("RDS_MYSQL_LOG_ACCESS_KEY_ID", "AKIDEXAMPLE");
        env::set_var("RDS_MYSQL_LOG_SECRET_ACCESS_KEY", "secret");
        let config = Config::from_env().unwrap();
        assert_eq!(
            config.credentials,
            Some(StaticCredentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: "secret".to_string(),
            })
        );
        assert_eq!(config.missing_credential, None);
        assert!(!format!("{config:?}").contains("secret\""));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_half_credentials_names_missing_secret() {
        clear_env();
        set_required();
        env::set_var("RDS_MYSQL_LOG_ACCESS_KEY_ID", "AKIDEXAMPLE");
        let config = Config::from_env().unwrap();
        assert!(config.credentials.is_none());
        assert_eq!(config.missing_credential, Some("secret_access_key"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        set_required();
        env::set_var("RDS_MYSQL_LOG_POS_FILE", "/var/lib/rds/pos.dat");
        env::set_var("RDS_MYSQL_LOG_REFRESH_INTERVAL", "60");
        env::set_var("RDS_MYSQL_LOG_TAG", "mysql.audit");
        env::set_var("RDS_MYSQL_LOG_FORWARD_URL", "http://127.0.0.1:8080/logs");
        env::set_var("RDS_MYSQL_LOG_LOG_LEVEL", "DEBUG");
        env::set_var("HTTPS_PROXY", "http://proxy:3128");
        let config = Config::from_env().unwrap();
        assert_eq!(config.pos_file, PathBuf::from("/var/lib/rds/pos.dat"));
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.tag, "mysql.audit");
        assert_eq!(
            config.forward_url.as_deref(),
            Some("http://127.0.0.1:8080/logs")
        );
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_refresh_interval() {
        clear_env();
        set_required();
        env::set_var("RDS_MYSQL_LOG_REFRESH_INTERVAL", "soon");
        assert!(Config::from_env().is_err());
        env::set_var("RDS_MYSQL_LOG_REFRESH_INTERVAL", "0");
        assert_eq!(
            Config::from_env().unwrap_err().to_string(),
            "Invalid configuration: refresh_interval must be greater than 0"
        );
        clear_env();
    }

    #[test]
    fn test_validate() {
        assert!(valid().validate().is_ok());
        assert!(Config {
            tag: " ".to_string(),
            ..valid()
        }
        .validate()
        .is_err());
        assert!(Config {
            pos_file: PathBuf::new(),
            ..valid()
        }
        .validate()
        .is_err());
        assert!(Config {
            log_level: "verbose".to_string(),
            ..valid()
        }
        .validate()
        .is_err());
        assert!(Config::default().validate().is_err());
    }
}
