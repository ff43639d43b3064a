//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::BalancerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format '{0}' (expected .json or .toml)")]
    UnsupportedFormat(String),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a JSON or TOML file.
pub fn load_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let config = parse_config(&content, extension)?;
    tracing::debug!(path = %path.display(), "Configuration parsed");
    Ok(config)
}

/// Parse and validate configuration text in the format named by `extension`.
pub fn parse_config(content: &str, extension: &str) -> Result<BalancerConfig, ConfigError> {
    let config: BalancerConfig = match extension {
        "json" => serde_json::from_str(content)?,
        "toml" => toml::from_str(content)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::Algorithm;

    #[test]
    fn test_parse_json() {
        let config = parse_config(
            r#"{
                "listen_port": 8000,
                "algorithm": "least_conn",
                "backends": ["http://localhost:8081", "http://localhost:8082"],
                "health_check_interval": 5
            }"#,
            "json",
        )
        .unwrap();

        assert_eq!(config.listen_port, 8000);
        assert_eq!(config.algorithm, Algorithm::LeastConn);
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.health_check_interval, 5);
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_parse_toml() {
        let config = parse_config(
            r#"
            listen_port = 9000
            algorithm = "random"
            backends = ["http://10.0.0.1:80"]

            [admin]
            enabled = true
            api_key = "secret"
            "#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.listen_port, 9000);
        assert_eq!(config.algorithm, Algorithm::Random);
        assert_eq!(config.health_check_interval, 10);
        assert_eq!(config.admin.api_key, "secret");
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let err = parse_config(r#"{"algorithm": "fastest"}"#, "json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)), "got {err}");
    }

    #[test]
    fn test_validation_errors_surface() {
        let err = parse_config(r#"{"health_check_interval": 0}"#, "json").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref v) if v.len() == 1));
        assert!(err.to_string().contains("health_check_interval"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_config("listen_port: 1", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ref e) if e == "yaml"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
