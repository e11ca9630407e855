use crate::error::{OrglangError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const TOKEN_ENV_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];
pub const API_URL_ENV_VAR: &str = "ORGLANG_API_URL";

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    pub token: Option<String>,
}

/// Fallbacks for command-line flags that were not given.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    pub org: Option<String>,
    pub enterprise: Option<String>,
    pub repo_limit: Option<usize>,
    pub org_limit: Option<usize>,
    pub top: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// REST base URL, e.g. `https://ghe.example.com/api/v3`.
    pub url: Option<String>,
}

impl Config {
    /// Environment tokens win over the config file.
    pub fn token(&self) -> Result<String> {
        let from_env = TOKEN_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok());
        resolve_token(from_env, self)
    }

    pub fn api_url(&self) -> Option<String> {
        std::env::var(API_URL_ENV_VAR)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api.url.clone())
    }
}

fn resolve_token(from_env: Option<String>, config: &Config) -> Result<String> {
    from_env
        .or_else(|| config.auth.token.clone())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(OrglangError::NotAuthenticated)
}

pub fn config_path() -> Result<PathBuf> {
    resolve_config_path(std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from), dirs::home_dir())
}

fn resolve_config_path(xdg: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf> {
    let base = match (xdg, home) {
        (Some(xdg), _) => xdg,
        (None, Some(home)) => home.join(".config"),
        (None, None) => return Err(OrglangError::Config("Cannot find home directory".into())),
    };
    Ok(base.join("orglang").join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let config = Config {
            auth: AuthConfig {
                token: Some("ghp_test123".to_string()),
            },
            defaults: DefaultsConfig {
                org: Some("octo-org".to_string()),
                repo_limit: Some(250),
                ..DefaultsConfig::default()
            },
            api: ApiConfig {
                url: Some("https://ghe.example.com/api/v3".to_string()),
            },
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.auth.token.as_deref(), Some("ghp_test123"));
        assert_eq!(deserialized.defaults.org.as_deref(), Some("octo-org"));
        assert_eq!(deserialized.defaults.repo_limit, Some(250));
        assert!(deserialized.defaults.enterprise.is_none());
        assert_eq!(
            deserialized.api.url.as_deref(),
            Some("https://ghe.example.com/api/v3")
        );
    }

    #[test]
    fn token_missing_everywhere_is_not_authenticated() {
        let config = Config::default();
        assert!(matches!(
            resolve_token(None, &config),
            Err(OrglangError::NotAuthenticated)
        ));
    }

    #[test]
    fn env_token_wins_over_config() {
        let config = Config {
            auth: AuthConfig {
                token: Some("ghp_file".to_string()),
            },
            ..Config::default()
        };
        assert_eq!(
            resolve_token(Some("ghp_env".to_string()), &config).unwrap(),
            "ghp_env"
        );
        assert_eq!(resolve_token(None, &config).unwrap(), "ghp_file");
    }

    #[test]
    fn blank_token_is_rejected() {
        let config = Config::default();
        assert!(resolve_token(Some("  \n".to_string()), &config).is_err());
    }

    #[test]
    fn config_deserialize_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.auth.token.is_none());
        assert!(config.defaults.org.is_none());
        assert!(config.api.url.is_none());
    }

    #[test]
    fn config_deserialize_partial_defaults() {
        let config: Config = toml::from_str(
            r#"
            [defaults]
            enterprise = "octo-corp"
            org_limit = 3
            top = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.defaults.enterprise.as_deref(), Some("octo-corp"));
        assert_eq!(config.defaults.org_limit, Some(3));
        assert_eq!(config.defaults.top, Some(5));
    }

    #[test]
    fn config_path_prefers_xdg() {
        let path = resolve_config_path(
            Some(PathBuf::from("/tmp/test_xdg")),
            Some(PathBuf::from("/home/octo")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/test_xdg/orglang/config.toml"));
    }

    #[test]
    fn config_path_falls_back_to_home() {
        let path = resolve_config_path(None, Some(PathBuf::from("/home/octo"))).unwrap();
        assert_eq!(path, PathBuf::from("/home/octo/.config/orglang/config.toml"));
        assert!(matches!(
            resolve_config_path(None, None),
            Err(OrglangError::Config(_))
        ));
    }
}
