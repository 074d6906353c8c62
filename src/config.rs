// Configuration management for cloudmenu
//
// Credentials come from the environment (optionally through a `.env` file);
// everything else comes from a TOML settings file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{CliError, Result};

pub const VULTR_API_KEY: &str = "VULTR_API_KEY";
pub const CLOUDFLARE_API_KEY: &str = "CLOUDFLARE_API_KEY";
pub const CLOUDFLARE_EMAIL: &str = "CLOUDFLARE_EMAIL";
pub const SETTINGS_ENV: &str = "CLOUDMENU_SETTINGS";
const SETTINGS_FILE: &str = "settings.toml";

/// API credentials for both providers
#[derive(Debug, Clone)]
pub struct Credentials {
    pub vultr_api_key: String,
    pub cloudflare_api_key: String,
    pub cloudflare_email: String,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`; empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CliError::MissingEnv {
                    name: name.to_string(),
                })
        };
        Ok(Self {
            vultr_api_key: require(VULTR_API_KEY)?,
            cloudflare_api_key: require(CLOUDFLARE_API_KEY)?,
            cloudflare_email: require(CLOUDFLARE_EMAIL)?,
        })
    }
}

/// Operator preferences and feature toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Region ids offered by the preferred-region menu
    pub preferred_region_ids: Vec<String>,
    /// Plan ids offered by the preferred-plan menu
    pub preferred_plan_ids: Vec<String>,
    /// Operating system ids offered by the preferred-OS menu
    pub preferred_os_ids: Vec<u64>,
    /// Application ids offered by the preferred-application menu
    pub preferred_application_ids: Vec<u64>,
    /// Tags attached to every new instance
    pub instance_tags: Vec<String>,

    #[serde(default)]
    pub preferred_region_only: bool,
    #[serde(default)]
    pub preferred_plan_only: bool,
    #[serde(default)]
    pub preferred_os_only: bool,
    /// Ask the provider to email the operator when an instance is created
    #[serde(default)]
    pub email_instance_creation: bool,
    /// Print a one-line summary of every API response
    #[serde(default)]
    pub print_api_response: bool,
    /// Print the current time under each menu
    #[serde(default)]
    pub print_timestamp: bool,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_cloud_init_dir")]
    pub cloud_init_dir: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_cloud_init_dir() -> PathBuf {
    PathBuf::from("cloud-init")
}

fn default_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Locate and load the settings file.
    ///
    /// Search order: `$CLOUDMENU_SETTINGS`, `./settings.toml`, then the
    /// user configuration directory.
    pub fn load() -> Result<Self> {
        let path = Self::locate().ok_or_else(|| {
            CliError::config(format!(
                "no {} found (set {} or create ./{})",
                SETTINGS_FILE, SETTINGS_ENV, SETTINGS_FILE
            ))
        })?;
        Self::from_file(&path)
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(SETTINGS_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("cloudmenu").join(SETTINGS_FILE))
            .filter(|p| p.exists())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CliError::Config {
            message: format!("cannot read {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        let settings = Self::from_toml(&text)?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).map_err(|e| CliError::Config {
            message: e.message().to_string(),
            source: Some(Box::new(e)),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(CliError::config("request_timeout_secs must be greater than 0"));
        }
        if self.preferred_region_only && self.preferred_region_ids.is_empty() {
            return Err(CliError::config(
                "preferred_region_only is set but preferred_region_ids is empty",
            ));
        }
        if self.preferred_plan_only && self.preferred_plan_ids.is_empty() {
            return Err(CliError::config(
                "preferred_plan_only is set but preferred_plan_ids is empty",
            ));
        }
        if self.preferred_os_only && self.preferred_os_ids.is_empty() {
            return Err(CliError::config(
                "preferred_os_only is set but preferred_os_ids is empty",
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
        preferred_region_ids = ["atl", "ewr"]
        preferred_plan_ids = ["vc2-1c-1gb"]
        preferred_os_ids = [1743]
        preferred_application_ids = [37]
        instance_tags = ["cloudmenu"]
    "#;

    #[test]
    fn test_minimal_settings_get_defaults() {
        let settings = Settings::from_toml(MINIMAL).unwrap();
        assert_eq!(settings.preferred_region_ids, vec!["atl", "ewr"]);
        assert!(!settings.preferred_region_only);
        assert!(!settings.print_timestamp);
        assert_eq!(settings.cache_dir, PathBuf::from("data"));
        assert_eq!(settings.cloud_init_dir, PathBuf::from("cloud-init"));
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_required_key() {
        let text = MINIMAL.replace("instance_tags = [\"cloudmenu\"]", "");
        let err = Settings::from_toml(&text).unwrap_err();
        assert!(err.to_string().contains("instance_tags"), "{}", err);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let text = format!("{}\nrequest_timeout_secs = 0", MINIMAL);
        assert!(matches!(
            Settings::from_toml(&text),
            Err(CliError::Config { .. })
        ));
    }

    #[test]
    fn test_preferred_only_requires_ids() {
        let text = MINIMAL.replace("[\"vc2-1c-1gb\"]", "[]") + "\npreferred_plan_only = true";
        assert!(Settings::from_toml(&text).is_err());
    }

    #[test]
    fn test_example_settings_parse() {
        let settings = Settings::from_toml(include_str!("../settings.example.toml")).unwrap();
        assert_eq!(settings.preferred_os_ids, vec![2136, 1743]);
        assert!(!settings.debug);
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        std::fs::write(&path, format!("{}\nprint_timestamp = true", MINIMAL)).unwrap();
        assert!(Settings::from_file(&path).unwrap().print_timestamp);
        assert!(Settings::from_file(&temp_dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_credentials_from_lookup() {
        let env: HashMap<&str, &str> = [
            (VULTR_API_KEY, "v-key"),
            (CLOUDFLARE_API_KEY, "cf-key"),
            (CLOUDFLARE_EMAIL, "ops@example.com"),
        ]
        .into_iter()
        .collect();
        let creds = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.vultr_api_key, "v-key");
        assert_eq!(creds.cloudflare_email, "ops@example.com");
    }

    #[test]
    fn test_credentials_missing_or_blank() {
        let err = Credentials::from_lookup(|k| match k {
            VULTR_API_KEY => Some("v-key".to_string()),
            CLOUDFLARE_API_KEY => Some("   ".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::MissingEnv { ref name } if name == CLOUDFLARE_API_KEY));
    }
}
