//! Scaleway credentials and defaults
//!
//! Read from the Scaleway CLI config file (`~/.config/scw/config.yaml`, or
//! `SCW_CONFIG_PATH`), then overridden by `SCW_*` environment variables, the
//! same precedence the official tooling uses.

use crate::error::{Result, ScalewayError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.scaleway.com";

/// One set of credentials and defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub default_organization_id: Option<String>,
    pub default_project_id: Option<String>,
    pub default_region: Option<String>,
    pub default_zone: Option<String>,
    pub api_url: Option<String>,
}

impl Profile {
    /// Fields set in `other` win.
    fn merge(mut self, other: Profile) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            access_key,
            secret_key,
            default_organization_id,
            default_project_id,
            default_region,
            default_zone,
            api_url
        );
        self
    }

    fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            access_key: var("SCW_ACCESS_KEY"),
            secret_key: var("SCW_SECRET_KEY"),
            default_organization_id: var("SCW_DEFAULT_ORGANIZATION_ID"),
            default_project_id: var("SCW_DEFAULT_PROJECT_ID"),
            default_region: var("SCW_DEFAULT_REGION"),
            default_zone: var("SCW_DEFAULT_ZONE"),
            api_url: var("SCW_API_URL"),
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn secret_key(&self) -> Result<&str> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| ScalewayError::MissingCredentials("secret_key is not set".into()))
    }
}

/// Layout of the CLI config file: a default profile at the top level plus
/// named profiles.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    #[serde(flatten)]
    default: Profile,
    active_profile: Option<String>,
    profiles: HashMap<String, Profile>,
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SCW_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".config").join("scw").join("config.yaml"))
}

/// Load the profile named `name`, or `SCW_PROFILE`, or the file's active profile.
pub fn load(name: Option<&str>) -> Result<Profile> {
    let path = config_path();
    load_from(path.as_deref(), name)
}

pub fn load_from(path: Option<&Path>, name: Option<&str>) -> Result<Profile> {
    let file = match path {
        Some(path) if path.exists() => {
            debug!("Loading Scaleway config from {:?}", path);
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str::<ConfigFile>(&content)?
        }
        Some(path) if name.is_some() => {
            return Err(ScalewayError::ConfigNotFound(path.display().to_string()));
        }
        _ => ConfigFile::default(),
    };

    let env_profile = std::env::var("SCW_PROFILE").ok().filter(|v| !v.is_empty());
    let selected = name
        .map(str::to_string)
        .or(env_profile)
        .or(file.active_profile.clone());

    let mut profile = file.default;
    if let Some(selected) = selected {
        let named = file
            .profiles
            .get(&selected)
            .cloned()
            .ok_or(ScalewayError::ProfileNotFound(selected))?;
        profile = profile.merge(named);
    }

    Ok(profile.merge(Profile::from_env()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    const CONFIG: &str = r#"
access_key: SCWDEFAULTKEY
secret_key: 11111111-1111-1111-1111-111111111111
default_organization_id: org-default
default_region: fr-par
active_profile: staging
profiles:
  staging:
    secret_key: 22222222-2222-2222-2222-222222222222
    default_region: nl-ams
  prod:
    secret_key: 33333333-3333-3333-3333-333333333333
    default_zone: pl-waw-2
"#;

    fn clear_env() {
        for var in [
            "SCW_ACCESS_KEY",
            "SCW_SECRET_KEY",
            "SCW_DEFAULT_ORGANIZATION_ID",
            "SCW_DEFAULT_PROJECT_ID",
            "SCW_DEFAULT_REGION",
            "SCW_DEFAULT_ZONE",
            "SCW_API_URL",
            "SCW_PROFILE",
        ] {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    fn write_config() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, CONFIG).unwrap();
        (dir, path)
    }

    #[test]
    #[serial]
    fn test_active_profile_overrides_defaults() {
        clear_env();
        let (_dir, path) = write_config();

        let profile = load_from(Some(&path), None).unwrap();
        assert_eq!(profile.access_key.as_deref(), Some("SCWDEFAULTKEY"));
        assert_eq!(
            profile.secret_key.as_deref(),
            Some("22222222-2222-2222-2222-222222222222")
        );
        assert_eq!(profile.default_region.as_deref(), Some("nl-ams"));
        assert_eq!(profile.default_organization_id.as_deref(), Some("org-default"));
        assert_eq!(profile.api_url(), DEFAULT_API_URL);
    }

    #[test]
    #[serial]
    fn test_named_profile() {
        clear_env();
        let (_dir, path) = write_config();

        let profile = load_from(Some(&path), Some("prod")).unwrap();
        assert_eq!(profile.default_zone.as_deref(), Some("pl-waw-2"));
        assert_eq!(profile.default_region.as_deref(), Some("fr-par"));

        let err = load_from(Some(&path), Some("nope")).unwrap_err();
        assert!(matches!(err, ScalewayError::ProfileNotFound(_)));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let (_dir, path) = write_config();
        unsafe {
            std::env::set_var("SCW_DEFAULT_REGION", "pl-waw");
            std::env::set_var("SCW_API_URL", "http://127.0.0.1:9999");
        }

        let profile = load_from(Some(&path), None).unwrap();
        assert_eq!(profile.default_region.as_deref(), Some("pl-waw"));
        assert_eq!(profile.api_url(), "http://127.0.0.1:9999");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_env_only() {
        clear_env();
        unsafe {
            std::env::set_var("SCW_SECRET_KEY", "from-env");
        }

        let profile = load_from(Some(Path::new("/nonexistent/scw/config.yaml")), None).unwrap();
        assert_eq!(profile.secret_key().unwrap(), "from-env");

        clear_env();
        let profile = load_from(None, None).unwrap();
        assert!(profile.secret_key().is_err());
    }
}
