use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::{Loaded, read_json};

// =============================================================================
// Constants
// =============================================================================

/// Timeout for a single HTTP request in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Packages requested per AUR listing page (the AUR accepts 50, 100 or 250)
pub const DEFAULT_PER_PAGE: usize = 250;

/// Mirror repository checked when the configuration names none
pub const DEFAULT_REPOSITORY: &str = "winry-testing";

/// System-wide configuration directory
pub const GLOBAL_CONFIG_DIR: &str = "/etc/augur";

const APP_DIR: &str = "augur";
const CONFIG_FILE: &str = "configuration.json";
const BLACKLIST_FILE: &str = "blacklist.json";
const CACHE_FILE: &str = "packages.json";

/// Name of the log file inside [`Paths::data_dir`]
pub const LOG_FILE: &str = "augur.log";

// =============================================================================
// Paths
// =============================================================================

/// Every filesystem location augur touches
///
/// Resolved once at startup and handed to each component, so tests can point
/// the whole program at a temporary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Per-user configuration directory (`$XDG_CONFIG_HOME/augur`)
    pub config_dir: PathBuf,
    /// Per-user cache directory (`$XDG_CACHE_HOME/augur`)
    pub cache_dir: PathBuf,
    /// Per-user data directory holding the log (`$XDG_DATA_HOME/augur`)
    pub data_dir: PathBuf,
    /// System-wide fallback for configuration and blacklist
    pub global_dir: PathBuf,
}

impl Paths {
    /// Resolve paths from the XDG environment variables and the home directory
    pub fn from_env() -> Self {
        Self::with_env(
            std::env::var("XDG_CONFIG_HOME").ok(),
            std::env::var("XDG_CACHE_HOME").ok(),
            std::env::var("XDG_DATA_HOME").ok(),
            dirs::home_dir(),
        )
    }

    /// Resolve paths from explicit values
    ///
    /// Unset or empty XDG variables fall back to `~/.config`, `~/.cache` and
    /// `~/.local/share`, or to the current directory when there is no home.
    pub fn with_env(
        xdg_config_home: Option<String>,
        xdg_cache_home: Option<String>,
        xdg_data_home: Option<String>,
        home_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            config_dir: xdg_dir(xdg_config_home, home_dir.as_deref(), ".config"),
            cache_dir: xdg_dir(xdg_cache_home, home_dir.as_deref(), ".cache"),
            data_dir: xdg_dir(xdg_data_home, home_dir.as_deref(), ".local/share"),
            global_dir: PathBuf::from(GLOBAL_CONFIG_DIR),
        }
    }

    /// Lay every directory out under `root`; useful for tests and sandboxes
    pub fn rooted(root: &Path) -> Self {
        Self {
            config_dir: root.join("config").join(APP_DIR),
            cache_dir: root.join("cache").join(APP_DIR),
            data_dir: root.join("data").join(APP_DIR),
            global_dir: root.join("etc").join(APP_DIR),
        }
    }

    pub fn local_config(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn global_config(&self) -> PathBuf {
        self.global_dir.join(CONFIG_FILE)
    }

    pub fn local_blacklist(&self) -> PathBuf {
        self.config_dir.join(BLACKLIST_FILE)
    }

    pub fn global_blacklist(&self) -> PathBuf {
        self.global_dir.join(BLACKLIST_FILE)
    }

    /// Snapshot of the AUR listing
    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }
}

fn xdg_dir(xdg_value: Option<String>, home_dir: Option<&Path>, home_relative: &str) -> PathBuf {
    let base = xdg_value
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(home_relative)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_DIR)
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No global configuration found at {0:?}. Exiting.")]
    Missing(PathBuf),

    #[error("Configuration at {path:?} is not readable: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Not configured correctly, missing {}", .missing.join(", "))]
    Invalid { missing: Vec<&'static str> },
}

/// Configuration file as written on disk
///
/// Keys are PascalCase, as in the packaged `data/configuration.json`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
struct RawConfiguration {
    #[serde(rename = "AURUrl")]
    aur_url: Option<String>,
    #[serde(rename = "Mirror")]
    mirror: Option<String>,
    #[serde(rename = "Repository")]
    repository: Option<String>,
    #[serde(rename = "PerPage")]
    per_page: Option<usize>,
    #[serde(rename = "Vercmp")]
    vercmp: Option<PathBuf>,
}

/// Validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// AUR base URL, without trailing slash
    pub aur_url: String,
    /// Mirror base URL, without trailing slash
    pub mirror: String,
    /// Repository whose database is read from the mirror
    pub repository: String,
    /// AUR listing page size
    pub per_page: usize,
    /// External `vercmp` binary; the built-in comparison is used when unset
    pub vercmp: Option<PathBuf>,
}

impl TryFrom<RawConfiguration> for Configuration {
    type Error = ConfigError;

    fn try_from(raw: RawConfiguration) -> Result<Self, Self::Error> {
        let aur_url = non_blank(raw.aur_url);
        let mirror = non_blank(raw.mirror);

        let (Some(aur_url), Some(mirror)) = (aur_url.clone(), mirror.clone()) else {
            let missing = [("AURUrl", aur_url.is_none()), ("Mirror", mirror.is_none())]
                .into_iter()
                .filter_map(|(key, absent)| absent.then_some(key))
                .collect();
            return Err(ConfigError::Invalid { missing });
        };

        let per_page = match raw.per_page {
            Some(0) => {
                warn!("PerPage must be positive, using {}", DEFAULT_PER_PAGE);
                DEFAULT_PER_PAGE
            }
            Some(n) => n,
            None => DEFAULT_PER_PAGE,
        };

        Ok(Self {
            aur_url: aur_url.trim_end_matches('/').to_string(),
            mirror: mirror.trim_end_matches('/').to_string(),
            repository: non_blank(raw.repository)
                .unwrap_or_else(|| DEFAULT_REPOSITORY.to_string()),
            per_page,
            vercmp: raw.vercmp,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Loads the configuration, preferring the per-user file over the global one
pub struct ConfigLoader {
    local: PathBuf,
    global: PathBuf,
}

impl ConfigLoader {
    pub fn new(paths: &Paths) -> Self {
        Self {
            local: paths.local_config(),
            global: paths.global_config(),
        }
    }

    pub fn load(&self) -> Result<Configuration, ConfigError> {
        let raw = match read_json::<RawConfiguration>(&self.local) {
            Ok(Loaded::Parsed(raw)) if raw == RawConfiguration::default() => {
                warn!("Local configuration {:?} sets no keys, falling back to global", self.local);
                self.load_global()?
            }
            Ok(Loaded::Parsed(raw)) => {
                info!("Loaded configuration from {:?}", self.local);
                raw
            }
            Ok(Loaded::Absent) => {
                debug!("No local configuration at {:?}", self.local);
                self.load_global()?
            }
            Ok(Loaded::Empty) => {
                warn!("Local configuration {:?} is empty, falling back to global", self.local);
                self.load_global()?
            }
            Err(e) => {
                warn!(
                    "Local configuration {:?} found but not readable ({}), falling back to global",
                    self.local, e
                );
                self.load_global()?
            }
        };

        Configuration::try_from(raw)
    }

    fn load_global(&self) -> Result<RawConfiguration, ConfigError> {
        match read_json::<RawConfiguration>(&self.global) {
            Ok(Loaded::Parsed(raw)) => {
                info!("Loaded configuration from {:?}", self.global);
                Ok(raw)
            }
            Ok(Loaded::Absent) => Err(ConfigError::Missing(self.global.clone())),
            Ok(Loaded::Empty) => Err(ConfigError::Unreadable {
                path: self.global.clone(),
                reason: "file is empty".to_string(),
            }),
            Err(e) => Err(ConfigError::Unreadable {
                path: self.global.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn with_env_uses_xdg_variables_when_set() {
        let paths = Paths::with_env(
            Some("/tmp/conf".to_string()),
            Some("/tmp/cache".to_string()),
            Some("/tmp/data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(paths.config_dir, PathBuf::from("/tmp/conf/augur"));
        assert_eq!(paths.cache_dir, PathBuf::from("/tmp/cache/augur"));
        assert_eq!(paths.data_dir, PathBuf::from("/tmp/data/augur"));
        assert_eq!(paths.global_dir, PathBuf::from("/etc/augur"));
    }

    #[test]
    fn with_env_falls_back_to_home_for_unset_or_empty_variables() {
        let paths = Paths::with_env(
            None,
            Some(String::new()),
            None,
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(paths.config_dir, PathBuf::from("/home/user/.config/augur"));
        assert_eq!(paths.cache_dir, PathBuf::from("/home/user/.cache/augur"));
        assert_eq!(
            paths.data_dir,
            PathBuf::from("/home/user/.local/share/augur")
        );
    }

    #[test]
    fn with_env_falls_back_to_current_dir_without_home() {
        let paths = Paths::with_env(None, None, None, None);

        assert_eq!(paths.cache_file(), PathBuf::from("./augur/packages.json"));
    }

    #[test]
    fn configuration_from_full_object_parses_all_fields() {
        let raw = serde_json::from_value::<RawConfiguration>(json!({
            "AURUrl": "https://aur.archlinux.org/",
            "Mirror": "https://mirror.example.org/winry",
            "Repository": "winry-stable",
            "PerPage": 100,
            "Vercmp": "/usr/bin/vercmp"
        }))
        .unwrap();

        assert_eq!(
            Configuration::try_from(raw).unwrap(),
            Configuration {
                aur_url: "https://aur.archlinux.org".to_string(),
                mirror: "https://mirror.example.org/winry".to_string(),
                repository: "winry-stable".to_string(),
                per_page: 100,
                vercmp: Some(PathBuf::from("/usr/bin/vercmp")),
            }
        );
    }

    #[test]
    fn configuration_uses_defaults_for_optional_fields() {
        let raw = serde_json::from_value::<RawConfiguration>(json!({
            "AURUrl": "https://aur.archlinux.org",
            "Mirror": "https://mirror.example.org",
            "PerPage": 0
        }))
        .unwrap();

        let config = Configuration::try_from(raw).unwrap();

        assert_eq!(config.repository, DEFAULT_REPOSITORY);
        assert_eq!(config.per_page, DEFAULT_PER_PAGE);
        assert_eq!(config.vercmp, None);
    }

    #[rstest]
    #[case(json!({"Mirror": "https://m"}), vec!["AURUrl"])]
    #[case(json!({"AURUrl": "https://a"}), vec!["Mirror"])]
    #[case(json!({"AURUrl": " ", "Mirror": ""}), vec!["AURUrl", "Mirror"])]
    #[case(json!({}), vec!["AURUrl", "Mirror"])]
    fn configuration_missing_required_keys_is_invalid(
        #[case] value: serde_json::Value,
        #[case] expected: Vec<&'static str>,
    ) {
        let raw = serde_json::from_value::<RawConfiguration>(value).unwrap();

        let result = Configuration::try_from(raw);

        match result {
            Err(ConfigError::Invalid { missing }) => assert_eq!(missing, expected),
            other => panic!("expected invalid configuration, got {:?}", other),
        }
    }

    #[test]
    fn loader_prefers_local_configuration() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::rooted(temp_dir.path());
        write(
            &paths.local_config(),
            r#"{"AURUrl": "https://local", "Mirror": "https://local-mirror"}"#,
        );
        write(
            &paths.global_config(),
            r#"{"AURUrl": "https://global", "Mirror": "https://global-mirror"}"#,
        );

        let config = ConfigLoader::new(&paths).load().unwrap();

        assert_eq!(config.aur_url, "https://local");
    }

    #[test]
    fn loader_falls_back_to_global_when_local_is_broken() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::rooted(temp_dir.path());
        write(&paths.local_config(), "{ not json");
        write(
            &paths.global_config(),
            r#"{"AURUrl": "https://global", "Mirror": "https://global-mirror"}"#,
        );

        let config = ConfigLoader::new(&paths).load().unwrap();

        assert_eq!(config.mirror, "https://global-mirror");
    }

    #[rstest]
    #[case("{}")]
    #[case("null")]
    #[case("")]
    fn loader_falls_back_to_global_when_local_sets_nothing(#[case] local: &str) {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::rooted(temp_dir.path());
        write(&paths.local_config(), local);
        write(
            &paths.global_config(),
            r#"{"AURUrl": "https://global", "Mirror": "https://global-mirror"}"#,
        );

        let config = ConfigLoader::new(&paths).load().unwrap();

        assert_eq!(config.aur_url, "https://global");
    }

    #[test]
    fn loader_keeps_partial_local_configuration() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::rooted(temp_dir.path());
        write(&paths.local_config(), r#"{"AURUrl": "https://local"}"#);
        write(
            &paths.global_config(),
            r#"{"AURUrl": "https://global", "Mirror": "https://global-mirror"}"#,
        );

        let result = ConfigLoader::new(&paths).load();

        assert!(matches!(result, Err(ConfigError::Invalid { missing }) if missing == ["Mirror"]));
    }

    #[test]
    fn loader_reports_missing_when_no_configuration_exists() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::rooted(temp_dir.path());

        let result = ConfigLoader::new(&paths).load();

        assert!(matches!(result, Err(ConfigError::Missing(path)) if path == paths.global_config()));
    }

    #[test]
    fn loader_reports_unreadable_global_configuration() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::rooted(temp_dir.path());
        write(&paths.global_config(), "[1, 2");

        let result = ConfigLoader::new(&paths).load();

        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }
}
