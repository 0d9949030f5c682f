//! Wayfarer configuration.
//!
//! Loaded from `~/.wayfarer/config.toml`. Every key has a working
//! default, so a missing file is not an error; a file that exists but
//! cannot be read or parsed is.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// The public Nominatim instance. Fine for light interactive use under
/// its usage policy; point `base-url` at a self-hosted instance for
/// anything heavier.
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Keyless IP-geolocation endpoint used for the startup position fix.
const DEFAULT_LOCATE_URL: &str = "https://ipapi.co/json";

/// Wayfarer configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub geocoder: GeocoderConfig,
    pub locate: LocateConfig,
    pub cache: CacheConfig,
    pub log: LogConfig,
}

/// `[geocoder]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible service.
    pub base_url: String,

    /// Most candidates a single search asks the service for.
    pub limit: u8,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            limit: 8,
        }
    }
}

/// `[locate]` section. Off by default: prefilling the start field means
/// sending the machine's IP to a third-party service, which the user
/// opts into here or with `--locate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LocateConfig {
    pub enabled: bool,

    /// IP-geolocation endpoint returning ipapi.co-style JSON.
    pub url: String,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: DEFAULT_LOCATE_URL.to_string(),
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Cached geocode results older than this are pruned at startup.
    pub max_age_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_days: 30,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogConfig {
    /// Tracing filter directive, e.g. `info` or `wayfarer=debug`.
    /// `RUST_LOG` overrides it when set.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// With an explicit path the file must exist. Without one, the
    /// default path is used if present and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, String> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let Some(path) = Self::default_path() else {
                    return Ok(Self::default());
                };
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.wayfarer/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        app_dir().map(|dir| dir.join("config.toml"))
    }
}

/// The app directory: `~/.wayfarer/`, shared by the config file, the
/// geocode cache, and the log file.
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".wayfarer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.geocoder.base_url, DEFAULT_GEOCODER_URL);
        assert_eq!(config.geocoder.limit, 8);
        assert!(!config.locate.enabled);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_age_days, 30);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            "[geocoder]\n\
             base-url = \"https://nominatim.example.net\"\n\n\
             [locate]\n\
             enabled = true\n",
        )
        .unwrap();

        assert_eq!(config.geocoder.base_url, "https://nominatim.example.net");
        assert_eq!(config.geocoder.limit, 8);
        assert!(config.locate.enabled);
        assert_eq!(config.locate.url, DEFAULT_LOCATE_URL);
    }

    #[test]
    fn keys_are_kebab_case() {
        let config: Config = toml::from_str(
            "[cache]\n\
             max-age-days = 7\n",
        )
        .unwrap();
        assert_eq!(config.cache.max_age_days, 7);
    }

    #[test]
    fn invalid_types_are_rejected() {
        let result: Result<Config, _> = toml::from_str(
            "[geocoder]\n\
             limit = \"many\"\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(err.contains("failed to read"));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[geocoder]\nlimit = 3\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.geocoder.limit, 3);
    }
}
