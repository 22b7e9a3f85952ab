use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_SEARCH_DEPTH: i32 = 10;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub git: GitConfig,
    pub explorer: ExplorerConfig,
    pub refresh: RefreshConfig,
    pub diff: DiffConfig,
    pub log: LogConfig,
}

/// Text encoding used to decode git's textual output
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin1")]
    Latin1,
}

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            // ISO-8859-1 maps every byte onto the code point of the same value
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    pub executable: String,
    #[serde(default)]
    pub encoding: TextEncoding,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExplorerConfig {
    /// 0 = workspace roots only, negative = ancestor levels, positive = subdirectory levels
    pub search_depth: i32,
    pub eager_load: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RefreshConfig {
    pub force_debounce_ms: u64,
    pub passive_debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DiffConfig {
    pub image_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_history: Option<PathBuf>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME")
            .map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("stashview"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from a specific file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::ReadError(
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Config file not found"
                )
            ));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Load the default config file, falling back to defaults when it does not exist
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(ConfigError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default_config())
            }
            Err(ConfigError::DirectoryNotFound) => Ok(Self::default_config()),
            Err(e) => Err(e),
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;

        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Config {
            git: GitConfig {
                executable: "git".to_string(),
                encoding: TextEncoding::Utf8,
                timeout_seconds: 30,
            },
            explorer: ExplorerConfig {
                search_depth: 0,
                eager_load: false,
            },
            refresh: RefreshConfig {
                force_debounce_ms: 250,
                passive_debounce_ms: 750,
            },
            diff: DiffConfig {
                image_extensions: [
                    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svg", "tif", "tiff",
                ]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            },
            log: LogConfig {
                level: "info".to_string(),
                command_history: None,
            },
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.git.executable.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "git.executable must not be empty".to_string()
            ));
        }

        if self.git.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string()
            ));
        }

        if self.explorer.search_depth.abs() > MAX_SEARCH_DEPTH {
            return Err(ConfigError::InvalidValue(
                format!("search_depth must be between -{0} and {0}", MAX_SEARCH_DEPTH)
            ));
        }

        if self.refresh.force_debounce_ms == 0 || self.refresh.passive_debounce_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "debounce windows must be greater than 0".to_string()
            ));
        }

        if self.refresh.force_debounce_ms > self.refresh.passive_debounce_ms {
            return Err(ConfigError::InvalidValue(
                "force_debounce_ms must not exceed passive_debounce_ms".to_string()
            ));
        }

        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue(
                format!("Unknown log level: {}", self.log.level)
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl DiffConfig {
    /// Whether `path` has one of the configured image extensions (case-insensitive)
    pub fn is_image(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.image_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.git.executable, "git");
        assert_eq!(config.git.encoding, TextEncoding::Utf8);
        assert_eq!(config.refresh.force_debounce_ms, 250);
        assert_eq!(config.refresh.passive_debounce_ms, 750);
        assert_eq!(config.explorer.search_depth, 0);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_executable() {
        let mut config = Config::default_config();
        config.git.executable = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default_config();
        config.git.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_force_longer_than_passive() {
        let mut config = Config::default_config();
        config.refresh.force_debounce_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_search_depth_bounds() {
        let mut config = Config::default_config();
        config.explorer.search_depth = -3;
        assert!(config.validate().is_ok());
        config.explorer.search_depth = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = Config::default_config();
        config.log.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
        config.log.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_image() {
        let diff = Config::default_config().diff;
        assert!(diff.is_image("assets/logo.PNG"));
        assert!(diff.is_image("a/b/c.svg"));
        assert!(!diff.is_image("src/main.rs"));
        assert!(!diff.is_image("Makefile"));
    }

    #[test]
    fn test_latin1_decode() {
        assert_eq!(TextEncoding::Latin1.decode(&[0x63, 0x61, 0x66, 0xe9]), "café");
        assert_eq!(TextEncoding::Utf8.decode("café".as_bytes()), "café");
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::default_config();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_encoding_name_in_toml() {
        let mut config = Config::default_config();
        config.git.encoding = TextEncoding::Latin1;
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("encoding = \"latin1\""));
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default_config();
        config.explorer.eager_load = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.explorer.eager_load);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load_from(temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }
}
