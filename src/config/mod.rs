pub mod settings;

pub use settings::{
    Config, ConfigError, DiffConfig, ExplorerConfig, GitConfig, LogConfig, RefreshConfig,
    TextEncoding,
};
