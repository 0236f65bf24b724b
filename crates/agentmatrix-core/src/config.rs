use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ::config as cfg;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding `index.*`, `agents/`, `features/` and `support/`
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { dir: "data".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheConfig {
    /// `Cache-Control: max-age` for API responses
    #[serde(default = "CacheConfig::default_max_age")]
    pub max_age_secs: u32,
}

impl CacheConfig {
    fn default_max_age() -> u32 {
        3600
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: Self::default_max_age(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    #[serde(default = "Settings::default_env")]
    pub env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Self::default_env(),
            server: ServerConfig::default(),
            data: DataConfig::default(),
            logging: LoggingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Settings {
    fn default_env() -> String {
        env::var("APP_ENV")
            .ok()
            .or_else(|| env::var("RUST_ENV").ok())
            .unwrap_or_else(|| "development".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.server.host.trim().is_empty(),
            "server.host cannot be empty"
        );
        anyhow::ensure!(self.server.port > 0, "server.port must be > 0");
        anyhow::ensure!(
            !self.data.dir.as_os_str().is_empty(),
            "data.dir cannot be empty"
        );
        anyhow::ensure!(
            !self.logging.level.trim().is_empty(),
            "logging.level cannot be empty"
        );
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// JSON Schema of the settings files read by [`ConfigManager`].
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Settings)
    }
}

/// Layered settings loader.
///
/// Sources, later ones winning: `default.*`, `<env>.*`, `local.toml`, then
/// `AGENTMATRIX__SECTION__KEY` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings: Settings,
    config_dir: PathBuf,
    env: String,
}

impl ConfigManager {
    pub fn new(env_override: Option<String>) -> Result<Self> {
        Self::with_dir(Self::default_config_dir(), env_override)
    }

    pub fn with_dir(config_dir: PathBuf, env_override: Option<String>) -> Result<Self> {
        let env_name = env_override.unwrap_or_else(Settings::default_env);
        let settings = Self::load_from_sources(&config_dir, &env_name)?;
        settings.validate()?;
        Ok(Self {
            settings,
            config_dir,
            env: env_name,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    /// Get the default configuration directory.
    ///
    /// Priority order:
    /// 1. ~/.agentmatrix/ (user-level config)
    /// 2. ./config/ (project-level config)
    /// 3. Current directory (fallback)
    pub fn default_config_dir() -> PathBuf {
        if let Some(home_dir) = dirs::home_dir() {
            let user_dir = home_dir.join(".agentmatrix");
            if user_dir.exists() {
                info!("Using config directory: {:?}", user_dir);
                return user_dir;
            }
        }

        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project_config = cwd.join("config");
        if project_config.exists() {
            info!("Using config directory: {:?}", project_config);
            return project_config;
        }

        info!("Using config directory: {:?}", cwd);
        cwd
    }

    pub fn load_from_sources(config_dir: &Path, env_name: &str) -> Result<Settings> {
        let settings: Settings = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.yaml")).required(false))
            .add_source(cfg::File::from(config_dir.join("default.json")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.yaml", env_name))).required(false),
            )
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.json", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                cfg::Environment::with_prefix("AGENTMATRIX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.cache.max_age_secs, 3600);
        assert_eq!(settings.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn empty_directory_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(tmp.path().to_path_buf(), Some("test".into())).unwrap();
        assert_eq!(manager.env(), "test");
        assert_eq!(manager.settings().data.dir, PathBuf::from("data"));
        assert_eq!(manager.settings().logging.level, "info");
    }

    #[test]
    fn environment_file_overrides_default_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("default.toml"),
            "[server]\nhost = \"0.0.0.0\"\nport = 8080\n\n[data]\ndir = \"/srv/data\"\n",
        )
        .unwrap();
        fs::write(tmp.path().join("staging.toml"), "[server]\nhost = \"0.0.0.0\"\nport = 9090\n").unwrap();

        let settings = ConfigManager::load_from_sources(tmp.path(), "staging").unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.data.dir, PathBuf::from("/srv/data"));
    }

    #[test]
    fn schema_describes_every_section() {
        let schema = serde_json::to_value(Settings::json_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for section in ["env", "server", "data", "logging", "cache"] {
            assert!(properties.contains_key(section), "missing {}", section);
        }
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("default.toml"), "[server]\nhost = \" \"\nport = 1\n").unwrap();
        assert!(ConfigManager::with_dir(tmp.path().to_path_buf(), Some("test".into())).is_err());
    }
}
