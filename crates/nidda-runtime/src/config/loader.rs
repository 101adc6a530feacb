//! Layered configuration loading.
//!
//! Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `nidda.{profile}.{ext}` next to the main file
//! 3. The main file `nidda.{ext}`: the first one found in the search paths
//! 4. `NIDDA_*` environment variables, `__` separating nested keys
//!    (`NIDDA_BOT__COMMAND_PREFIX=?`, `NIDDA_CACHE__DEDUPE_IN_FLIGHT=true`)
//! 5. Programmatic overrides ([`ConfigLoader::set`], [`ConfigLoader::merge`])
//!
//! `ext` is `toml` with the default `toml-config` feature, and `yaml`/`yml`
//! with `yaml-config`. The profile comes from `NIDDA_PROFILE` unless set
//! explicitly and defaults to `development`.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .set("bot.command_prefix", "?")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
use figment::providers::{Env, Serialized};
use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::schema::NiddaConfig;
use super::validation::validate_config;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "NIDDA_";

const FILE_STEM: &str = "nidda";
const DEFAULT_PROFILE: &str = "development";

/// A configuration file format enabled at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    #[cfg(feature = "toml-config")]
    Toml,
    #[cfg(feature = "yaml-config")]
    Yaml,
}

impl FileFormat {
    /// Extensions tried in each search path, in order.
    fn extensions() -> &'static [&'static str] {
        match (cfg!(feature = "toml-config"), cfg!(feature = "yaml-config")) {
            (true, true) => &["toml", "yaml", "yml"],
            (true, false) => &["toml"],
            (false, true) => &["yaml", "yml"],
            (false, false) => &[],
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            #[cfg(feature = "toml-config")]
            "toml" => Some(Self::Toml),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    #[allow(unused_variables)]
    fn merge_into(self, figment: Figment, path: &Path) -> Figment {
        match self {
            #[cfg(feature = "toml-config")]
            Self::Toml => figment.merge(figment::providers::Toml::file(path)),
            #[cfg(feature = "yaml-config")]
            Self::Yaml => figment.merge(figment::providers::Yaml::file(path)),
        }
    }
}

/// Builds a [`NiddaConfig`] from defaults, files, environment and overrides.
pub struct ConfigLoader {
    profile: String,
    search_paths: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
    overrides: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let profile = std::env::var(format!("{ENV_PREFIX}PROFILE"))
            .map(|p| p.to_lowercase())
            .unwrap_or_else(|_| DEFAULT_PROFILE.to_string());

        Self {
            profile,
            search_paths: Vec::new(),
            file: None,
            env: true,
            overrides: Figment::new(),
        }
    }

    /// Selects the `nidda.{profile}.*` file merged under the main file.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = profile.as_ref().to_lowercase();
        self
    }

    /// Adds a directory to look for `nidda.*` in.
    ///
    /// Without any, the current directory and `<config dir>/nidda` are used.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Loads exactly this file instead of searching; it must exist.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Ignores `NIDDA_*` environment variables.
    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Merges a complete configuration on top of every other source.
    pub fn merge(mut self, config: NiddaConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Overrides a single key, e.g. `set("bot.command_prefix", "?")`.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<NiddaConfig> {
        let config: NiddaConfig = self.figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %self.profile,
            command_prefix = %config.bot.command_prefix,
            log_level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// The merged sources, before extraction.
    pub fn figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(NiddaConfig::default()));

        for path in self.files()? {
            let format = FileFormat::from_path(&path).ok_or_else(|| unsupported(&path))?;
            info!(path = %path.display(), "Loading configuration file");
            figment = format.merge_into(figment, &path);
        }

        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides.clone()))
    }

    /// The files to merge, lowest priority first.
    fn files(&self) -> ConfigResult<Vec<PathBuf>> {
        if let Some(file) = &self.file {
            if !file.exists() {
                return Err(ConfigError::FileNotFound(file.clone()));
            }
            return Ok(vec![file.clone()]);
        }

        for dir in self.search_dirs() {
            for ext in FileFormat::extensions() {
                let main = dir.join(format!("{FILE_STEM}.{ext}"));
                if !main.exists() {
                    continue;
                }

                let profiled = dir.join(format!("{FILE_STEM}.{}.{ext}", self.profile));
                let mut files = Vec::with_capacity(2);
                if profiled.exists() {
                    files.push(profiled);
                }
                files.push(main);
                return Ok(files);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Vec::new())
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join(FILE_STEM)))
            .collect()
    }
}

fn unsupported(path: &Path) -> ConfigError {
    ConfigError::ParseError(format!(
        "Unsupported or disabled configuration file format: {}",
        path.display()
    ))
}

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<NiddaConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from `path` plus environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<NiddaConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_default_config() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config.logging.level, LogLevel::Info);
            assert_eq!(config.bot.command_prefix, "!");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_then_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "nidda.toml",
                r#"
                [bot]
                command_prefix = "?"
                bot_id = "42"

                [logging]
                level = "debug"
                "#,
            )?;
            jail.set_env("NIDDA_LOGGING__LEVEL", "warn");
            jail.set_env("NIDDA_CACHE__DEDUPE_IN_FLIGHT", "true");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .set("bot.echo", false)
                .load()
                .unwrap();

            assert_eq!(config.bot.command_prefix, "?");
            assert_eq!(config.bot.bot_id.as_deref(), Some("42"));
            assert_eq!(config.logging.level, LogLevel::Warn);
            assert!(config.cache.dedupe_in_flight);
            assert!(!config.bot.echo);
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_sits_under_main_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "nidda.production.toml",
                "[bot]\ncommand_prefix = \"$\"\necho = false\n",
            )?;
            jail.create_file("nidda.toml", "[bot]\ncommand_prefix = \"?\"\n")?;

            let config = ConfigLoader::new()
                .profile("Production")
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();

            assert_eq!(config.bot.command_prefix, "?");
            assert!(!config.bot.echo);
            Ok(())
        });
    }

    #[test]
    fn test_profile_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("NIDDA_PROFILE", "staging");
            jail.create_file("nidda.staging.toml", "[bot]\nignore_bots = false\n")?;
            jail.create_file("nidda.toml", "")?;

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap();
            assert!(!config.bot.ignore_bots);
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_alone_is_ignored() {
        Jail::expect_with(|jail| {
            jail.create_file("nidda.development.toml", "[bot]\ncommand_prefix = \"$\"\n")?;

            let config = ConfigLoader::new()
                .profile("development")
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config.bot.command_prefix, "!");
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here/nidda.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("bot.ini", "prefix=?")?;
            let err = ConfigLoader::new()
                .file(jail.directory().join("bot.ini"))
                .without_env()
                .load()
                .unwrap_err();
            assert!(matches!(err, ConfigError::ParseError(_)));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        Jail::expect_with(|jail| {
            let err = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .set("bot.command_prefix", "  ")
                .load()
                .unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError { .. }));
            Ok(())
        });
    }
}
