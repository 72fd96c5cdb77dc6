//! Layered configuration for the `thosua` binary
//!
//! Lowest to highest priority: the embedded `config/default.toml`, then
//! `config/default`, `config/<profile>` and `config/local` (any format the
//! `config` crate reads, all optional), then `THOSUA_*` variables such as
//! `THOSUA_GEMINI__MODEL`. The profile comes from `THOSUA_ENV`.
//!
//! A blank `[gemini] api_key` left after layering is filled from
//! `GEMINI_API_KEY` / `GOOGLE_API_KEY`, the variables the Gemini tooling
//! documents.

use super::AppConfig;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat, Map};
use std::path::PathBuf;
use thosua_diagnosis::gemini::api_key_from;
use tracing::debug;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Profile used when `THOSUA_ENV` is unset or blank
pub const DEFAULT_PROFILE: &str = "development";

const ENV_PREFIX: &str = "THOSUA";
const PROFILE_VAR: &str = "THOSUA_ENV";

/// Everything one load reads: a config directory and an environment snapshot
pub struct ConfigSources {
    dir: PathBuf,
    env: Map<String, String>,
}

impl ConfigSources {
    /// `./config` and the process environment
    pub fn from_process() -> Self {
        Self::new("config", std::env::vars().collect())
    }

    pub fn new(dir: impl Into<PathBuf>, env: Map<String, String>) -> Self {
        Self {
            dir: dir.into(),
            env,
        }
    }

    /// Profile named by `THOSUA_ENV`.
    ///
    /// The name becomes part of a file path, so only `[A-Za-z0-9_-]` is
    /// accepted.
    pub fn profile(&self) -> Result<String> {
        let Some(raw) = self.env.get(PROFILE_VAR).map(|p| p.trim()).filter(|p| !p.is_empty())
        else {
            return Ok(DEFAULT_PROFILE.to_string());
        };
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            bail!("{PROFILE_VAR}='{raw}' is not a valid profile name");
        }
        Ok(raw.to_string())
    }

    pub fn load(&self) -> Result<AppConfig> {
        let profile = self.profile()?;
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name(&self.path("default")).required(false))
            .add_source(File::with_name(&self.path(&profile)).required(false))
            .add_source(File::with_name(&self.path("local")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(self.env.clone())),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if app.gemini.api_key.trim().is_empty() {
            if let Some(key) = api_key_from(|name| self.env.get(name).cloned()) {
                debug!("Gemini API key taken from the environment");
                app.gemini.api_key = key;
            }
        }

        debug!(profile = %profile, dir = %self.dir.display(), "Configuration loaded");
        Ok(app)
    }

    /// Extension-less path of a layer file
    fn path(&self, stem: &str) -> String {
        self.dir.join(stem).to_string_lossy().into_owned()
    }
}

/// Load configuration from `./config` and the process environment
pub fn load_config() -> Result<AppConfig> {
    ConfigSources::from_process().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn env(vars: &[(&str, &str)]) -> Map<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Fresh directory under the system temp dir, unique per test
    fn config_dir(name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("thosua-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.gemini.chat_timeout_secs, 30);
        assert_eq!(config.gemini.vision_timeout_secs, 60);
        assert_eq!(config.gemini.max_retries, 0);
        assert_eq!(config.roster().len(), 2);
    }

    #[test]
    fn test_profile_resolution() {
        let sources = |vars: &[(&str, &str)]| ConfigSources::new("config", env(vars));
        assert_eq!(sources(&[]).profile().unwrap(), DEFAULT_PROFILE);
        assert_eq!(sources(&[("THOSUA_ENV", "  ")]).profile().unwrap(), DEFAULT_PROFILE);
        assert_eq!(
            sources(&[("THOSUA_ENV", "production")]).profile().unwrap(),
            "production"
        );
        assert!(sources(&[("THOSUA_ENV", "../secrets")]).profile().is_err());
    }

    #[test]
    fn test_layer_precedence() {
        let dir = config_dir(
            "layers",
            &[
                ("default.toml", "[gemini]\nmodel = \"from-default\"\nchat_timeout_secs = 11\n"),
                ("production.toml", "[gemini]\nmodel = \"from-profile\"\nmax_retries = 1\n"),
                ("staging.toml", "[gemini]\nmodel = \"from-staging\"\n"),
                ("local.toml", "[gemini]\nmax_retries = 2\n"),
            ],
        );

        let config = ConfigSources::new(
            &dir,
            env(&[
                ("THOSUA_ENV", "production"),
                ("THOSUA_GEMINI__VISION_TIMEOUT_SECS", "90"),
            ]),
        )
        .load()
        .unwrap();

        assert_eq!(config.gemini.model, "from-profile");
        assert_eq!(config.gemini.chat_timeout_secs, 11);
        assert_eq!(config.gemini.max_retries, 2);
        assert_eq!(config.gemini.vision_timeout_secs, 90);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_api_key_merged_from_environment() {
        let dir = config_dir("key-merge", &[]);

        let from_env = ConfigSources::new(&dir, env(&[("GOOGLE_API_KEY", "AIzaGoogleKey123")]))
            .load()
            .unwrap();
        assert_eq!(from_env.gemini.api_key, "AIzaGoogleKey123");

        let configured = ConfigSources::new(
            &dir,
            env(&[
                ("THOSUA_GEMINI__API_KEY", "AIzaConfigured123"),
                ("GEMINI_API_KEY", "AIzaEnvironment123"),
            ]),
        )
        .load()
        .unwrap();
        assert_eq!(configured.gemini.api_key, "AIzaConfigured123");

        let missing = ConfigSources::new(&dir, env(&[])).load().unwrap();
        assert!(missing.gemini.api_key().is_none());

        let _ = fs::remove_dir_all(dir);
    }
}
