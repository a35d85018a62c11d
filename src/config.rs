use std::{
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use color_eyre::eyre::{self, WrapErr as _};
use secstr::SecUtf8;
use serde::{Deserialize, Deserializer};

/// Process environment, read with the `GLHOOK_` prefix.
#[derive(Debug, Clone, Deserialize)]
pub struct Env {
    #[serde(default = "default_config_path")]
    pub config: PathBuf,
}

fn default_config_path() -> PathBuf {
    PathBuf::from("config.json")
}

/// Contents of the settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logfile: Option<PathBuf>,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(
        default,
        alias = "hookaddress",
        deserialize_with = "deserialize_opt_secutf8"
    )]
    pub hook_address: Option<SecUtf8>,
    /// Forward merge request summaries to `hook_address`.
    #[serde(default)]
    pub notify: bool,
    /// Refuse payloads whose event kind can't be determined.
    #[serde(default)]
    pub strict: bool,
}

fn default_address() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn deserialize_opt_secutf8<'de, D>(de: D) -> Result<Option<SecUtf8>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(|o| o.map(SecUtf8::from))
}

impl Settings {
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let raw = std::fs::read(path)
            .wrap_err_with(|| format!("Failed to read settings file {:?}", path))?;
        serde_json::from_slice(&raw)
            .wrap_err_with(|| format!("Failed to parse settings file {:?}", path))
    }

    pub fn bind_address(&self) -> (&str, u16) {
        (&self.address, self.port)
    }
}

/// Current settings snapshot, replaced wholesale on reload.
#[derive(Debug, Clone)]
pub struct SharedSettings(Arc<RwLock<Arc<Settings>>>);

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(settings))))
    }

    pub fn current(&self) -> Arc<Settings> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, settings: Settings) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
    }

    /// Re-reads `path`. On failure the previous snapshot stays active.
    pub fn reload(&self, path: &Path) -> eyre::Result<()> {
        let settings = Settings::load(path)?;
        self.replace(settings);
        Ok(())
    }
}
