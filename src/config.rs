use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:23373";
pub const ENV_TOKEN: &str = "BEEPER_TOKEN";
pub const ENV_ACCESS_TOKEN: &str = "BEEPER_ACCESS_TOKEN";
pub const ENV_BASE_URL: &str = "BEEPER_DESKTOP_BASE_URL";

const APP_DIR_NAME: &str = "beeper";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no access token found (set BEEPER_TOKEN or run `beeper auth set <token>`)")]
    NoToken,
    #[error("could not determine the user config directory (set XDG_CONFIG_HOME)")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Process environment captured once at startup.
#[derive(Clone, Debug, Default)]
pub struct Env {
    pub token: Option<String>,
    pub access_token: Option<String>,
    pub config_home: Option<PathBuf>,
    pub base_url: Option<String>,
    pub log_filter: Option<String>,
}

impl Env {
    pub fn from_process() -> Self {
        Self {
            token: env::var(ENV_TOKEN).ok(),
            access_token: env::var(ENV_ACCESS_TOKEN).ok(),
            config_home: env::var_os("XDG_CONFIG_HOME")
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            base_url: env::var(ENV_BASE_URL).ok(),
            log_filter: env::var("BEEPER_LOG").or_else(|_| env::var("RUST_LOG")).ok(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenSource {
    Env,
    EnvSdk,
    Config,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Env => "env",
            TokenSource::EnvSdk => "env-sdk",
            TokenSource::Config => "config",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TokenSource::Env => ENV_TOKEN,
            TokenSource::EnvSdk => ENV_ACCESS_TOKEN,
            TokenSource::Config => "config file",
        }
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub env: Env,
    pub base_url: String,
}

impl Config {
    pub fn load(env: Env) -> Self {
        let base_url = env
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Self { env, base_url }
    }

    pub fn dir(&self) -> Result<PathBuf, ConfigError> {
        self.env
            .config_home
            .clone()
            .or_else(dirs::config_dir)
            .map(|base| base.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn file_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.dir()?.join(CONFIG_FILE_NAME))
    }

    pub fn token_store(&self) -> Result<TokenStore, ConfigError> {
        Ok(TokenStore::new(self.file_path()?))
    }

    /// Resolves the access token: `BEEPER_TOKEN`, then `BEEPER_ACCESS_TOKEN`,
    /// then the config file.
    pub fn get_token(&self) -> Result<(String, TokenSource), ConfigError> {
        if let Some(token) = non_empty(self.env.token.as_deref()) {
            debug!(source = %TokenSource::Env, "resolved access token");
            return Ok((token, TokenSource::Env));
        }
        if let Some(token) = non_empty(self.env.access_token.as_deref()) {
            debug!(source = %TokenSource::EnvSdk, "resolved access token");
            return Ok((token, TokenSource::EnvSdk));
        }

        let store = match self.token_store() {
            Ok(store) => store,
            Err(ConfigError::NoConfigDir) => return Err(ConfigError::NoToken),
            Err(err) => return Err(err),
        };
        match store.load_token()? {
            Some(token) => {
                debug!(source = %TokenSource::Config, path = %store.path().display(), "resolved access token");
                Ok((token, TokenSource::Config))
            }
            None => Err(ConfigError::NoToken),
        }
    }

    pub fn set_token(&self, token: &str) -> Result<PathBuf, ConfigError> {
        let store = self.token_store()?;
        store.store_token(token.trim())?;
        Ok(store.path().to_path_buf())
    }

    pub fn clear_token(&self) -> Result<bool, ConfigError> {
        self.token_store()?.clear_token()
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<i64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Reads and writes the token held in `config.json`. Writes are not locked.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_token(&self) -> Result<Option<String>, ConfigError> {
        let file = self.load_file()?;
        Ok(non_empty(file.access_token.as_deref()))
    }

    pub fn store_token(&self, token: &str) -> Result<(), ConfigError> {
        let mut file = self.load_file()?;
        file.access_token = Some(token.to_string());
        file.updated_at = Some(current_epoch_seconds() as i64);
        self.save_file(&file)
    }

    pub fn clear_token(&self) -> Result<bool, ConfigError> {
        if !self.path.exists() {
            return Ok(false);
        }
        let mut file = self.load_file()?;
        let had_token = file.access_token.take().is_some();
        file.updated_at = Some(current_epoch_seconds() as i64);
        self.save_file(&file)?;
        Ok(had_token)
    }

    fn load_file(&self) -> Result<ConfigFile, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
            Err(err) => return Err(ConfigError::Io(err)),
        };
        if contents.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_file(&self, file: &ConfigFile) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let payload = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, payload)?;
        set_file_permissions(&self.path, 0o600)?;
        Ok(())
    }
}

fn ensure_dir(path: &Path) -> Result<(), io::Error> {
    fs::create_dir_all(path)?;
    set_dir_permissions(path, 0o700)?;
    Ok(())
}

fn current_epoch_seconds() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(unix)]
fn set_file_permissions(path: &Path, mode: u32) -> Result<(), io::Error> {
    use std::os::unix::fs::PermissionsExt;
    let perm = fs::Permissions::from_mode(mode);
    fs::set_permissions(path, perm)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path, mode: u32) -> Result<(), io::Error> {
    use std::os::unix::fs::PermissionsExt;
    let perm = fs::Permissions::from_mode(mode);
    fs::set_permissions(path, perm)
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path, _mode: u32) -> Result<(), io::Error> {
    Ok(())
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path, _mode: u32) -> Result<(), io::Error> {
    Ok(())
}
