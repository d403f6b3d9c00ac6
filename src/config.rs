use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::sources::songwhip::DEFAULT_API_URL;
use crate::sources::SourceKind;

const APP_DIR: &str = "media-embeds";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub songwhip: SongwhipConfig,
    #[serde(default)]
    pub thumbnails: ThumbnailsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongwhipConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for SongwhipConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailsConfig {
    /// 썸네일 기본 디렉토리. 소스별 하위 디렉토리가 만들어진다.
    pub directory: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub generate: bool,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            generate: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub directory: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}

fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join(APP_DIR)
}

impl Config {
    pub fn thumbnails_directory(&self, kind: SourceKind) -> PathBuf {
        let base = self
            .thumbnails
            .directory
            .clone()
            .unwrap_or_else(|| data_dir().join("files"));
        let sub = match kind {
            SourceKind::Songwhip => "songwhip_thumbnails",
            SourceKind::Spotify | SourceKind::Codepen => "oembed_thumbnails",
        };
        base.join(sub)
    }

    pub fn cache_directory(&self) -> PathBuf {
        self.cache
            .directory
            .clone()
            .unwrap_or_else(|| home_dir().join(".cache").join(APP_DIR))
    }
}

pub fn config_path() -> PathBuf {
    home_dir().join(".config").join(APP_DIR).join("config.toml")
}

pub fn load_config() -> Config {
    load_config_from(&config_path())
}

/// 설정 파일을 읽는다. 없거나 잘못된 파일이면 기본값을 쓴다.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|error| {
            warn!(%error, path = %path.display(), "Invalid config file, using defaults");
            Config::default()
        }),
        Err(error) => {
            warn!(%error, path = %path.display(), "Unable to read config file");
            Config::default()
        }
    }
}

pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
