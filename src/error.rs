use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// 전송 계층(HTTP 클라이언트) 오류.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// 메타데이터 조회 오류. 호출자에게 그대로 전파된다.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Could not retrieve response for {url}.")]
    FetchFailed { url: String },

    #[error("Could not decode response for {url}: {source}")]
    DecodeFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request for {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: TransportError,
    },
}

/// 썸네일 미러링 실패 원인. 전파되지 않고 `Thumbnail::Failed`에 담긴다.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Could not prepare thumbnail destination directory {}", dir.display())]
    DirectoryUnavailable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not download remote thumbnail from {url}: {source}")]
    RemoteRequestFailed {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Remote thumbnail {url} answered with HTTP {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Could not save thumbnail to {}", path.display())]
    LocalWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
