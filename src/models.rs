use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ThumbnailError;

/// Songwhip API 응답. 필요한 필드만 디코딩한다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "releaseDate", default)]
    pub release_date: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// oEmbed 공급자(Spotify, CodePen 등)의 응답.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OEmbedResource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub width: Option<serde_json::Value>,
    #[serde(default)]
    pub height: Option<serde_json::Value>,
}

/// 원격 썸네일 URL을 꺼낼 수 있는 메타데이터.
/// 공급자마다 응답 모양이 달라도 같은 `ThumbnailMirror`를 쓰기 위한 트레이트.
pub trait HasThumbnail {
    fn thumbnail_url(&self) -> Option<&str>;
}

impl HasThumbnail for MetadataRecord {
    fn thumbnail_url(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

impl HasThumbnail for OEmbedResource {
    fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }
}

/// 미디어 소스가 제공하는 메타데이터 속성.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataAttribute {
    DefaultName,
    ThumbnailUri,
    Name,
    Url,
    Image,
    ReleaseDate,
    Type,
    Title,
    Html,
    ProviderName,
    AuthorName,
    ThumbnailUrl,
}

impl MetadataAttribute {
    pub fn key(&self) -> &'static str {
        match self {
            Self::DefaultName => "default_name",
            Self::ThumbnailUri => "thumbnail_uri",
            Self::Name => "name",
            Self::Url => "url",
            Self::Image => "image",
            Self::ReleaseDate => "releaseDate",
            Self::Type => "type",
            Self::Title => "title",
            Self::Html => "html",
            Self::ProviderName => "provider_name",
            Self::AuthorName => "author_name",
            Self::ThumbnailUrl => "thumbnail_url",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        const ALL: [MetadataAttribute; 12] = [
            MetadataAttribute::DefaultName,
            MetadataAttribute::ThumbnailUri,
            MetadataAttribute::Name,
            MetadataAttribute::Url,
            MetadataAttribute::Image,
            MetadataAttribute::ReleaseDate,
            MetadataAttribute::Type,
            MetadataAttribute::Title,
            MetadataAttribute::Html,
            MetadataAttribute::ProviderName,
            MetadataAttribute::AuthorName,
            MetadataAttribute::ThumbnailUrl,
        ];
        ALL.into_iter().find(|attr| attr.key() == key)
    }
}

/// 썸네일 미러링 결과.
#[derive(Debug)]
pub enum Thumbnail {
    /// 로컬에 저장된(또는 이미 있던) 썸네일 경로
    Local(PathBuf),
    /// 메타데이터에 이미지가 없음
    NoImage,
    /// 이미지는 있었지만 가져오지 못함
    Failed(ThumbnailError),
}

impl Thumbnail {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path.as_path()),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Self::Local(path) => Some(path),
            _ => None,
        }
    }
}
