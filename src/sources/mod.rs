pub mod oembed;
pub mod songwhip;

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;

use crate::core::cache::{CacheBackend, FileCache};
use crate::core::http::HttpClient;
use crate::core::thumbnail::{FileSystem, ThumbnailMirror};
use crate::config::Config;
use crate::error::FetchError;
use crate::models::{HasThumbnail, MetadataAttribute, Thumbnail};

use oembed::{OEmbedProvider, OEmbedSource};
use songwhip::Songwhip;

/// 미디어 메타데이터 소스 트레이트.
/// Songwhip, Spotify, CodePen 등 임베드 가능한 서비스를 이 트레이트로 추상화한다.
pub trait MediaSource {
    fn name(&self) -> &str;
    /// 이 소스가 제공하는 속성과 화면에 보일 이름.
    fn metadata_attributes(&self) -> &'static [(MetadataAttribute, &'static str)];
    /// 소스 URL의 속성 값을 가져온다. 빈 URL이나 지원하지 않는 속성은 `None`.
    fn metadata(
        &self,
        source_url: &str,
        attribute: MetadataAttribute,
    ) -> Result<Option<String>, FetchError>;
    /// `metadata_attributes()`의 모든 속성 값을 같은 순서로 돌려준다.
    /// 캐시가 꺼져 있어도 요청은 한 번만 보낸다.
    fn all_metadata(
        &self,
        source_url: &str,
    ) -> Result<Vec<(MetadataAttribute, Option<String>)>, FetchError>;
    /// 썸네일 생성 설정과 관계없이 썸네일을 미러링한다.
    fn thumbnail(&self, source_url: &str) -> Result<Thumbnail, FetchError>;
}

/// 썸네일 미러와 저장 디렉토리.
#[derive(Clone)]
pub struct Thumbnails {
    mirror: Arc<ThumbnailMirror>,
    directory: PathBuf,
    generate: bool,
}

impl Thumbnails {
    pub fn new(mirror: Arc<ThumbnailMirror>, directory: impl Into<PathBuf>, generate: bool) -> Self {
        Self {
            mirror,
            directory: directory.into(),
            generate,
        }
    }

    pub fn localize<T: HasThumbnail + ?Sized>(&self, item: &T) -> Thumbnail {
        self.mirror.localize(item, &self.directory)
    }

    /// `thumbnail_uri` 속성 값. 생성이 꺼져 있거나 실패하면 `None`.
    pub fn uri<T: HasThumbnail + ?Sized>(&self, item: &T) -> Option<String> {
        if !self.generate {
            return None;
        }
        self.localize(item)
            .into_path()
            .map(|path| path.display().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Songwhip,
    Spotify,
    Codepen,
}

impl SourceKind {
    /// URL 모양으로 소스를 고른다. oEmbed 공급자가 아니면 Songwhip.
    pub fn detect(url: &str) -> Self {
        let rest = url
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let host = rest.split(['/', '?', '#']).next().unwrap_or("");
        let host = host.strip_prefix("www.").unwrap_or(host);

        match host {
            "open.spotify.com" => Self::Spotify,
            "codepen.io" => Self::Codepen,
            _ => Self::Songwhip,
        }
    }

    fn cache_bin(&self) -> &'static str {
        match self {
            Self::Songwhip => "songwhip",
            Self::Spotify => "spotify_oembed",
            Self::Codepen => "codepen_oembed",
        }
    }
}

/// 설정에 따라 소스를 조립한다. 캐시 빈은 소스마다 따로 둔다.
pub fn build_source(
    kind: SourceKind,
    config: &Config,
    http: Arc<dyn HttpClient>,
    fs: Arc<dyn FileSystem>,
) -> Box<dyn MediaSource> {
    let cache: Option<Arc<dyn CacheBackend>> = if config.cache.enabled {
        let dir = config.cache_directory().join(kind.cache_bin());
        Some(Arc::new(FileCache::new(dir)))
    } else {
        None
    };

    let thumbnails = Thumbnails::new(
        Arc::new(ThumbnailMirror::new(http.clone(), fs)),
        config.thumbnails_directory(kind),
        config.thumbnails.generate,
    );

    match kind {
        SourceKind::Songwhip => Box::new(Songwhip::new(
            &config.songwhip.api_url,
            http,
            cache,
            thumbnails,
        )),
        SourceKind::Spotify => Box::new(OEmbedSource::new(
            OEmbedProvider::spotify(),
            http,
            cache,
            thumbnails,
        )),
        SourceKind::Codepen => Box::new(OEmbedSource::new(
            OEmbedProvider::codepen(),
            http,
            cache,
            thumbnails,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFileSystem, FakeHttp};

    #[test]
    fn test_detect_source_kind() {
        assert_eq!(
            SourceKind::detect("https://open.spotify.com/track/4RewTiGEGoO7FWNZUmp1f4"),
            SourceKind::Spotify
        );
        assert_eq!(
            SourceKind::detect("https://codepen.io/team/codepen/pen/PNaGbb"),
            SourceKind::Codepen
        );
        assert_eq!(
            SourceKind::detect("https://www.codepen.io/team/codepen/pen/PNaGbb"),
            SourceKind::Codepen
        );
        assert_eq!(
            SourceKind::detect("https://music.apple.com/album/1"),
            SourceKind::Songwhip
        );
        assert_eq!(
            SourceKind::detect("https://open.spotify.com.evil.example/track/1"),
            SourceKind::Songwhip
        );
    }

    #[test]
    fn test_thumbnail_uri_respects_generate_flag() {
        let http = Arc::new(FakeHttp::new());
        http.respond("https://x/y/cover.png", 200, b"PNG".to_vec());
        let mirror = Arc::new(ThumbnailMirror::new(
            http.clone(),
            Arc::new(FakeFileSystem::new()),
        ));
        let record = crate::models::MetadataRecord {
            name: "a".to_string(),
            url: "b".to_string(),
            image: Some("https://x/y/cover.png".to_string()),
            release_date: None,
            kind: None,
        };

        let disabled = Thumbnails::new(mirror.clone(), "/thumbs", false);
        assert!(disabled.uri(&record).is_none());
        assert_eq!(http.call_count(), 0);

        let enabled = Thumbnails::new(mirror, "/thumbs", true);
        let uri = enabled.uri(&record).unwrap();
        assert!(uri.starts_with("/thumbs/"));
        assert!(uri.ends_with(".png.jpg"));
    }

    #[test]
    fn test_build_source_names() {
        let config = Config::default();
        let http: Arc<dyn HttpClient> = Arc::new(FakeHttp::new());
        let fs: Arc<dyn FileSystem> = Arc::new(FakeFileSystem::new());

        let names: Vec<String> = [SourceKind::Songwhip, SourceKind::Spotify, SourceKind::Codepen]
            .into_iter()
            .map(|kind| build_source(kind, &config, http.clone(), fs.clone()).name().to_string())
            .collect();
        assert_eq!(names, vec!["Songwhip", "Spotify", "CodePen"]);
    }
}
