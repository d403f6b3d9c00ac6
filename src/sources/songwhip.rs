use std::sync::Arc;

use tracing::debug;

use crate::core::cache::CacheBackend;
use crate::core::fetcher::{Endpoint, MetadataFetcher};
use crate::core::http::HttpClient;
use crate::error::FetchError;
use crate::models::{MetadataAttribute, MetadataRecord, Thumbnail};
use crate::sources::{MediaSource, Thumbnails};

pub const DEFAULT_API_URL: &str = "https://songwhip.com/api/";

const ATTRIBUTES: &[(MetadataAttribute, &str)] = &[
    (MetadataAttribute::Name, "Name"),
    (MetadataAttribute::Url, "URL"),
    (MetadataAttribute::ReleaseDate, "Release date"),
    (MetadataAttribute::Type, "Media type"),
    (MetadataAttribute::Image, "Image"),
];

/// Songwhip API 소스.
/// 스트리밍 서비스 URL 하나로 Songwhip 페이지 정보(이름, 임베드 URL, 이미지 등)를 얻는다.
pub struct Songwhip {
    fetcher: MetadataFetcher<MetadataRecord>,
    thumbnails: Thumbnails,
}

impl Songwhip {
    pub fn new(
        api_url: &str,
        http: Arc<dyn HttpClient>,
        cache: Option<Arc<dyn CacheBackend>>,
        thumbnails: Thumbnails,
    ) -> Self {
        let fetcher = MetadataFetcher::new(Endpoint::new(api_url, "q"), http, cache);
        Self {
            fetcher,
            thumbnails,
        }
    }

    pub fn fetch(&self, source_url: &str) -> Result<MetadataRecord, FetchError> {
        self.fetcher.fetch(source_url)
    }

    fn value(&self, record: &MetadataRecord, attribute: MetadataAttribute) -> Option<String> {
        match attribute {
            MetadataAttribute::DefaultName | MetadataAttribute::Name => Some(record.name.clone()),
            MetadataAttribute::Url => Some(record.url.clone()),
            MetadataAttribute::Image => record.image.clone(),
            MetadataAttribute::ReleaseDate => record.release_date.clone(),
            MetadataAttribute::Type => record.kind.clone(),
            MetadataAttribute::ThumbnailUri => self.thumbnails.uri(record),
            other => {
                debug!(attribute = other.key(), "Attribute not provided by Songwhip");
                None
            }
        }
    }
}

impl MediaSource for Songwhip {
    fn name(&self) -> &str {
        "Songwhip"
    }

    fn metadata_attributes(&self) -> &'static [(MetadataAttribute, &'static str)] {
        ATTRIBUTES
    }

    fn metadata(
        &self,
        source_url: &str,
        attribute: MetadataAttribute,
    ) -> Result<Option<String>, FetchError> {
        if source_url.trim().is_empty() {
            return Ok(None);
        }

        let record = self.fetch(source_url)?;
        Ok(self.value(&record, attribute))
    }

    fn all_metadata(
        &self,
        source_url: &str,
    ) -> Result<Vec<(MetadataAttribute, Option<String>)>, FetchError> {
        if source_url.trim().is_empty() {
            return Ok(ATTRIBUTES.iter().map(|(attr, _)| (*attr, None)).collect());
        }

        let record = self.fetch(source_url)?;
        Ok(ATTRIBUTES
            .iter()
            .map(|(attr, _)| (*attr, self.value(&record, *attr)))
            .collect())
    }

    fn thumbnail(&self, source_url: &str) -> Result<Thumbnail, FetchError> {
        let record = self.fetch(source_url)?;
        Ok(self.thumbnails.localize(&record))
    }
}
