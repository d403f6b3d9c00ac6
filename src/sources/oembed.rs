use std::sync::Arc;

use tracing::debug;

use crate::core::cache::CacheBackend;
use crate::core::fetcher::{Endpoint, MetadataFetcher};
use crate::core::http::HttpClient;
use crate::error::FetchError;
use crate::models::{MetadataAttribute, OEmbedResource, Thumbnail};
use crate::sources::{MediaSource, Thumbnails};

const ATTRIBUTES: &[(MetadataAttribute, &str)] = &[
    (MetadataAttribute::Type, "Resource type"),
    (MetadataAttribute::Title, "Resource title"),
    (MetadataAttribute::AuthorName, "Author/owner name"),
    (MetadataAttribute::ProviderName, "Provider name"),
    (MetadataAttribute::ThumbnailUrl, "Thumbnail URL"),
    (MetadataAttribute::Html, "HTML representation"),
];

/// oEmbed 공급자 정보.
#[derive(Debug, Clone)]
pub struct OEmbedProvider {
    pub name: &'static str,
    pub endpoint: Endpoint,
}

impl OEmbedProvider {
    pub fn spotify() -> Self {
        Self {
            name: "Spotify",
            endpoint: Endpoint::new("https://open.spotify.com/oembed", "url"),
        }
    }

    pub fn codepen() -> Self {
        Self {
            name: "CodePen",
            endpoint: Endpoint::new("https://codepen.io/api/oembed", "url")
                .with_query("format", "json"),
        }
    }
}

/// oEmbed 공급자 하나에 대한 소스. Spotify와 CodePen이 이 구현을 같이 쓴다.
pub struct OEmbedSource {
    name: &'static str,
    fetcher: MetadataFetcher<OEmbedResource>,
    thumbnails: Thumbnails,
}

impl OEmbedSource {
    pub fn new(
        provider: OEmbedProvider,
        http: Arc<dyn HttpClient>,
        cache: Option<Arc<dyn CacheBackend>>,
        thumbnails: Thumbnails,
    ) -> Self {
        Self {
            name: provider.name,
            fetcher: MetadataFetcher::new(provider.endpoint, http, cache),
            thumbnails,
        }
    }

    pub fn fetch(&self, source_url: &str) -> Result<OEmbedResource, FetchError> {
        self.fetcher.fetch(source_url)
    }

    fn value(&self, resource: &OEmbedResource, attribute: MetadataAttribute) -> Option<String> {
        match attribute {
            MetadataAttribute::Type => Some(resource.kind.clone()),
            MetadataAttribute::DefaultName | MetadataAttribute::Title => resource.title.clone(),
            MetadataAttribute::AuthorName => resource.author_name.clone(),
            MetadataAttribute::ProviderName => resource.provider_name.clone(),
            MetadataAttribute::Html => resource.html.clone(),
            MetadataAttribute::ThumbnailUrl => resource.thumbnail_url.clone(),
            MetadataAttribute::ThumbnailUri => self.thumbnails.uri(resource),
            other => {
                debug!(
                    provider = self.name,
                    attribute = other.key(),
                    "Attribute not provided by oEmbed resource"
                );
                None
            }
        }
    }
}

impl MediaSource for OEmbedSource {
    fn name(&self) -> &str {
        self.name
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

        let resource = self.fetch(source_url)?;
        Ok(self.value(&resource, attribute))
    }

    fn all_metadata(
        &self,
        source_url: &str,
    ) -> Result<Vec<(MetadataAttribute, Option<String>)>, FetchError> {
        if source_url.trim().is_empty() {
            return Ok(ATTRIBUTES.iter().map(|(attr, _)| (*attr, None)).collect());
        }

        let resource = self.fetch(source_url)?;
        Ok(ATTRIBUTES
            .iter()
            .map(|(attr, _)| (*attr, self.value(&resource, *attr)))
            .collect())
    }

    fn thumbnail(&self, source_url: &str) -> Result<Thumbnail, FetchError> {
        let resource = self.fetch(source_url)?;
        Ok(self.thumbnails.localize(&resource))
    }
}
