use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::cache::{CacheBackend, Clock, SystemClock};
use crate::core::http::HttpClient;
use crate::error::FetchError;

/// 캐시된 응답의 유효 기간 (7일).
pub const METADATA_TTL_SECS: u64 = 86_400 * 7;

/// 메타데이터 API 엔드포인트와 소스 URL을 넘길 쿼리 파라미터 이름.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub url_param: &'static str,
    pub extra_query: Vec<(&'static str, &'static str)>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, url_param: &'static str) -> Self {
        Self {
            url: url.into(),
            url_param,
            extra_query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &'static str, value: &'static str) -> Self {
        self.extra_query.push((key, value));
        self
    }
}

/// 소스 URL로 외부 API를 조회하고 응답을 7일간 캐시한다.
///
/// `R`은 응답을 디코딩할 레코드 타입이다. 캐시에는 디코딩에 성공한 원본 JSON만 저장한다.
pub struct MetadataFetcher<R> {
    endpoint: Endpoint,
    http: Arc<dyn HttpClient>,
    cache: Option<Arc<dyn CacheBackend>>,
    clock: Arc<dyn Clock>,
    _record: PhantomData<fn() -> R>,
}

impl<R: DeserializeOwned> MetadataFetcher<R> {
    pub fn new(
        endpoint: Endpoint,
        http: Arc<dyn HttpClient>,
        cache: Option<Arc<dyn CacheBackend>>,
    ) -> Self {
        Self {
            endpoint,
            http,
            cache,
            clock: Arc::new(SystemClock),
            _record: PhantomData,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// 소스 URL의 메타데이터를 가져온다. 캐시가 유효하면 네트워크를 타지 않는다.
    pub fn fetch(&self, url: &str) -> Result<R, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::FetchFailed {
                url: url.to_string(),
            });
        }

        let now = self.clock.now();

        if let Some(record) = self.cached(url, now) {
            return Ok(record);
        }

        let payload = self.request(url)?;
        let record = serde_json::from_value::<R>(payload.clone()).map_err(|source| {
            FetchError::DecodeFailed {
                url: url.to_string(),
                source,
            }
        })?;

        if let Some(cache) = &self.cache {
            cache.set(url, payload, now + METADATA_TTL_SECS);
        }

        Ok(record)
    }

    fn cached(&self, url: &str, now: u64) -> Option<R> {
        let entry = self.cache.as_ref()?.get(url)?;

        if entry.is_expired(now) {
            debug!(url, expires_at = entry.expires_at, "Cached metadata expired");
            return None;
        }

        match serde_json::from_value::<R>(entry.data) {
            Ok(record) => {
                debug!(url, "Metadata served from cache");
                Some(record)
            }
            Err(error) => {
                warn!(?error, url, "Discarding undecodable cache entry");
                None
            }
        }
    }

    fn request(&self, url: &str) -> Result<Value, FetchError> {
        let mut query = vec![(self.endpoint.url_param, url)];
        query.extend(self.endpoint.extra_query.iter().copied());

        debug!(endpoint = %self.endpoint.url, url, "Requesting metadata");
        let resp = self
            .http
            .get(&self.endpoint.url, &query)
            .map_err(|source| FetchError::RequestFailed {
                url: url.to_string(),
                source,
            })?;

        let failed = || FetchError::FetchFailed {
            url: url.to_string(),
        };

        if !resp.is_success() {
            warn!(url, status = resp.status, "Metadata API returned an error status");
            return Err(failed());
        }

        if resp.body.iter().all(u8::is_ascii_whitespace) {
            return Err(failed());
        }

        let payload: Value =
            serde_json::from_slice(&resp.body).map_err(|source| FetchError::DecodeFailed {
                url: url.to_string(),
                source,
            })?;

        if is_empty_payload(&payload) {
            return Err(failed());
        }

        Ok(payload)
    }
}

/// 값이 없는 것과 같은 응답: `null`, `false`, `0`, `""`, `"0"`, `[]`, `{}`.
fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
