use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::hash_base64;

/// 현재 시각(epoch 초)을 알려주는 시계.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// 캐시에 저장된 응답과 만료 시각.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    pub expires_at: u64,
}

impl CacheEntry {
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// 키(소스 URL) → 응답 저장소.
/// 만료 판단은 호출자가 `CacheEntry::is_expired`로 한다.
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn set(&self, key: &str, data: Value, expires_at: u64);
}

/// 프로세스 메모리 캐시.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, data: Value, expires_at: u64) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), CacheEntry { data, expires_at });
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    #[serde(flatten)]
    entry: CacheEntry,
}

/// 디스크 캐시. 빈(bin) 디렉토리 아래 키마다 JSON 파일 하나를 둔다.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hash_base64(key)))
    }
}

impl CacheBackend for FileCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(?error, path = %path.display(), "Unable to read cache entry");
                return None;
            }
        };

        match serde_json::from_str::<StoredEntry>(&content) {
            // 해시 충돌 대비
            Ok(stored) if stored.key == key => Some(stored.entry),
            Ok(_) => None,
            Err(error) => {
                warn!(?error, path = %path.display(), "Discarding corrupt cache entry");
                None
            }
        }
    }

    fn set(&self, key: &str, data: Value, expires_at: u64) {
        let path = self.entry_path(key);
        let stored = StoredEntry {
            key: key.to_string(),
            entry: CacheEntry { data, expires_at },
        };

        let result = std::fs::create_dir_all(&self.dir).and_then(|_| {
            let content = serde_json::to_vec(&stored)?;
            std::fs::write(&path, content)
        });

        match result {
            Ok(()) => debug!(key, path = %path.display(), "Cache entry written"),
            Err(error) => warn!(?error, key, "Unable to write cache entry"),
        }
    }
}
