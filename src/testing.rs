#![cfg(test)]
//! 테스트용 가짜 협력자.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::core::cache::Clock;
use crate::core::http::{HttpClient, HttpResponse};
use crate::core::thumbnail::FileSystem;
use crate::error::TransportError;

#[derive(Clone)]
enum FakeReply {
    Response(HttpResponse),
    Error(String),
}

/// URL마다 정해 둔 응답을 돌려주고 호출을 기록하는 HTTP 클라이언트.
/// 등록되지 않은 URL은 404를 돌려준다.
#[derive(Default)]
pub struct FakeHttp {
    replies: Mutex<HashMap<String, FakeReply>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.replies.lock().unwrap().insert(
            url.to_string(),
            FakeReply::Response(HttpResponse {
                status,
                body: body.into(),
            }),
        );
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), FakeReply::Error(message.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl HttpClient for FakeHttp {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push((
            url.to_string(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));

        match self.replies.lock().unwrap().get(url).cloned() {
            Some(FakeReply::Response(resp)) => Ok(resp),
            Some(FakeReply::Error(message)) => Err(TransportError::new(message)),
            None => Ok(HttpResponse {
                status: 404,
                body: Vec::new(),
            }),
        }
    }
}

/// 메모리에 파일을 두고 모든 호출을 기록하는 파일 시스템.
#[derive(Default)]
pub struct FakeFileSystem {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    ops: Mutex<Vec<String>>,
    deny_directories: bool,
    deny_writes: bool,
}

impl FakeFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only_directories() -> Self {
        Self {
            deny_directories: true,
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            deny_writes: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, path: &Path, data: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
    }

    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: &str, path: &Path) {
        self.ops
            .lock()
            .unwrap()
            .push(format!("{op} {}", path.display()));
    }
}

impl FileSystem for FakeFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.record("exists", path);
        self.files.lock().unwrap().contains_key(path)
    }

    fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        self.record("ensure_directory", path);
        if self.deny_directories {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("No write permission for {}", path.display()),
            ));
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.record("write_file", path);
        if self.deny_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.insert(path, data);
        Ok(())
    }
}

/// 수동으로 움직이는 시계.
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
