pub mod cache;
pub mod fetcher;
pub mod http;
pub mod thumbnail;

use base64::Engine;
use sha2::{Digest, Sha256};

/// SHA-256 해시를 URL-safe base64(패딩 없음)로 인코딩한다.
/// 파일명에 그대로 쓸 수 있고 실행마다 같은 값을 낸다.
pub fn hash_base64(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}
