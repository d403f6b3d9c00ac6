use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::hash_base64;
use crate::core::http::HttpClient;
use crate::error::ThumbnailError;
use crate::models::{HasThumbnail, Thumbnail};

/// 썸네일 저장에 필요한 파일 시스템 연산.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    /// 디렉토리가 없으면 만들고, 쓰기 가능한지 확인한다.
    fn ensure_directory(&self, path: &Path) -> io::Result<()>;
    /// 파일 전체를 덮어쓴다.
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)?;
        // 권한 비트만으로는 소유자가 다른 디렉토리를 알 수 없어 실제로 파일을 만들어 본다
        tempfile::NamedTempFile::new_in(path)?;
        Ok(())
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // 같은 디렉토리의 임시 파일에 다 쓴 뒤 옮긴다. 실패하면 임시 파일은 drop 시 지워진다
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
        }
        file.write_all(data)?;
        file.persist(path)?;
        Ok(())
    }
}

/// URL 마지막 경로 조각의 확장자. 쿼리와 프래그먼트는 무시한다.
/// 확장자가 없으면 빈 문자열.
pub fn url_extension(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    let basename = path.rsplit('/').next().unwrap_or(path);
    basename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
}

/// 원격 썸네일 URL로부터 로컬 파일 경로를 계산한다.
///
/// `{dir}/{hash}.{ext}.jpg` 형식이다. 실제 이미지 형식과 관계없이 항상 `.jpg`를 붙인다.
///
/// CodePen을 포함한 모든 소스가 이 규칙을 공유한다. Drupal 코어 oEmbed는 CodePen
/// 썸네일에 `.jpg`를 붙이지 않으므로 같은 이미지라도 파일 이름이 다르다
/// (`cover.png` → `{hash}.png.jpg`).
pub fn local_thumbnail_path(dir: &Path, remote_url: &str) -> PathBuf {
    let file_name = format!("{}.{}.jpg", hash_base64(remote_url), url_extension(remote_url));
    dir.join(file_name)
}

/// 원격 썸네일을 로컬 디렉토리에 한 번만 내려받아 두는 미러.
///
/// 실패는 호출자에게 전파되지 않는다. 경고 로그를 남기고 `Thumbnail::Failed`를 돌려준다.
pub struct ThumbnailMirror {
    http: Arc<dyn HttpClient>,
    fs: Arc<dyn FileSystem>,
}

impl ThumbnailMirror {
    pub fn new(http: Arc<dyn HttpClient>, fs: Arc<dyn FileSystem>) -> Self {
        Self { http, fs }
    }

    pub fn localize<T: HasThumbnail + ?Sized>(&self, item: &T, dir: &Path) -> Thumbnail {
        let remote_url = match item.thumbnail_url() {
            Some(url) if !url.trim().is_empty() => url,
            _ => return Thumbnail::NoImage,
        };

        let local_path = local_thumbnail_path(dir, remote_url);

        if self.fs.exists(&local_path) {
            debug!(path = %local_path.display(), "Thumbnail already mirrored");
            return Thumbnail::Local(local_path);
        }

        if let Err(source) = self.fs.ensure_directory(dir) {
            return Self::failed(ThumbnailError::DirectoryUnavailable {
                dir: dir.to_path_buf(),
                source,
            });
        }

        let resp = match self.http.get(remote_url, &[]) {
            Ok(resp) => resp,
            Err(source) => {
                return Self::failed(ThumbnailError::RemoteRequestFailed {
                    url: remote_url.to_string(),
                    source,
                })
            }
        };

        if resp.status != 200 {
            return Self::failed(ThumbnailError::UnexpectedStatus {
                url: remote_url.to_string(),
                status: resp.status,
            });
        }

        if let Err(source) = self.fs.write_file(&local_path, &resp.body) {
            return Self::failed(ThumbnailError::LocalWriteFailed {
                path: local_path,
                source,
            });
        }

        info!(
            url = remote_url,
            path = %local_path.display(),
            bytes = resp.body.len(),
            "Thumbnail mirrored"
        );
        Thumbnail::Local(local_path)
    }

    fn failed(error: ThumbnailError) -> Thumbnail {
        warn!(%error, "Thumbnail unavailable");
        Thumbnail::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetadataRecord;
    use crate::testing::{FakeFileSystem, FakeHttp};

    const COVER: &str = "https://x/y/cover.png";

    fn record(image: Option<&str>) -> MetadataRecord {
        MetadataRecord {
            name: "Blueming".to_string(),
            url: "https://songwhip.com/iu/blueming".to_string(),
            image: image.map(str::to_string),
            release_date: Some("2019-11-18".to_string()),
            kind: Some("track".to_string()),
        }
    }

    fn mirror(http: &Arc<FakeHttp>, fs: &Arc<FakeFileSystem>) -> ThumbnailMirror {
        ThumbnailMirror::new(http.clone(), fs.clone())
    }

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("https://x/y/cover.png"), "png");
        assert_eq!(url_extension("https://x/y/cover.tar.gz"), "gz");
        assert_eq!(url_extension("https://i.scdn.co/image/ab67616d0000b273"), "");
        assert_eq!(url_extension("https://x/y/cover.webp?size=640#top"), "webp");
        assert_eq!(url_extension("https://x.com/y/"), "");
    }

    #[test]
    fn test_local_path_concatenation() {
        let path = local_thumbnail_path(Path::new("/thumbs"), COVER);
        let expected = format!("{}.png.jpg", hash_base64(COVER));
        assert_eq!(path, Path::new("/thumbs").join(expected));
        assert_eq!(path, local_thumbnail_path(Path::new("/thumbs"), COVER));
    }

    #[test]
    fn test_local_path_without_extension() {
        let url = "https://i.scdn.co/image/ab67616d0000b273";
        let path = local_thumbnail_path(Path::new("/thumbs"), url);
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{}..jpg", hash_base64(url))
        );
    }

    #[test]
    fn test_no_image_performs_no_io() {
        let http = Arc::new(FakeHttp::new());
        let fs = Arc::new(FakeFileSystem::new());

        let result = mirror(&http, &fs).localize(&record(None), Path::new("/thumbs"));
        assert!(matches!(result, Thumbnail::NoImage));

        let result = mirror(&http, &fs).localize(&record(Some("")), Path::new("/thumbs"));
        assert!(matches!(result, Thumbnail::NoImage));

        assert_eq!(http.call_count(), 0);
        assert!(fs.ops().is_empty());
    }

    #[test]
    fn test_localize_is_idempotent() {
        let http = Arc::new(FakeHttp::new());
        let fs = Arc::new(FakeFileSystem::new());
        http.respond(COVER, 200, b"PNGDATA".to_vec());
        let mirror = mirror(&http, &fs);
        let dir = Path::new("/thumbs");

        let first = mirror.localize(&record(Some(COVER)), dir).into_path().unwrap();
        let second = mirror.localize(&record(Some(COVER)), dir).into_path().unwrap();

        assert_eq!(first, second);
        assert_eq!(http.call_count(), 1);
        assert_eq!(fs.file(&first).as_deref(), Some(&b"PNGDATA"[..]));
        assert_eq!(
            fs.ops().iter().filter(|op| op.starts_with("write_file")).count(),
            1
        );
    }

    #[test]
    fn test_existing_file_short_circuits() {
        let http = Arc::new(FakeHttp::new());
        let fs = Arc::new(FakeFileSystem::new());
        let dir = Path::new("/thumbs");
        fs.insert(&local_thumbnail_path(dir, COVER), b"old");

        let result = mirror(&http, &fs).localize(&record(Some(COVER)), dir);
        assert_eq!(result.path(), Some(local_thumbnail_path(dir, COVER).as_path()));
        assert_eq!(http.call_count(), 0);
        assert_eq!(fs.ops().len(), 1);
    }

    #[test]
    fn test_directory_failure_skips_download() {
        let http = Arc::new(FakeHttp::new());
        let fs = Arc::new(FakeFileSystem::read_only_directories());
        http.respond(COVER, 200, b"PNGDATA".to_vec());

        let result = mirror(&http, &fs).localize(&record(Some(COVER)), Path::new("/thumbs"));
        match result {
            Thumbnail::Failed(ThumbnailError::DirectoryUnavailable { dir, .. }) => {
                assert_eq!(dir, Path::new("/thumbs"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(http.call_count(), 0);
        assert!(!fs.ops().iter().any(|op| op.starts_with("write_file")));
    }

    #[test]
    fn test_not_found_leaves_no_file() {
        let http = Arc::new(FakeHttp::new());
        let fs = Arc::new(FakeFileSystem::new());
        http.respond(COVER, 404, b"not found".to_vec());
        let dir = Path::new("/thumbs");

        let result = mirror(&http, &fs).localize(&record(Some(COVER)), dir);
        assert!(matches!(
            result,
            Thumbnail::Failed(ThumbnailError::UnexpectedStatus { status: 404, .. })
        ));
        assert!(fs.file(&local_thumbnail_path(dir, COVER)).is_none());
    }

    #[test]
    fn test_transport_error_is_swallowed() {
        let http = Arc::new(FakeHttp::new());
        let fs = Arc::new(FakeFileSystem::new());
        http.fail(COVER, "connection reset");

        let result = mirror(&http, &fs).localize(&record(Some(COVER)), Path::new("/thumbs"));
        assert!(matches!(
            result,
            Thumbnail::Failed(ThumbnailError::RemoteRequestFailed { .. })
        ));
        assert!(result.path().is_none());
    }

    #[test]
    fn test_write_error_is_swallowed() {
        let http = Arc::new(FakeHttp::new());
        let fs = Arc::new(FakeFileSystem::failing_writes());
        http.respond(COVER, 200, b"PNGDATA".to_vec());

        let result = mirror(&http, &fs).localize(&record(Some(COVER)), Path::new("/thumbs"));
        assert!(matches!(
            result,
            Thumbnail::Failed(ThumbnailError::LocalWriteFailed { .. })
        ));
    }

    #[test]
    fn test_local_file_system_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("songwhip_thumbnails");
        let http = Arc::new(FakeHttp::new());
        http.respond(COVER, 200, b"PNGDATA".to_vec());
        let mirror = ThumbnailMirror::new(http.clone(), Arc::new(LocalFileSystem));

        let path = mirror.localize(&record(Some(COVER)), &dir).into_path().unwrap();
        assert!(path.starts_with(&dir));
        assert_eq!(std::fs::read(&path).unwrap(), b"PNGDATA");

        let again = mirror.localize(&record(Some(COVER)), &dir).into_path().unwrap();
        assert_eq!(path, again);
        assert_eq!(http.call_count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_directory_rejects_unwritable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("locked");
        std::fs::create_dir(&dir).unwrap();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();

        // root는 권한 비트를 무시하므로 확인할 것이 없다
        let bypassed = std::fs::write(dir.join("x"), b"").is_ok();
        let result = LocalFileSystem.ensure_directory(&dir);
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

        if !bypassed {
            let err = result.unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        }
    }

    #[test]
    fn test_directory_blocked_by_file_skips_download() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("songwhip_thumbnails");
        std::fs::write(&dir, b"not a directory").unwrap();
        assert!(LocalFileSystem.ensure_directory(&dir).is_err());

        let http = Arc::new(FakeHttp::new());
        http.respond(COVER, 200, b"PNGDATA".to_vec());
        let mirror = ThumbnailMirror::new(http.clone(), Arc::new(LocalFileSystem));

        let result = mirror.localize(&record(Some(COVER)), &dir);
        assert!(matches!(
            result,
            Thumbnail::Failed(ThumbnailError::DirectoryUnavailable { .. })
        ));
        assert_eq!(http.call_count(), 0);
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("cover.png.jpg");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"").unwrap();

        assert!(LocalFileSystem.write_file(&target, b"PNGDATA").is_err());

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("cover.png.jpg")]);
        assert!(target.is_dir());
    }

    #[test]
    fn test_write_file_replaces_existing_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cover.png.jpg");
        std::fs::write(&path, b"OLD-AND-LONGER").unwrap();

        LocalFileSystem.write_file(&path, b"NEW").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"NEW");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }
}
