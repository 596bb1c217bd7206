//! Static file serving module
//!
//! Serves the PDF directory and the frontend bundle. Request paths are
//! resolved strictly inside their root directory.

use crate::config::DataPaths;
use crate::handler::router::RequestContext;
use crate::http::range::ByteRange;
use crate::http::{self, cache, cache::CachePolicy, mime, response, RangeOutcome};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io::{self, SeekFrom};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// A regular file located on disk, read only as far as the response needs
pub struct StaticFile {
    pub path: PathBuf,
    pub len: usize,
    pub etag: String,
    pub content_type: &'static str,
}

impl StaticFile {
    pub async fn read_all(&self) -> io::Result<Bytes> {
        let data = fs::read(&self.path).await?;
        Ok(Bytes::from(data))
    }

    /// Read only the bytes covered by `range`
    pub async fn read_range(&self, range: ByteRange) -> io::Result<Bytes> {
        let mut file = fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(u64::try_from(range.start).unwrap_or(u64::MAX)))
            .await?;

        let mut buf = Vec::with_capacity(range.len());
        file.take(u64::try_from(range.len()).unwrap_or(u64::MAX))
            .read_to_end(&mut buf)
            .await?;
        if buf.len() != range.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file shrank while being read",
            ));
        }
        Ok(Bytes::from(buf))
    }
}

/// Serve `relative` from `root`, or 404 if it is not a file under `root`
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    root: &Path,
    relative: &str,
    policy: CachePolicy,
) -> Response<Full<Bytes>> {
    let Some(file_path) = resolve_under_root(root, relative).await else {
        logger::log_debug(&format!("No file for '{relative}' under {}", root.display()));
        return http::build_404_response();
    };

    match load_file(&file_path).await {
        Some(file) => build_static_file_response(ctx, &file, policy, true).await,
        None => http::build_404_response(),
    }
}

/// Serve a frontend asset, falling back to the entry HTML document
///
/// Unknown paths belong to the client-side router, so they get the whole
/// entry document with 200 instead of a 404; `Range` is not applied to it.
pub async fn serve_frontend(
    ctx: &RequestContext<'_>,
    paths: &DataPaths,
    relative: &str,
    policy: CachePolicy,
) -> Response<Full<Bytes>> {
    if !relative.is_empty() {
        if let Some(asset) = resolve_under_root(&paths.static_dir, relative).await {
            if let Some(file) = load_file(&asset).await {
                return build_static_file_response(ctx, &file, policy, true).await;
            }
        }
        logger::log_debug(&format!("'{relative}' is not a built asset, serving entry document"));
    }

    match load_file(&paths.index_file).await {
        Some(file) => build_static_file_response(ctx, &file, policy, false).await,
        None => {
            logger::log_error(&format!(
                "Entry HTML document missing at '{}'",
                paths.index_file.display()
            ));
            http::build_404_response()
        }
    }
}

/// Resolve a decoded request path to a regular file inside `root`
///
/// Parent-directory and absolute components are refused outright; the
/// canonical result must still start with the canonical root, which also
/// catches symlinks pointing elsewhere.
pub async fn resolve_under_root(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative.trim_start_matches('/'));
    let mut has_name = false;
    for component in relative.components() {
        match component {
            Component::Normal(_) => has_name = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                logger::log_warning(&format!(
                    "Path traversal attempt blocked: {}",
                    relative.display()
                ));
                return None;
            }
        }
    }
    if !has_name {
        return None;
    }

    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return None;
        }
    };

    // Missing files are the common 404 case, not worth a warning
    let file_canonical = fs::canonicalize(root.join(relative)).await.ok()?;
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            relative.display(),
            file_canonical.display()
        ));
        return None;
    }

    let metadata = fs::metadata(&file_canonical).await.ok()?;
    metadata.is_file().then_some(file_canonical)
}

/// Stat a regular file and infer its content type
pub async fn load_file(path: &Path) -> Option<StaticFile> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Some(StaticFile {
            path: path.to_path_buf(),
            len: usize::try_from(metadata.len()).unwrap_or(usize::MAX),
            etag: cache::generate_etag(metadata.len(), metadata.modified().ok()),
            content_type: mime::content_type_for(path),
        }),
        Ok(_) => None,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                logger::log_error(&format!("Failed to stat file '{}': {e}", path.display()));
            }
            None
        }
    }
}

/// Build a file response honoring `If-None-Match` and, when `honor_range`
/// is set, `Range`
async fn build_static_file_response(
    ctx: &RequestContext<'_>,
    file: &StaticFile,
    policy: CachePolicy,
    honor_range: bool,
) -> Response<Full<Bytes>> {
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &file.etag) {
        return http::build_304_response(&file.etag, policy);
    }

    let range_header = ctx.range_header.as_deref().filter(|_| honor_range);
    let result = match http::parse_range_header(range_header, file.len) {
        RangeOutcome::Unsatisfiable => return http::build_416_response(file.len),
        RangeOutcome::Partial(range) => file.read_range(range).await.map(|slice| {
            response::build_partial_response(
                slice,
                range,
                file.len,
                file.content_type,
                &file.etag,
                policy,
                ctx.is_head,
            )
        }),
        RangeOutcome::Full => file.read_all().await.map(|data| {
            response::build_file_response(data, file.content_type, &file.etag, policy, ctx.is_head)
        }),
    };

    result.unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to read file '{}': {e}", file.path.display()));
        http::build_404_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pdfs/Clerical")).unwrap();
        std::fs::write(dir.path().join("pdfs/report.pdf"), b"%PDF-1.7").unwrap();
        std::fs::write(dir.path().join("pdfs/Clerical/10209 Clerk.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"outside").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_resolves_nested_file() {
        let dir = pdf_root();
        let root = dir.path().join("pdfs");
        let resolved = resolve_under_root(&root, "Clerical/10209 Clerk.pdf").await.unwrap();
        assert!(resolved.ends_with("Clerical/10209 Clerk.pdf"));
        assert!(resolve_under_root(&root, "/report.pdf").await.is_some());
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = pdf_root();
        let root = dir.path().join("pdfs");
        assert!(resolve_under_root(&root, "../secret.txt").await.is_none());
        assert!(resolve_under_root(&root, "Clerical/../../secret.txt").await.is_none());
        assert!(resolve_under_root(&root, "../../etc/passwd").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rejects_symlink_escape() {
        let dir = pdf_root();
        let root = dir.path().join("pdfs");
        std::os::unix::fs::symlink(dir.path().join("secret.txt"), root.join("link.pdf")).unwrap();
        assert!(resolve_under_root(&root, "link.pdf").await.is_none());
    }

    #[tokio::test]
    async fn test_rejects_directories_and_empty() {
        let dir = pdf_root();
        let root = dir.path().join("pdfs");
        assert!(resolve_under_root(&root, "Clerical").await.is_none());
        assert!(resolve_under_root(&root, "").await.is_none());
        assert!(resolve_under_root(&root, "./").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nowhere");
        assert!(resolve_under_root(&root, "report.pdf").await.is_none());
    }

    #[tokio::test]
    async fn test_load_file_content_type() {
        let dir = pdf_root();
        let file = load_file(&dir.path().join("pdfs/report.pdf")).await.unwrap();
        assert_eq!(file.content_type, "application/pdf");
        assert_eq!(file.len, 8);
        assert_eq!(&file.read_all().await.unwrap()[..], b"%PDF-1.7");
        assert!(load_file(&dir.path().join("pdfs/missing.pdf")).await.is_none());
        assert!(load_file(&dir.path().join("pdfs/Clerical")).await.is_none());
    }

    #[tokio::test]
    async fn test_read_range_reads_only_the_slice() {
        let dir = pdf_root();
        let file = load_file(&dir.path().join("pdfs/report.pdf")).await.unwrap();
        let slice = file.read_range(ByteRange { start: 1, end: 3 }).await.unwrap();
        assert_eq!(&slice[..], b"PDF");

        std::fs::write(dir.path().join("pdfs/report.pdf"), b"%P").unwrap();
        assert!(file.read_range(ByteRange { start: 1, end: 3 }).await.is_err());
    }
}
