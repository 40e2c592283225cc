use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::path::{Endpoint, STDIO};
use crate::store::{ObjectReader, ObjectStore, S3Store};

/// Destination alias for "name the file after the source's last segment".
pub const CURRENT_DIR: &str = ".";

/// `s3 cp <src> <dst>`
pub async fn s3_copy(source: &str, destination: &str) -> Result<()> {
    let store = S3Store::new(ClientConfig::resolve(None)?);
    let mut stdout = tokio::io::stdout();
    let copied = copy(&store, source, destination, tokio::io::stdin(), &mut stdout).await?;

    info!(copied, "{} -> {}", source, destination);
    Ok(())
}

/// Copies `source` to `destination`, returning the number of bytes moved.
///
/// `stdin` and `stdout` stand in for the `-` endpoint on either side.
/// Uploads are buffered in memory first so the object length is known up
/// front; this is not suitable for very large objects.
pub async fn copy<S, R, W>(
    store: &S,
    source: &str,
    destination: &str,
    stdin: R,
    stdout: &mut W,
) -> Result<u64>
where
    S: ObjectStore + ?Sized,
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Unpin,
{
    let from = Endpoint::parse(source)?;
    let to = match Endpoint::parse(destination)? {
        Endpoint::Local(_) => Endpoint::Local(local_destination(source, &from, destination)?),
        other => other,
    };
    debug!(?from, ?to, "resolved copy endpoints");

    let mut reader = open_source(store, &from, stdin).await?;

    match to {
        Endpoint::Remote(path) => {
            let mut body = Vec::new();
            reader
                .read_to_end(&mut body)
                .await
                .map_err(|e| Error::io(source, e))?;
            drop(reader);

            let size = body.len() as u64;
            store.put(&path, body.into()).await?;
            Ok(size)
        }
        Endpoint::Stdio => {
            let copied = tokio::io::copy(&mut reader, stdout)
                .await
                .map_err(|e| Error::io(format!("{} -> {}", source, STDIO), e))?;
            stdout
                .flush()
                .await
                .map_err(|e| Error::io(STDIO, e))?;
            Ok(copied)
        }
        Endpoint::Local(path) => {
            let display = path.display().to_string();
            let mut file = File::create(&path)
                .await
                .map_err(|e| Error::io(&display, e))?;

            let copied = tokio::io::copy(&mut reader, &mut file)
                .await
                .map_err(|e| Error::io(format!("{} -> {}", source, display), e))?;
            file.flush().await.map_err(|e| Error::io(&display, e))?;
            Ok(copied)
        }
    }
}

async fn open_source<S, R>(store: &S, from: &Endpoint, stdin: R) -> Result<ObjectReader>
where
    S: ObjectStore + ?Sized,
    R: AsyncRead + Send + Unpin + 'static,
{
    match from {
        Endpoint::Remote(path) => store.get(path).await,
        Endpoint::Stdio => Ok(Box::new(stdin)),
        Endpoint::Local(path) => {
            let file = File::open(path)
                .await
                .map_err(|e| Error::io(path.display().to_string(), e))?;
            Ok(Box::new(file))
        }
    }
}

/// Resolves the `.` alias and refuses to truncate a local source onto itself.
fn local_destination(source: &str, from: &Endpoint, destination: &str) -> Result<PathBuf> {
    let resolved = if destination == CURRENT_DIR {
        let name = source.rsplit('/').next().unwrap_or_default();
        if name.is_empty() || name == STDIO || name == CURRENT_DIR {
            return Err(Error::usage(format!(
                "cannot derive a file name from '{}' for destination '{}'",
                source, CURRENT_DIR
            )));
        }
        PathBuf::from(name)
    } else {
        PathBuf::from(destination)
    };

    if let Endpoint::Local(from) = from {
        if same_file(from, &resolved) {
            return Err(Error::usage(format!(
                "'{}' and '{}' are the same file",
                from.display(),
                resolved.display()
            )));
        }
    }

    Ok(resolved)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use tempfile::tempdir;

    use super::*;
    use crate::path::RemotePath;

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<(String, String), Bytes>>,
    }

    impl MemoryStore {
        fn with(bucket: &str, key: &str, data: &[u8]) -> Self {
            let store = Self::default();
            store.objects.lock().unwrap().insert(
                (bucket.to_string(), key.to_string()),
                Bytes::copy_from_slice(data),
            );
            store
        }

        fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
            self.objects
                .lock()
                .unwrap()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn get(&self, path: &RemotePath) -> Result<ObjectReader> {
            let data = self
                .object(&path.bucket, &path.key)
                .ok_or_else(|| Error::remote(format!("get {}", path), "NoSuchKey"))?;
            Ok(Box::new(Cursor::new(data.to_vec())))
        }

        async fn put(&self, path: &RemotePath, body: Bytes) -> Result<()> {
            self.objects
                .lock()
                .unwrap()
                .insert((path.bucket.clone(), path.key.clone()), body);
            Ok(())
        }
    }

    fn no_stdin() -> Cursor<Vec<u8>> {
        Cursor::new(Vec::new())
    }

    #[tokio::test]
    async fn local_to_stdio_and_back_is_lossless() {
        let dir = tempdir().unwrap();
        let original: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
        let src = dir.path().join("src.bin");
        std::fs::write(&src, &original).unwrap();

        let store = MemoryStore::default();
        let mut stdout = Vec::new();
        let copied = copy(&store, src.to_str().unwrap(), "-", no_stdin(), &mut stdout)
            .await
            .unwrap();
        assert_eq!(copied, original.len() as u64);
        assert_eq!(stdout, original);

        let dst = dir.path().join("dst.bin");
        let mut unused = Vec::new();
        copy(
            &store,
            "-",
            dst.to_str().unwrap(),
            Cursor::new(stdout),
            &mut unused,
        )
        .await
        .unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), original);
        assert!(unused.is_empty());
    }

    #[tokio::test]
    async fn remote_to_remote_buffers_and_uploads() {
        let store = MemoryStore::with("src-bucket", "a/b.txt", b"payload");
        let mut stdout = Vec::new();

        let copied = copy(
            &store,
            "s3://src-bucket/a/b.txt",
            "s3://dst-bucket/copy.txt",
            no_stdin(),
            &mut stdout,
        )
        .await
        .unwrap();

        assert_eq!(copied, 7);
        assert_eq!(
            store.object("dst-bucket", "copy.txt").as_deref(),
            Some(&b"payload"[..])
        );
        assert!(stdout.is_empty());
    }

    #[tokio::test]
    async fn stdin_to_remote_uploads_everything() {
        let store = MemoryStore::default();
        let mut stdout = Vec::new();

        copy(
            &store,
            "-",
            "s3://bucket/from-stdin",
            Cursor::new(b"streamed".to_vec()),
            &mut stdout,
        )
        .await
        .unwrap();

        assert_eq!(
            store.object("bucket", "from-stdin").as_deref(),
            Some(&b"streamed"[..])
        );
    }

    #[tokio::test]
    async fn remote_to_local_writes_file() {
        let dir = tempdir().unwrap();
        let dst = dir.path().join("out.txt");
        let store = MemoryStore::with("bucket", "key", b"remote bytes");
        let mut stdout = Vec::new();

        copy(
            &store,
            "s3://bucket/key",
            dst.to_str().unwrap(),
            no_stdin(),
            &mut stdout,
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(&dst).unwrap(), b"remote bytes");
    }

    #[tokio::test]
    async fn local_destination_is_truncated() {
        let dir = tempdir().unwrap();
        let dst = dir.path().join("out.txt");
        std::fs::write(&dst, b"a much longer previous content").unwrap();
        let store = MemoryStore::default();
        let mut stdout = Vec::new();

        copy(
            &store,
            "-",
            dst.to_str().unwrap(),
            Cursor::new(b"short".to_vec()),
            &mut stdout,
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(&dst).unwrap(), b"short");
    }

    #[tokio::test]
    async fn missing_remote_object_is_remote_error() {
        let store = MemoryStore::default();
        let mut stdout = Vec::new();

        let err = copy(&store, "s3://bucket/missing", "-", no_stdin(), &mut stdout)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Remote { .. }));
    }

    #[tokio::test]
    async fn missing_local_source_is_io_error() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("nope.txt");
        let store = MemoryStore::default();
        let mut stdout = Vec::new();

        let err = copy(&store, src.to_str().unwrap(), "-", no_stdin(), &mut stdout)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[tokio::test]
    async fn malformed_remote_path_fails_before_any_request() {
        let store = MemoryStore::default();
        let mut stdout = Vec::new();

        let err = copy(&store, "-", "s3://bucket-only", no_stdin(), &mut stdout)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert!(store.objects.lock().unwrap().is_empty());
    }

    #[test]
    fn dot_uses_last_source_segment() {
        let from = Endpoint::parse("a/b/c.txt").unwrap();
        let resolved = local_destination("a/b/c.txt", &from, ".").unwrap();
        assert_eq!(resolved, PathBuf::from("c.txt"));

        let from = Endpoint::parse("s3://bucket/dir/report.csv").unwrap();
        let resolved = local_destination("s3://bucket/dir/report.csv", &from, ".").unwrap();
        assert_eq!(resolved, PathBuf::from("report.csv"));
    }

    #[test]
    fn only_a_bare_dot_is_the_alias() {
        let from = Endpoint::parse("a/b/c.txt").unwrap();
        for destination in ["./", "./.", "a/."] {
            let resolved = local_destination("a/b/c.txt", &from, destination).unwrap();
            assert_eq!(resolved.as_os_str(), destination);
        }
    }

    #[test]
    fn dot_without_file_name_is_usage_error() {
        let err = local_destination("-", &Endpoint::Stdio, ".").unwrap_err();
        assert!(matches!(err, Error::Usage(_)));

        let from = Endpoint::parse("s3://bucket/dir/").unwrap();
        let err = local_destination("s3://bucket/dir/", &from, ".").unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn copying_a_file_onto_itself_is_refused() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("same.txt");
        std::fs::write(&src, b"keep me").unwrap();
        let source = src.to_str().unwrap();

        let from = Endpoint::parse(source).unwrap();
        let err = local_destination(source, &from, source).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert_eq!(std::fs::read(&src).unwrap(), b"keep me");
    }
}
