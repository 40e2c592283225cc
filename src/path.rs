use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const S3_SCHEME: &str = "s3://";
pub const STDIO: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    pub bucket: String,
    pub key: String,
}

impl RemotePath {
    /// Splits `s3://bucket/key` at the first `/` after the scheme.
    pub fn parse(path: &str) -> Result<Self> {
        let stripped = path.strip_prefix(S3_SCHEME).unwrap_or(path);
        let (bucket, key) = stripped.split_once('/').ok_or_else(|| {
            Error::usage(format!(
                "invalid remote path '{}': expected {}bucket/key",
                path, S3_SCHEME
            ))
        })?;

        Ok(Self {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        })
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Remote(RemotePath),
    Local(PathBuf),
    Stdio,
}

impl Endpoint {
    pub fn parse(path: &str) -> Result<Self> {
        if is_remote(path) {
            RemotePath::parse(path).map(Endpoint::Remote)
        } else if path == STDIO {
            Ok(Endpoint::Stdio)
        } else {
            Ok(Endpoint::Local(PathBuf::from(path)))
        }
    }
}

/// True when the scheme marker appears anywhere in `path`, not only as a prefix.
pub fn is_remote(path: &str) -> bool {
    path.contains(S3_SCHEME)
}
