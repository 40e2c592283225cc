use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing command-line arguments
    #[error("{0}")]
    Usage(String),

    /// Region, HTTP client or credential chain could not be set up
    #[error("configuration error: {0}")]
    Config(String),

    /// An object-store or registry request failed
    #[error("{operation} failed: {message}")]
    Remote { operation: String, message: String },

    /// Authorization token is not a base64 `user:password` pair
    #[error("cannot decode authorization token for {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// Several credentials in one `get-login` batch failed to decode
    #[error("{failed} of {total} credentials could not be decoded: {details}")]
    Batch {
        failed: usize,
        total: usize,
        details: String,
    },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage(message.into())
    }

    pub fn remote(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Error::Remote {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this kind of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 2,
            Error::Config(_) => 3,
            Error::Remote { .. } => 4,
            Error::Decode { .. } | Error::Batch { .. } => 5,
            Error::Io { .. } => 6,
        }
    }
}
