//! The public error taxonomy from `spec.md` §7. Internal plumbing keeps
//! using `anyhow::Result`, matching `avm`'s style throughout
//! `general_tool.rs`/`io/mod.rs`; `CjdkError` is the shape the façade
//! (`src/facade.rs`) and the CLI (`src/main.rs`) actually match on.

use smol_str::SmolStr;
use thiserror::Error;

/// Abstract supertype of the three kinds named in `spec.md` §7.
#[derive(Debug, Error)]
pub enum CjdkError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    JdkNotFound(#[from] JdkNotFoundError),

    #[error(transparent)]
    Install(#[from] InstallError),
}

impl CjdkError {
    /// Exit codes from `spec.md` §6: 2 configuration, 3 not found, 4
    /// download/unpack failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CjdkError::Config(_) => 2,
            CjdkError::JdkNotFound(_) => 3,
            CjdkError::Install(_) => 4,
        }
    }
}

/// Invalid or contradictory options, e.g. `jdk` with `vendor`, unknown
/// archive type, bad TTL.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'jdk' is mutually exclusive with 'vendor'/'version'")]
    JdkAndVendorBothSet,

    #[error("unknown archive type: {0}")]
    UnknownArchiveType(String),

    #[error("invalid index TTL: {0}")]
    InvalidTtl(String),

    #[error("{0}")]
    Other(String),
}

/// Vendor absent for (os, arch), or no version matches the expression.
#[derive(Debug, Error)]
#[error("no matching JDK for vendor={vendor} expr={expr} os={os} arch={arch}")]
pub struct JdkNotFoundError {
    pub vendor: SmolStr,
    pub expr: SmolStr,
    pub os: SmolStr,
    pub arch: SmolStr,
}

/// Network failure, non-2xx status, hash mismatch, archive corruption,
/// path-escape attempt, lock timeout, or filesystem failure during
/// publish.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("network error fetching '{url}': {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of '{url}' failed with status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("hash mismatch for '{what}': expected {expected}, got {actual}")]
    HashMismatch {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("archive entry '{entry}' escapes the extraction root")]
    PathEscape { entry: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("timed out waiting for lock on {0}")]
    LockTimeout(String),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<anyhow::Error> for InstallError {
    fn from(e: anyhow::Error) -> Self {
        InstallError::Archive(e.to_string())
    }
}
