use std::fmt;

use thiserror::Error;

/// Kind of entity a failed lookup was searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Project,
    Repository,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Repository => "repository",
        };
        f.write_str(label)
    }
}

/// One item of a bulk operation that the remote rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub item: String,
    pub reason: String,
}

impl fmt::Display for BulkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} not found: {key} (maybe refresh the local cache?)")]
    NotFound { kind: EntityKind, key: String },

    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: EntityKind, key: String },

    #[error("repository slug '{slug}' exists in several projects ({}), use PROJECT/slug", .projects.join(", "))]
    AmbiguousRepository { slug: String, projects: Vec<String> },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[cfg(feature = "cli")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid permission: {0}")]
    InvalidPermission(String),

    #[error("invalid restriction type: {0}")]
    InvalidRestriction(String),

    #[error("unsupported branching model type {0}")]
    UnsupportedBranchType(String),

    #[error("{} of {total} operations failed:\n  {}", .failed.len(), join_failures(.failed))]
    Partial {
        failed: Vec<BulkFailure>,
        total: usize,
    },
}

impl Error {
    pub fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// HTTP status carried by a remote rejection, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn join_failures(failed: &[BulkFailure]) -> String {
    failed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  ")
}

pub type Result<T> = std::result::Result<T, Error>;
