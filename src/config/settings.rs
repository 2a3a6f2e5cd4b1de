use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Name of the snapshot file inside the cache directory.
pub const CACHE_FILE_NAME: &str = "cache";

/// Optional values from one source (flags, environment or the profile file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SettingsSource {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password_file: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

impl SettingsSource {
    /// Fills every unset value from `fallback`.
    #[must_use]
    pub fn or(self, fallback: SettingsSource) -> SettingsSource {
        SettingsSource {
            url: self.url.or(fallback.url),
            user: self.user.or(fallback.user),
            password_file: self.password_file.or(fallback.password_file),
            cache_dir: self.cache_dir.or(fallback.cache_dir),
        }
    }
}

/// Path of the per-user profile file, if a home directory is known.
#[must_use]
pub fn profile_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bitadmin").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Reads a profile file. A missing file is an empty profile.
pub fn load_profile(path: &Path) -> Result<SettingsSource> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no profile file");
            Ok(SettingsSource::default())
        }
        Err(e) => Err(e.into()),
    }
}

#[must_use]
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("bitadmin")
}

/// Everything needed to authenticate against the server.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolved, read-only settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    url: Option<String>,
    user: Option<String>,
    password_file: Option<PathBuf>,
    cache_dir: PathBuf,
    /// Why the profile file was ignored, if it was.
    profile_error: Option<String>,
}

impl Settings {
    #[must_use]
    pub fn new(source: SettingsSource) -> Self {
        Self {
            url: source.url.filter(|u| !u.is_empty()),
            user: source.user.filter(|u| !u.is_empty()),
            password_file: source.password_file,
            cache_dir: source.cache_dir.unwrap_or_else(default_cache_dir),
            profile_error: None,
        }
    }

    /// Combines flags with the profile. A profile that failed to load is
    /// skipped; it only surfaces when a server value is then missing.
    #[must_use]
    pub fn resolve(flags: SettingsSource, profile: Result<SettingsSource>) -> Self {
        match profile {
            Ok(profile) => Self::new(flags.or(profile)),
            Err(e) => {
                warn!("Ignoring profile file: {e}");
                Self {
                    profile_error: Some(e.to_string()),
                    ..Self::new(flags)
                }
            }
        }
    }

    fn missing(&self, flag: &str) -> Error {
        match &self.profile_error {
            Some(e) => Error::Config(format!("global flag --{flag} is required (profile file ignored: {e})")),
            None => Error::Config(format!("global flag --{flag} is required")),
        }
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Checks that server access is configured and reads the password.
    ///
    /// Only commands that talk to the server call this.
    pub fn credentials(&self) -> Result<Credentials> {
        let url = self.url.clone().ok_or_else(|| self.missing("url"))?;
        let user = self.user.clone().ok_or_else(|| self.missing("user"))?;
        let path = self
            .password_file
            .as_deref()
            .ok_or_else(|| self.missing("password-file"))?;
        let password = read_password_file(path)?;
        Ok(Credentials {
            url: url.trim_end_matches('/').to_string(),
            user,
            password,
        })
    }
}

/// Reads a password file, which must be readable by its owner only.
///
/// Named pipes are accepted as long as their permission bits are `0600`.
/// A single trailing newline is dropped.
pub fn read_password_file(path: &Path) -> Result<String> {
    let meta = fs::metadata(path)
        .map_err(|_| Error::Config(format!("cannot read password file {}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o777 != 0o600 {
            return Err(Error::Config(format!(
                "wrong permission on password file, please run \"chmod 600 {}\"",
                path.display()
            )));
        }
    }
    #[cfg(not(unix))]
    let _ = meta;

    let raw = fs::read_to_string(path)?;
    let password = raw
        .strip_suffix('\n')
        .map(|p| p.strip_suffix('\r').unwrap_or(p))
        .unwrap_or(&raw)
        .to_string();
    if password.is_empty() {
        return Err(Error::Config(format!("password file {} is empty", path.display())));
    }
    Ok(password)
}
