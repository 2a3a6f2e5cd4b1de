//! Local snapshot of users, projects and repositories.
//!
//! The snapshot is a single JSON document holding three arrays. It is only ever
//! replaced as a whole: [`EntityCache::warmup`] refetches everything and
//! [`EntityCache::clear`] empties everything. Lookups are linear scans; the
//! collections hold a few thousand entries at most.
//!
//! There is no locking around the snapshot file. Two processes saving at the
//! same time race and the last rename wins.

mod complete;

pub use complete::{CompletionTarget, candidates};

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::CACHE_FILE_NAME;
use crate::error::{EntityKind, Error, Result};
use crate::remote::{RemoteApi, fetch_all};
use crate::types::{Project, Repository, User, link_hrefs};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

impl Snapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.projects.is_empty() && self.repositories.is_empty()
    }
}

pub struct EntityCache {
    path: PathBuf,
    snapshot: Snapshot,
}

impl EntityCache {
    /// Empty cache backed by `<cache_dir>/cache`. Nothing is read yet.
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(CACHE_FILE_NAME),
            snapshot: Snapshot::default(),
        }
    }

    /// Shorthand for `new` followed by `load`.
    pub fn open(cache_dir: impl AsRef<Path>) -> Self {
        let mut cache = Self::new(cache_dir);
        cache.load();
        cache
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.snapshot.users
    }

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.snapshot.projects
    }

    #[must_use]
    pub fn repositories(&self) -> &[Repository] {
        &self.snapshot.repositories
    }

    /// Reads the snapshot from disk. A missing, unreadable or undecodable file
    /// leaves the cache empty; the failure is only logged.
    pub fn load(&mut self) {
        self.snapshot = match fs::read(&self.path) {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Ignoring unreadable cache {}: {e}", self.path.display());
                    Snapshot::default()
                }
            },
            Err(e) => {
                debug!("No cache loaded from {}: {e}", self.path.display());
                Snapshot::default()
            }
        };
    }

    /// Writes the whole snapshot to a private temporary file in the cache
    /// directory, then renames it over the snapshot. Concurrent savers never
    /// share a temporary file; the last rename wins.
    pub fn save(&self) -> Result<()> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, &self.snapshot)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!("Saved cache to {}", self.path.display());
        Ok(())
    }

    /// Empties every collection and persists the empty snapshot.
    pub fn clear(&mut self) -> Result<()> {
        self.snapshot = Snapshot::default();
        self.save()
    }

    /// Refetches users, projects, then repositories of each project, one page
    /// at a time. Nothing is written unless every fetch succeeds.
    pub fn warmup(&mut self, remote: &dyn RemoteApi) -> Result<()> {
        self.snapshot = Snapshot::default();

        self.snapshot.users = fetch_all(|page| remote.list_users(page))?;
        info!("Cached {} users", self.snapshot.users.len());

        self.snapshot.projects = fetch_all(|page| remote.list_projects(page))?;
        info!("Cached {} projects", self.snapshot.projects.len());

        let keys: Vec<String> = self.snapshot.projects.iter().map(|p| p.key.clone()).collect();
        for key in keys {
            let repos = fetch_all(|page| remote.list_repositories(&key, page))?;
            self.snapshot.repositories.extend(repos);
        }
        info!("Cached {} repositories", self.snapshot.repositories.len());

        self.save()
    }

    /// Records a repository created through this tool and persists it.
    pub fn add_repository(&mut self, repo: Repository) -> Result<()> {
        self.snapshot
            .repositories
            .retain(|r| !(r.project.key == repo.project.key && r.slug == repo.slug));
        self.snapshot.repositories.push(repo);
        self.save()
    }

    pub fn find_repository(&self, project_key: &str, slug: &str) -> Result<&Repository> {
        self.snapshot
            .repositories
            .iter()
            .find(|r| r.project.key == project_key && r.slug == slug)
            .ok_or_else(|| Error::not_found(EntityKind::Repository, format!("{project_key}/{slug}")))
    }

    /// Matches either the login name or the slug.
    pub fn find_user_by_username(&self, username: &str) -> Result<&User> {
        self.snapshot
            .users
            .iter()
            .find(|u| u.slug == username || u.name == username)
            .ok_or_else(|| Error::not_found(EntityKind::User, username))
    }

    /// Every repository with this slug, across projects, in cache order.
    #[must_use]
    pub fn find_repositories_by_slug(&self, slug: &str) -> Vec<&Repository> {
        self.snapshot
            .repositories
            .iter()
            .filter(|r| r.slug == slug)
            .collect()
    }

    /// Resolves `PROJECT/slug`, or a bare slug when it is unique.
    pub fn resolve_repository(&self, reference: &str) -> Result<&Repository> {
        if let Some((project_key, slug)) = reference.split_once('/') {
            return self.find_repository(project_key, slug);
        }
        match self.find_repositories_by_slug(reference).as_slice() {
            [] => Err(Error::not_found(EntityKind::Repository, reference)),
            [only] => Ok(*only),
            many => Err(Error::AmbiguousRepository {
                slug: reference.to_string(),
                projects: many.iter().map(|r| r.project.key.clone()).collect(),
            }),
        }
    }
}

impl fmt::Display for EntityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for user in &self.snapshot.users {
            writeln!(
                f,
                "user {} - {} - {} - {} - {}",
                user.id, user.email_address, user.name, user.display_name, user.slug
            )?;
        }
        for project in &self.snapshot.projects {
            writeln!(
                f,
                "project {} - {} - {}",
                project.key,
                project.name,
                link_hrefs(&project.links).join(" - ")
            )?;
        }
        for repo in &self.snapshot.repositories {
            writeln!(
                f,
                "repository {} - {} - {}",
                repo.full_name(),
                repo.name,
                link_hrefs(&repo.links).join(" - ")
            )?;
        }
        Ok(())
    }
}
