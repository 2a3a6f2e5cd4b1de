//! Repository lifecycle and repository-wide settings.

mod settings;

pub use settings::{BranchTypeId, BranchTypeUpdate, BranchingModelUpdate, PullRequestUpdate, SonarUpdate};

use tracing::info;

use crate::cache::EntityCache;
use crate::error::{EntityKind, Error, Result};
use crate::remote::RemoteApi;
use crate::types::{CreateRepository, MoveRepository, ProjectRef, Repository, SonarSettings};

/// Creates a repository remotely and records it in the cache.
///
/// A 404 from the server means the project is unknown, a 409 that the
/// repository already exists.
pub fn create(
    remote: &dyn RemoteApi,
    cache: &mut EntityCache,
    project_key: &str,
    request: &CreateRepository,
) -> Result<Repository> {
    let repo = remote
        .create_repository(project_key, request)
        .map_err(|e| match e.status() {
            Some(404) => Error::not_found(EntityKind::Project, project_key),
            Some(409) => Error::AlreadyExists {
                kind: EntityKind::Repository,
                key: format!("{project_key}/{}", request.name),
            },
            _ => e,
        })?;
    info!("Created repository {}", repo.full_name());
    cache.add_repository(repo.clone())?;
    Ok(repo)
}

/// Move request for `repo`; a missing target part keeps the current value.
#[must_use]
pub fn move_request(repo: &Repository, target_project: Option<&str>, target_name: Option<&str>) -> MoveRepository {
    MoveRepository {
        name: target_name.unwrap_or(&repo.name).to_string(),
        project: ProjectRef {
            key: target_project.unwrap_or(repo.project_key()).to_string(),
        },
    }
}

/// Reads the Sonar settings of a repository, applies `update` and writes
/// the result back. Sections the update does not cover are sent unchanged.
pub fn update_sonar(remote: &dyn RemoteApi, project_key: &str, slug: &str, update: &SonarUpdate) -> Result<SonarSettings> {
    let mut current = remote.sonar_settings(project_key, slug)?;
    update.apply(&mut current);
    remote.set_sonar_settings(project_key, slug, &current)?;
    info!("Updated sonar settings of {project_key}/{slug}");
    Ok(current)
}
