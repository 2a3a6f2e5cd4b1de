use tracing::warn;

use crate::error::{BulkFailure, Error, Result};
use crate::remote::RemoteApi;
use crate::types::{PermissionLevel, PrincipalKind};

/// Per-item record of a bulk operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// `Ok` with the succeeded items, or [`Error::Partial`] if any item failed.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.failed.is_empty() {
            return Ok(self.succeeded);
        }
        let total = self.total();
        Err(Error::Partial {
            failed: self.failed,
            total,
        })
    }
}

/// Runs `op` on every item. A failing item is recorded and the rest still run.
pub fn for_each_item<I, S, F>(items: I, mut op: F) -> BulkOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&str) -> Result<()>,
{
    for_each_labeled(
        items.into_iter().map(|s| (s.as_ref().to_string(), s)),
        |s| op(s.as_ref()),
    )
}

/// Like [`for_each_item`] for payloads that are not their own label.
pub fn for_each_labeled<I, T, F>(items: I, mut op: F) -> BulkOutcome
where
    I: IntoIterator<Item = (String, T)>,
    F: FnMut(T) -> Result<()>,
{
    let mut outcome = BulkOutcome::default();
    for (label, payload) in items {
        match op(payload) {
            Ok(()) => outcome.succeeded.push(label),
            Err(e) => {
                warn!(item = %label, error = %e, "bulk item failed");
                outcome.failed.push(BulkFailure {
                    item: label,
                    reason: e.to_string(),
                });
            }
        }
    }
    outcome
}

/// Grants `level` on one repository to every named principal.
pub fn grant(
    remote: &dyn RemoteApi,
    project_key: &str,
    slug: &str,
    kind: PrincipalKind,
    names: &[String],
    level: PermissionLevel,
) -> BulkOutcome {
    for_each_item(names, |name| match kind {
        PrincipalKind::User => remote.set_repository_user_permission(project_key, slug, name, level),
        PrincipalKind::Group => remote.set_repository_group_permission(project_key, slug, name, level),
    })
}

/// Removes every repository-level permission of the named principals.
pub fn unset(
    remote: &dyn RemoteApi,
    project_key: &str,
    slug: &str,
    kind: PrincipalKind,
    names: &[String],
) -> BulkOutcome {
    for_each_item(names, |name| match kind {
        PrincipalKind::User => remote.unset_repository_user_permission(project_key, slug, name),
        PrincipalKind::Group => remote.unset_repository_group_permission(project_key, slug, name),
    })
}
