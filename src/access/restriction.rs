use tracing::debug;

use crate::error::Result;
use crate::remote::{RemoteApi, find_restriction};
use crate::types::{BranchRestriction, User};

/// How a desired restriction combines with the one already on the remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Desired principals replace the remote lists.
    #[default]
    Replace,
    /// Desired principals are added to the remote lists.
    Update,
}

/// Merges `desired` with the restriction currently held remotely.
///
/// With no existing restriction the desired one is returned untouched and
/// will be created. Otherwise the result always carries the existing id and
/// matcher so the write updates in place. In [`MergeMode::Update`] existing
/// users flagged inactive are dropped before the union.
#[must_use]
pub fn merge_restriction(
    desired: &BranchRestriction,
    existing: Option<&BranchRestriction>,
    mode: MergeMode,
) -> BranchRestriction {
    let Some(existing) = existing else {
        return desired.clone();
    };

    let (users, groups) = match mode {
        MergeMode::Replace => (desired.users.clone(), desired.groups.clone()),
        MergeMode::Update => {
            let mut users: Vec<User> = Vec::with_capacity(desired.users.len() + existing.users.len());
            let active = existing.users.iter().filter(|u| u.active);
            for user in desired.users.iter().chain(active) {
                if !users.iter().any(|u| u.slug == user.slug) {
                    users.push(user.clone());
                }
            }

            let mut groups: Vec<String> = Vec::with_capacity(desired.groups.len() + existing.groups.len());
            for group in desired.groups.iter().chain(&existing.groups) {
                if !groups.contains(group) {
                    groups.push(group.clone());
                }
            }
            (users, groups)
        }
    };

    BranchRestriction {
        id: existing.id,
        kind: existing.kind,
        matcher: existing.matcher.clone(),
        users,
        groups,
    }
}

/// Looks up the restriction matching `desired`'s type and branch, merges and
/// writes the result back.
pub fn apply_restriction(
    remote: &dyn RemoteApi,
    project_key: &str,
    slug: &str,
    desired: &BranchRestriction,
    mode: MergeMode,
) -> Result<BranchRestriction> {
    let existing = find_restriction(remote, project_key, slug, desired.kind, &desired.matcher.id)?;
    debug!(
        repository = %format!("{project_key}/{slug}"),
        kind = %desired.kind,
        existing = ?existing.as_ref().and_then(|r| r.id),
        "merging branch restriction"
    );
    let merged = merge_restriction(desired, existing.as_ref(), mode);
    remote.set_branch_restriction(project_key, slug, &merged)
}
