use tracing::{debug, info};

use crate::error::Result;
use crate::remote::{RemoteApi, RestrictionFilter};
use crate::types::{PrincipalKind, Repository};

use super::bulk::{BulkOutcome, for_each_labeled};
use super::restriction::{MergeMode, apply_restriction};

/// Which settings to copy between repositories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneOptions {
    pub user_permissions: bool,
    pub group_permissions: bool,
    pub branch_restrictions: bool,
}

/// Copies repository-level grants of one principal kind from `source` to
/// `target`. Grants with an unrecognized level are skipped.
pub fn clone_permissions(
    remote: &dyn RemoteApi,
    source: &Repository,
    target: &Repository,
    kind: PrincipalKind,
) -> Result<BulkOutcome> {
    let (src_key, src_slug) = (source.project_key(), source.slug.as_str());
    let (dst_key, dst_slug) = (target.project_key(), target.slug.as_str());

    let grants: Vec<(String, _)> = match kind {
        PrincipalKind::User => remote
            .repository_user_permissions(src_key, src_slug)?
            .into_iter()
            .map(|g| (g.user.slug, g.permission))
            .collect(),
        PrincipalKind::Group => remote
            .repository_group_permissions(src_key, src_slug)?
            .into_iter()
            .map(|g| (g.group.name, g.permission))
            .collect(),
    };

    let known = grants.into_iter().filter_map(|(name, level)| match level {
        Some(level) => Some((name, level)),
        None => {
            debug!(name = %name, "skipping grant with unknown level");
            None
        }
    });

    let outcome = for_each_labeled(known.map(|(name, level)| (name.clone(), (name, level))), |(name, level)| {
        match kind {
            PrincipalKind::User => remote.set_repository_user_permission(dst_key, dst_slug, &name, level),
            PrincipalKind::Group => remote.set_repository_group_permission(dst_key, dst_slug, &name, level),
        }
    });
    info!(
        kind = %kind,
        copied = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "cloned permissions to {}",
        target.full_name()
    );
    Ok(outcome)
}

/// Recreates every branch restriction of `source` on `target`, replacing the
/// principals of restrictions that already exist there.
pub fn clone_restrictions(
    remote: &dyn RemoteApi,
    source: &Repository,
    target: &Repository,
) -> Result<BulkOutcome> {
    let restrictions =
        remote.branch_restrictions(source.project_key(), &source.slug, &RestrictionFilter::default())?;

    let labelled = restrictions
        .into_iter()
        .map(|r| (format!("{} {}", r.kind, r.matcher.id), r));
    Ok(for_each_labeled(labelled, |mut desired| {
        desired.id = None;
        apply_restriction(
            remote,
            target.project_key(),
            &target.slug,
            &desired,
            MergeMode::Replace,
        )
        .map(|_| ())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::testing::{FakeRemote, repository, user};
    use crate::types::{BranchRestriction, Group, GroupGrant, PermissionLevel, RestrictionType, UserGrant};

    #[test]
    fn test_clone_user_permissions_skips_unknown_levels() {
        let remote = FakeRemote {
            repo_user_grants: vec![
                UserGrant {
                    user: user("alice"),
                    permission: Some(PermissionLevel::Admin),
                },
                UserGrant {
                    user: user("ghost"),
                    permission: None,
                },
                UserGrant {
                    user: user("bob"),
                    permission: Some(PermissionLevel::Read),
                },
            ],
            rejected: ["bob".to_string()].into_iter().collect(),
            ..Default::default()
        };

        let outcome = clone_permissions(
            &remote,
            &repository("PRJ", "app"),
            &repository("OPS", "tool"),
            PrincipalKind::User,
        )
        .unwrap();

        assert_eq!(outcome.succeeded, vec!["alice"]);
        assert_eq!(outcome.failed[0].item, "bob");
        assert_eq!(
            remote.calls_starting_with("set_user"),
            vec![
                "set_user:OPS/tool:alice:REPO_ADMIN",
                "set_user:OPS/tool:bob:REPO_READ",
            ]
        );
    }

    #[test]
    fn test_clone_group_permissions() {
        let remote = FakeRemote {
            repo_group_grants: vec![GroupGrant {
                group: Group { name: "devs".into() },
                permission: Some(PermissionLevel::Write),
            }],
            ..Default::default()
        };
        let outcome = clone_permissions(
            &remote,
            &repository("PRJ", "app"),
            &repository("OPS", "tool"),
            PrincipalKind::Group,
        )
        .unwrap();
        assert_eq!(outcome.succeeded, vec!["devs"]);
        assert_eq!(
            remote.calls_starting_with("set_group"),
            vec!["set_group:OPS/tool:devs:REPO_WRITE"]
        );
    }

    #[test]
    fn test_clone_restrictions_recreates_each() {
        let remote = FakeRemote::default();
        let mut master = BranchRestriction::new(
            RestrictionType::ReadOnly,
            "refs/heads/master",
            &["alice".to_string()],
            &[],
        );
        master.id = Some(1);
        let mut deletes =
            BranchRestriction::new(RestrictionType::NoDeletes, "refs/heads/master", &[], &["devs".to_string()]);
        deletes.id = Some(2);
        remote.restrictions.borrow_mut().extend([master, deletes]);

        let outcome = clone_restrictions(&remote, &repository("PRJ", "app"), &repository("OPS", "tool")).unwrap();

        assert_eq!(
            outcome.succeeded,
            vec!["read-only refs/heads/master", "no-deletes refs/heads/master"]
        );
        assert_eq!(
            remote.calls_starting_with("set_branch_restriction"),
            vec![
                "set_branch_restriction:OPS/tool:read-only",
                "set_branch_restriction:OPS/tool:no-deletes",
            ]
        );
    }
}
