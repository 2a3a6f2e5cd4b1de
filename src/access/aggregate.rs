use std::collections::HashSet;

use serde::Serialize;

use crate::error::Result;
use crate::remote::{RemoteApi, find_restriction};
use crate::types::{
    BranchRestriction, GroupGrant, PermissionLevel, PrincipalKind, RestrictionType, UserGrant,
};

/// Branch whose restriction decides who may merge.
pub const MASTER_BRANCH_REF: &str = "refs/heads/master";

/// Effective capability of one principal on one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRow {
    pub name: String,
    pub kind: PrincipalKind,
    pub read: bool,
    pub write: bool,
    pub merge: bool,
}

/// Grant sources feeding one repository view.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantSources<'a> {
    pub repo_users: &'a [UserGrant],
    pub repo_groups: &'a [GroupGrant],
    pub project_users: &'a [UserGrant],
    pub project_groups: &'a [GroupGrant],
    pub master_restriction: Option<&'a BranchRestriction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryAccess {
    pub project_key: String,
    pub slug: String,
    pub rows: Vec<AccessRow>,
}

/// True iff `name` is listed as a user slug or group on the restriction.
#[must_use]
pub fn has_merge(name: &str, restriction: Option<&BranchRestriction>) -> bool {
    restriction.is_some_and(|r| {
        r.users.iter().any(|u| u.slug == name) || r.groups.iter().any(|g| g == name)
    })
}

fn capability(level: Option<PermissionLevel>) -> (bool, bool) {
    match level {
        Some(l) => (l.grants_read(), l.grants_write()),
        None => (false, false),
    }
}

/// Rows keyed by principal name; the first insertion of a name wins.
#[derive(Default)]
struct RowSet {
    rows: Vec<AccessRow>,
    seen: HashSet<String>,
}

impl RowSet {
    fn push(&mut self, row: AccessRow) {
        if self.seen.insert(row.name.clone()) {
            self.rows.push(row);
        }
    }

    fn push_grant(&mut self, name: &str, kind: PrincipalKind, level: Option<PermissionLevel>, merge: bool) {
        let (read, write) = capability(level);
        self.push(AccessRow {
            name: name.to_string(),
            kind,
            read,
            write,
            merge,
        });
    }
}

/// Combines repository grants, master branch restriction membership and
/// inherited project grants into one row per principal.
///
/// Precedence: repository users, repository groups, restriction users and
/// groups (implicit full access), project users, project groups. Inherited
/// project grants never carry merge: every restriction member already has a
/// row by the time they are considered.
#[must_use]
pub fn aggregate(project_key: &str, slug: &str, sources: &GrantSources<'_>) -> RepositoryAccess {
    let master = sources.master_restriction;
    let mut set = RowSet::default();

    for grant in sources.repo_users {
        let name = &grant.user.slug;
        set.push_grant(name, PrincipalKind::User, grant.permission, has_merge(name, master));
    }
    for grant in sources.repo_groups {
        let name = &grant.group.name;
        set.push_grant(name, PrincipalKind::Group, grant.permission, has_merge(name, master));
    }

    if let Some(restriction) = master {
        let implicit = restriction
            .users
            .iter()
            .map(|u| (u.slug.as_str(), PrincipalKind::User))
            .chain(restriction.groups.iter().map(|g| (g.as_str(), PrincipalKind::Group)));
        for (name, kind) in implicit {
            set.push(AccessRow {
                name: name.to_string(),
                kind,
                read: true,
                write: true,
                merge: true,
            });
        }
    }

    for grant in sources.project_users {
        set.push_grant(&grant.user.slug, PrincipalKind::User, grant.permission, false);
    }
    for grant in sources.project_groups {
        set.push_grant(&grant.group.name, PrincipalKind::Group, grant.permission, false);
    }

    RepositoryAccess {
        project_key: project_key.to_string(),
        slug: slug.to_string(),
        rows: set.rows,
    }
}

/// Fetches every grant source for a repository and aggregates them.
pub fn collect_access(remote: &dyn RemoteApi, project_key: &str, slug: &str) -> Result<RepositoryAccess> {
    let repo_users = remote.repository_user_permissions(project_key, slug)?;
    let repo_groups = remote.repository_group_permissions(project_key, slug)?;
    let project_users = remote.project_user_permissions(project_key)?;
    let project_groups = remote.project_group_permissions(project_key)?;
    let master = find_restriction(
        remote,
        project_key,
        slug,
        RestrictionType::ReadOnly,
        MASTER_BRANCH_REF,
    )?;

    let sources = GrantSources {
        repo_users: &repo_users,
        repo_groups: &repo_groups,
        project_users: &project_users,
        project_groups: &project_groups,
        master_restriction: master.as_ref(),
    };
    Ok(aggregate(project_key, slug, &sources))
}
