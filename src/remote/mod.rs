//! Interface to the hosting service.
//!
//! Everything the tool needs from the server goes through [`RemoteApi`]; the
//! HTTP implementation lives in `cli::http_client`. Calls are blocking and are
//! never retried here.

#[cfg(test)]
pub(crate) mod testing;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::*;

/// Page size used for every bulk listing.
pub const PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub start: u32,
}

impl PageRequest {
    #[must_use]
    pub const fn first(limit: u32) -> Self {
        Self { limit, start: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub values: Vec<T>,
    #[serde(default)]
    pub start: u32,
    #[serde(default)]
    pub limit: u32,
    pub is_last_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_start: Option<u32>,
}

impl<T> Page<T> {
    /// Request for the page following this one.
    #[must_use]
    pub fn next_request(&self, current: PageRequest) -> PageRequest {
        PageRequest {
            limit: current.limit,
            start: self.next_page_start.unwrap_or(current.start + current.limit),
        }
    }
}

/// Drains a paginated listing one page at a time, in order.
///
/// Stops on the last page, or on an empty page so a misbehaving server cannot
/// loop forever. The first fetch error is returned as is.
pub fn fetch_all<T, F>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(PageRequest) -> Result<Page<T>>,
{
    let mut request = PageRequest::first(PAGE_SIZE);
    let mut out = Vec::new();
    loop {
        let page = fetch(request)?;
        let done = page.is_last_page || page.values.is_empty();
        request = page.next_request(request);
        out.extend(page.values);
        if done {
            return Ok(out);
        }
    }
}

/// Filter applied when listing branch restrictions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionFilter {
    pub kind: Option<RestrictionType>,
    pub matcher_id: Option<String>,
}

/// Operations consumed from the hosting service.
pub trait RemoteApi {
    // Bulk listings
    fn list_users(&self, page: PageRequest) -> Result<Page<User>>;
    fn list_projects(&self, page: PageRequest) -> Result<Page<Project>>;
    fn list_repositories(&self, project_key: &str, page: PageRequest) -> Result<Page<Repository>>;

    // Repository lifecycle
    fn create_repository(&self, project_key: &str, request: &CreateRepository) -> Result<Repository>;
    fn move_repository(
        &self,
        project_key: &str,
        slug: &str,
        request: &MoveRepository,
    ) -> Result<Repository>;

    // Permissions
    fn repository_user_permissions(&self, project_key: &str, slug: &str) -> Result<Vec<UserGrant>>;
    fn repository_group_permissions(&self, project_key: &str, slug: &str) -> Result<Vec<GroupGrant>>;
    fn project_user_permissions(&self, project_key: &str) -> Result<Vec<UserGrant>>;
    fn project_group_permissions(&self, project_key: &str) -> Result<Vec<GroupGrant>>;
    fn set_repository_user_permission(
        &self,
        project_key: &str,
        slug: &str,
        username: &str,
        level: PermissionLevel,
    ) -> Result<()>;
    fn unset_repository_user_permission(&self, project_key: &str, slug: &str, username: &str) -> Result<()>;
    fn set_repository_group_permission(
        &self,
        project_key: &str,
        slug: &str,
        group: &str,
        level: PermissionLevel,
    ) -> Result<()>;
    fn unset_repository_group_permission(&self, project_key: &str, slug: &str, group: &str) -> Result<()>;

    // Branch restrictions
    fn branch_restrictions(
        &self,
        project_key: &str,
        slug: &str,
        filter: &RestrictionFilter,
    ) -> Result<Vec<BranchRestriction>>;
    fn set_branch_restriction(
        &self,
        project_key: &str,
        slug: &str,
        restriction: &BranchRestriction,
    ) -> Result<BranchRestriction>;

    // Default reviewers
    fn default_reviewers(&self, project_key: &str, slug: &str) -> Result<Vec<DefaultReviewersSetting>>;
    fn create_default_reviewers(
        &self,
        project_key: &str,
        slug: &str,
        setting: &DefaultReviewersSetting,
    ) -> Result<DefaultReviewersSetting>;
    fn update_default_reviewers(
        &self,
        project_key: &str,
        slug: &str,
        setting: &DefaultReviewersSetting,
    ) -> Result<DefaultReviewersSetting>;

    // Hooks
    fn hooks(&self, project_key: &str, slug: &str) -> Result<Vec<Hook>>;
    fn enable_hook(&self, project_key: &str, slug: &str, hook_key: &str, settings: Option<&Value>) -> Result<()>;
    fn disable_hook(&self, project_key: &str, slug: &str, hook_key: &str) -> Result<()>;
    fn hook_settings(&self, project_key: &str, slug: &str, hook_key: &str) -> Result<Value>;

    // Repository settings
    fn pull_request_settings(&self, project_key: &str, slug: &str) -> Result<PullRequestSettings>;
    fn set_pull_request_settings(
        &self,
        project_key: &str,
        slug: &str,
        settings: &PullRequestSettings,
    ) -> Result<()>;
    fn branching_model(&self, project_key: &str, slug: &str) -> Result<BranchingModel>;
    fn set_branching_model(&self, project_key: &str, slug: &str, model: &BranchingModel) -> Result<()>;

    // Sonar for Bitbucket plugin
    fn sonar_settings(&self, project_key: &str, slug: &str) -> Result<SonarSettings>;
    fn set_sonar_settings(&self, project_key: &str, slug: &str, settings: &SonarSettings) -> Result<()>;
}

/// Fetches the single restriction of `kind` on `branch_ref`, if any.
pub fn find_restriction(
    remote: &dyn RemoteApi,
    project_key: &str,
    slug: &str,
    kind: RestrictionType,
    branch_ref: &str,
) -> Result<Option<BranchRestriction>> {
    let filter = RestrictionFilter {
        kind: Some(kind),
        matcher_id: Some(branch_ref.to_string()),
    };
    let found = remote.branch_restrictions(project_key, slug, &filter)?;
    Ok(found
        .into_iter()
        .find(|r| r.kind == kind && r.matcher.id == branch_ref))
}
