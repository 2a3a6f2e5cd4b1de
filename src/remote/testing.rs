use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::{Page, PageRequest, RemoteApi, RestrictionFilter};
use crate::error::{Error, Result};
use crate::types::*;

/// In-memory stand-in for the hosting service that records every call.
#[derive(Default)]
pub(crate) struct FakeRemote {
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub repositories: Vec<Repository>,
    pub repo_user_grants: Vec<UserGrant>,
    pub repo_group_grants: Vec<GroupGrant>,
    pub project_user_grants: Vec<UserGrant>,
    pub project_group_grants: Vec<GroupGrant>,
    pub restrictions: RefCell<Vec<BranchRestriction>>,
    pub reviewers: RefCell<Vec<DefaultReviewersSetting>>,
    pub hooks: RefCell<Vec<Hook>>,
    pub hook_settings: RefCell<BTreeMap<String, Value>>,
    pub pr_settings: RefCell<PullRequestSettings>,
    pub branching: RefCell<BranchingModel>,
    pub sonar: RefCell<SonarSettings>,
    /// Principal names whose permission writes are rejected.
    pub rejected: BTreeSet<String>,
    /// Listing that fails after the first page (`users`, `projects`, ...).
    pub failing_listing: Option<&'static str>,
    pub calls: RefCell<Vec<String>>,
    pub next_id: Cell<u64>,
}

pub(crate) fn user(slug: &str) -> User {
    User {
        id: slug.len() as u64,
        name: slug.to_string(),
        slug: slug.to_string(),
        display_name: slug.to_uppercase(),
        email_address: format!("{slug}@example.com"),
        active: true,
    }
}

pub(crate) fn inactive(slug: &str) -> User {
    User {
        active: false,
        ..user(slug)
    }
}

pub(crate) fn project(key: &str) -> Project {
    Project {
        id: 1,
        key: key.to_string(),
        name: format!("{key} project"),
        description: None,
        links: Links::new(),
    }
}

pub(crate) fn repository(project_key: &str, slug: &str) -> Repository {
    Repository {
        id: 1,
        slug: slug.to_string(),
        name: slug.to_string(),
        project: project(project_key),
        forkable: true,
        links: Links::new(),
    }
}

fn paginate<T: Clone>(items: &[T], req: PageRequest) -> Page<T> {
    let start = (req.start as usize).min(items.len());
    let end = (start + req.limit as usize).min(items.len());
    let is_last_page = end >= items.len();
    Page {
        values: items[start..end].to_vec(),
        start: req.start,
        limit: req.limit,
        is_last_page,
        next_page_start: (!is_last_page).then_some(end as u32),
    }
}

impl FakeRemote {
    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn check_listing(&self, name: &str, req: PageRequest) -> Result<()> {
        if self.failing_listing == Some(name) && req.start > 0 {
            return Err(Error::Remote {
                status: 500,
                message: format!("{name} listing failed"),
            });
        }
        Ok(())
    }

    fn check_principal(&self, name: &str) -> Result<()> {
        if self.rejected.contains(name) {
            return Err(Error::Remote {
                status: 404,
                message: format!("No such principal {name}"),
            });
        }
        Ok(())
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get() + 100;
        self.next_id.set(self.next_id.get() + 1);
        id
    }
}

impl RemoteApi for FakeRemote {
    fn list_users(&self, page: PageRequest) -> Result<Page<User>> {
        self.record(format!("list_users:{}", page.start));
        self.check_listing("users", page)?;
        Ok(paginate(&self.users, page))
    }

    fn list_projects(&self, page: PageRequest) -> Result<Page<Project>> {
        self.record(format!("list_projects:{}", page.start));
        self.check_listing("projects", page)?;
        Ok(paginate(&self.projects, page))
    }

    fn list_repositories(&self, project_key: &str, page: PageRequest) -> Result<Page<Repository>> {
        self.record(format!("list_repositories:{project_key}:{}", page.start));
        self.check_listing("repositories", page)?;
        let scoped: Vec<Repository> = self
            .repositories
            .iter()
            .filter(|r| r.project.key == project_key)
            .cloned()
            .collect();
        Ok(paginate(&scoped, page))
    }

    fn create_repository(&self, project_key: &str, request: &CreateRepository) -> Result<Repository> {
        self.record(format!("create_repository:{project_key}:{}", request.name));
        if !self.projects.iter().any(|p| p.key == project_key) {
            return Err(Error::Remote {
                status: 404,
                message: "Project does not exist".into(),
            });
        }
        let slug = request.name.to_lowercase();
        if self
            .repositories
            .iter()
            .any(|r| r.project.key == project_key && r.slug == slug)
        {
            return Err(Error::Remote {
                status: 409,
                message: "Repository already exists".into(),
            });
        }
        Ok(Repository {
            forkable: request.forkable,
            ..repository(project_key, &slug)
        })
    }

    fn move_repository(
        &self,
        project_key: &str,
        slug: &str,
        request: &MoveRepository,
    ) -> Result<Repository> {
        self.record(format!(
            "move_repository:{project_key}/{slug}:{}/{}",
            request.project.key, request.name
        ));
        Ok(repository(&request.project.key, &request.name))
    }

    fn repository_user_permissions(&self, project_key: &str, slug: &str) -> Result<Vec<UserGrant>> {
        self.record(format!("repository_user_permissions:{project_key}/{slug}"));
        Ok(self.repo_user_grants.clone())
    }

    fn repository_group_permissions(&self, project_key: &str, slug: &str) -> Result<Vec<GroupGrant>> {
        self.record(format!("repository_group_permissions:{project_key}/{slug}"));
        Ok(self.repo_group_grants.clone())
    }

    fn project_user_permissions(&self, project_key: &str) -> Result<Vec<UserGrant>> {
        self.record(format!("project_user_permissions:{project_key}"));
        Ok(self.project_user_grants.clone())
    }

    fn project_group_permissions(&self, project_key: &str) -> Result<Vec<GroupGrant>> {
        self.record(format!("project_group_permissions:{project_key}"));
        Ok(self.project_group_grants.clone())
    }

    fn set_repository_user_permission(
        &self,
        project_key: &str,
        slug: &str,
        username: &str,
        level: PermissionLevel,
    ) -> Result<()> {
        self.record(format!("set_user:{project_key}/{slug}:{username}:{level}"));
        self.check_principal(username)
    }

    fn unset_repository_user_permission(&self, project_key: &str, slug: &str, username: &str) -> Result<()> {
        self.record(format!("unset_user:{project_key}/{slug}:{username}"));
        self.check_principal(username)
    }

    fn set_repository_group_permission(
        &self,
        project_key: &str,
        slug: &str,
        group: &str,
        level: PermissionLevel,
    ) -> Result<()> {
        self.record(format!("set_group:{project_key}/{slug}:{group}:{level}"));
        self.check_principal(group)
    }

    fn unset_repository_group_permission(&self, project_key: &str, slug: &str, group: &str) -> Result<()> {
        self.record(format!("unset_group:{project_key}/{slug}:{group}"));
        self.check_principal(group)
    }

    fn branch_restrictions(
        &self,
        project_key: &str,
        slug: &str,
        filter: &RestrictionFilter,
    ) -> Result<Vec<BranchRestriction>> {
        self.record(format!("branch_restrictions:{project_key}/{slug}"));
        Ok(self
            .restrictions
            .borrow()
            .iter()
            .filter(|r| filter.kind.is_none_or(|k| k == r.kind))
            .filter(|r| {
                filter
                    .matcher_id
                    .as_deref()
                    .is_none_or(|id| id == r.matcher.id)
            })
            .cloned()
            .collect())
    }

    fn set_branch_restriction(
        &self,
        project_key: &str,
        slug: &str,
        restriction: &BranchRestriction,
    ) -> Result<BranchRestriction> {
        self.record(format!(
            "set_branch_restriction:{project_key}/{slug}:{}",
            restriction.kind
        ));
        let mut stored = restriction.clone();
        let mut all = self.restrictions.borrow_mut();
        match stored.id {
            Some(id) => all.retain(|r| r.id != Some(id)),
            None => stored.id = Some(self.allocate_id()),
        }
        all.push(stored.clone());
        Ok(stored)
    }

    fn default_reviewers(&self, project_key: &str, slug: &str) -> Result<Vec<DefaultReviewersSetting>> {
        self.record(format!("default_reviewers:{project_key}/{slug}"));
        Ok(self.reviewers.borrow().clone())
    }

    fn create_default_reviewers(
        &self,
        project_key: &str,
        slug: &str,
        setting: &DefaultReviewersSetting,
    ) -> Result<DefaultReviewersSetting> {
        self.record(format!("create_default_reviewers:{project_key}/{slug}"));
        let mut stored = setting.clone();
        stored.id = Some(self.allocate_id());
        self.reviewers.borrow_mut().push(stored.clone());
        Ok(stored)
    }

    fn update_default_reviewers(
        &self,
        project_key: &str,
        slug: &str,
        setting: &DefaultReviewersSetting,
    ) -> Result<DefaultReviewersSetting> {
        self.record(format!("update_default_reviewers:{project_key}/{slug}"));
        let mut all = self.reviewers.borrow_mut();
        all.retain(|s| s.id != setting.id);
        all.push(setting.clone());
        Ok(setting.clone())
    }

    fn hooks(&self, project_key: &str, slug: &str) -> Result<Vec<Hook>> {
        self.record(format!("hooks:{project_key}/{slug}"));
        Ok(self.hooks.borrow().clone())
    }

    fn enable_hook(&self, project_key: &str, slug: &str, hook_key: &str, settings: Option<&Value>) -> Result<()> {
        self.record(format!("enable_hook:{project_key}/{slug}:{hook_key}"));
        if let Some(settings) = settings {
            self.hook_settings
                .borrow_mut()
                .insert(hook_key.to_string(), settings.clone());
        }
        Ok(())
    }

    fn disable_hook(&self, project_key: &str, slug: &str, hook_key: &str) -> Result<()> {
        self.record(format!("disable_hook:{project_key}/{slug}:{hook_key}"));
        Ok(())
    }

    fn hook_settings(&self, project_key: &str, slug: &str, hook_key: &str) -> Result<Value> {
        self.record(format!("hook_settings:{project_key}/{slug}:{hook_key}"));
        self.hook_settings
            .borrow()
            .get(hook_key)
            .cloned()
            .ok_or_else(|| Error::Remote {
                status: 404,
                message: "Not Found".into(),
            })
    }

    fn pull_request_settings(&self, project_key: &str, slug: &str) -> Result<PullRequestSettings> {
        self.record(format!("pull_request_settings:{project_key}/{slug}"));
        Ok(self.pr_settings.borrow().clone())
    }

    fn set_pull_request_settings(
        &self,
        project_key: &str,
        slug: &str,
        settings: &PullRequestSettings,
    ) -> Result<()> {
        self.record(format!("set_pull_request_settings:{project_key}/{slug}"));
        *self.pr_settings.borrow_mut() = settings.clone();
        Ok(())
    }

    fn branching_model(&self, project_key: &str, slug: &str) -> Result<BranchingModel> {
        self.record(format!("branching_model:{project_key}/{slug}"));
        Ok(self.branching.borrow().clone())
    }

    fn set_branching_model(&self, project_key: &str, slug: &str, model: &BranchingModel) -> Result<()> {
        self.record(format!("set_branching_model:{project_key}/{slug}"));
        *self.branching.borrow_mut() = model.clone();
        Ok(())
    }

    fn sonar_settings(&self, project_key: &str, slug: &str) -> Result<SonarSettings> {
        self.record(format!("sonar_settings:{project_key}/{slug}"));
        Ok(self.sonar.borrow().clone())
    }

    fn set_sonar_settings(&self, project_key: &str, slug: &str, settings: &SonarSettings) -> Result<()> {
        self.record(format!("set_sonar_settings:{project_key}/{slug}"));
        *self.sonar.borrow_mut() = settings.clone();
        Ok(())
    }
}
