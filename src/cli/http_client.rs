use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::remote::{Page, PageRequest, RemoteApi, RestrictionFilter, fetch_all};
use crate::types::*;

const API: &str = "/rest/api/1.0";
const BRANCH_PERMISSIONS: &str = "/rest/branch-permissions/2.0";
const DEFAULT_REVIEWERS: &str = "/rest/default-reviewers/1.0";
const BRANCH_UTILS: &str = "/rest/branch-utils/1.0";
const SONAR: &str = "/rest/sonar4stash/1.0";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Restriction as the branch-permissions API accepts it: principals by name.
#[derive(Debug, Serialize)]
struct RestrictionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(rename = "type")]
    kind: RestrictionType,
    matcher: &'a Matcher,
    users: Vec<&'a str>,
    groups: &'a [String],
}

#[derive(Debug, Serialize)]
struct ReviewerRef {
    id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewerConditionRequest<'a> {
    source_matcher: &'a Matcher,
    target_matcher: &'a Matcher,
    reviewers: Vec<ReviewerRef>,
    required_approvals: u32,
}

impl<'a> From<&'a DefaultReviewersSetting> for ReviewerConditionRequest<'a> {
    fn from(setting: &'a DefaultReviewersSetting) -> Self {
        Self {
            source_matcher: &setting.source_ref_matcher,
            target_matcher: &setting.target_ref_matcher,
            reviewers: setting.reviewers.iter().map(|u| ReviewerRef { id: u.id }).collect(),
            required_approvals: setting.required_approvals,
        }
    }
}

fn seg(s: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(s)
}

fn repo_path(project_key: &str, slug: &str) -> String {
    format!("/projects/{}/repos/{}", seg(project_key), seg(slug))
}

/// Blocking client for the Bitbucket Server REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
}

impl ApiClient {
    pub fn new(creds: &Credentials) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: creds.url.trim_end_matches('/').to_string(),
            user: creds.user.clone(),
            password: creds.password.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "remote request");
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(&self.user, Some(&self.password))
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let resp = builder.send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.errors.into_iter().next())
            .map(|e| e.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        Err(Error::Remote {
            status: status.as_u16(),
            message,
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self.send(self.request(Method::GET, path))?.json()?)
    }

    fn page<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], page: PageRequest) -> Result<Page<T>> {
        let builder = self
            .request(Method::GET, path)
            .query(query)
            .query(&[("limit", page.limit), ("start", page.start)]);
        Ok(self.send(builder)?.json()?)
    }

    fn get_all<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        fetch_all(|page| self.page(path, query, page))
    }

    fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> Result<T> {
        Ok(self.send(self.request(method, path).json(body))?.json()?)
    }

    fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).map(|_| ())
    }
}

impl RemoteApi for ApiClient {
    fn list_users(&self, page: PageRequest) -> Result<Page<User>> {
        self.page(&format!("{API}/users"), &[], page)
    }

    fn list_projects(&self, page: PageRequest) -> Result<Page<Project>> {
        self.page(&format!("{API}/projects"), &[], page)
    }

    fn list_repositories(&self, project_key: &str, page: PageRequest) -> Result<Page<Repository>> {
        self.page(&format!("{API}/projects/{}/repos", seg(project_key)), &[], page)
    }

    fn create_repository(&self, project_key: &str, request: &CreateRepository) -> Result<Repository> {
        self.send_json(
            Method::POST,
            &format!("{API}/projects/{}/repos", seg(project_key)),
            request,
        )
    }

    fn move_repository(&self, project_key: &str, slug: &str, request: &MoveRepository) -> Result<Repository> {
        self.send_json(Method::PUT, &format!("{API}{}", repo_path(project_key, slug)), request)
    }

    fn repository_user_permissions(&self, project_key: &str, slug: &str) -> Result<Vec<UserGrant>> {
        self.get_all(&format!("{API}{}/permissions/users", repo_path(project_key, slug)), &[])
    }

    fn repository_group_permissions(&self, project_key: &str, slug: &str) -> Result<Vec<GroupGrant>> {
        self.get_all(&format!("{API}{}/permissions/groups", repo_path(project_key, slug)), &[])
    }

    fn project_user_permissions(&self, project_key: &str) -> Result<Vec<UserGrant>> {
        self.get_all(&format!("{API}/projects/{}/permissions/users", seg(project_key)), &[])
    }

    fn project_group_permissions(&self, project_key: &str) -> Result<Vec<GroupGrant>> {
        self.get_all(&format!("{API}/projects/{}/permissions/groups", seg(project_key)), &[])
    }

    fn set_repository_user_permission(
        &self,
        project_key: &str,
        slug: &str,
        username: &str,
        level: PermissionLevel,
    ) -> Result<()> {
        let path = format!("{API}{}/permissions/users", repo_path(project_key, slug));
        self.send_empty(
            self.request(Method::PUT, &path)
                .query(&[("permission", level.as_repo_str()), ("name", username)]),
        )
    }

    fn unset_repository_user_permission(&self, project_key: &str, slug: &str, username: &str) -> Result<()> {
        let path = format!("{API}{}/permissions/users", repo_path(project_key, slug));
        self.send_empty(self.request(Method::DELETE, &path).query(&[("name", username)]))
    }

    fn set_repository_group_permission(
        &self,
        project_key: &str,
        slug: &str,
        group: &str,
        level: PermissionLevel,
    ) -> Result<()> {
        let path = format!("{API}{}/permissions/groups", repo_path(project_key, slug));
        self.send_empty(
            self.request(Method::PUT, &path)
                .query(&[("permission", level.as_repo_str()), ("name", group)]),
        )
    }

    fn unset_repository_group_permission(&self, project_key: &str, slug: &str, group: &str) -> Result<()> {
        let path = format!("{API}{}/permissions/groups", repo_path(project_key, slug));
        self.send_empty(self.request(Method::DELETE, &path).query(&[("name", group)]))
    }

    fn branch_restrictions(
        &self,
        project_key: &str,
        slug: &str,
        filter: &RestrictionFilter,
    ) -> Result<Vec<BranchRestriction>> {
        let path = format!("{BRANCH_PERMISSIONS}{}/restrictions", repo_path(project_key, slug));
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(kind) = filter.kind {
            query.push(("type", kind.as_str()));
        }
        if let Some(id) = filter.matcher_id.as_deref() {
            query.push(("matcherType", "BRANCH"));
            query.push(("matcherId", id));
        }
        self.get_all(&path, &query)
    }

    fn set_branch_restriction(
        &self,
        project_key: &str,
        slug: &str,
        restriction: &BranchRestriction,
    ) -> Result<BranchRestriction> {
        let path = format!("{BRANCH_PERMISSIONS}{}/restrictions", repo_path(project_key, slug));
        let body = RestrictionRequest {
            id: restriction.id,
            kind: restriction.kind,
            matcher: &restriction.matcher,
            users: restriction.user_slugs(),
            groups: &restriction.groups,
        };
        self.send_json(Method::POST, &path, &body)
    }

    fn default_reviewers(&self, project_key: &str, slug: &str) -> Result<Vec<DefaultReviewersSetting>> {
        self.get(&format!("{DEFAULT_REVIEWERS}{}/conditions", repo_path(project_key, slug)))
    }

    fn create_default_reviewers(
        &self,
        project_key: &str,
        slug: &str,
        setting: &DefaultReviewersSetting,
    ) -> Result<DefaultReviewersSetting> {
        let path = format!("{DEFAULT_REVIEWERS}{}/condition", repo_path(project_key, slug));
        self.send_json(Method::POST, &path, &ReviewerConditionRequest::from(setting))
    }

    fn update_default_reviewers(
        &self,
        project_key: &str,
        slug: &str,
        setting: &DefaultReviewersSetting,
    ) -> Result<DefaultReviewersSetting> {
        let id = setting
            .id
            .ok_or_else(|| Error::Config("default reviewer condition has no id".into()))?;
        let path = format!("{DEFAULT_REVIEWERS}{}/condition/{id}", repo_path(project_key, slug));
        self.send_json(Method::PUT, &path, &ReviewerConditionRequest::from(setting))
    }

    fn hooks(&self, project_key: &str, slug: &str) -> Result<Vec<Hook>> {
        self.get_all(&format!("{API}{}/settings/hooks", repo_path(project_key, slug)), &[])
    }

    fn enable_hook(&self, project_key: &str, slug: &str, hook_key: &str, settings: Option<&Value>) -> Result<()> {
        let path = format!(
            "{API}{}/settings/hooks/{}/enabled",
            repo_path(project_key, slug),
            seg(hook_key)
        );
        let builder = self.request(Method::PUT, &path);
        match settings {
            Some(settings) => self.send_empty(builder.json(settings)),
            None => self.send_empty(builder),
        }
    }

    fn disable_hook(&self, project_key: &str, slug: &str, hook_key: &str) -> Result<()> {
        let path = format!(
            "{API}{}/settings/hooks/{}/enabled",
            repo_path(project_key, slug),
            seg(hook_key)
        );
        self.send_empty(self.request(Method::DELETE, &path))
    }

    fn hook_settings(&self, project_key: &str, slug: &str, hook_key: &str) -> Result<Value> {
        let path = format!(
            "{API}{}/settings/hooks/{}/settings",
            repo_path(project_key, slug),
            seg(hook_key)
        );
        let body = self.send(self.request(Method::GET, &path))?.text()?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn pull_request_settings(&self, project_key: &str, slug: &str) -> Result<PullRequestSettings> {
        self.get(&format!("{API}{}/settings/pull-requests", repo_path(project_key, slug)))
    }

    fn set_pull_request_settings(
        &self,
        project_key: &str,
        slug: &str,
        settings: &PullRequestSettings,
    ) -> Result<()> {
        let path = format!("{API}{}/settings/pull-requests", repo_path(project_key, slug));
        self.send_empty(self.request(Method::POST, &path).json(settings))
    }

    fn branching_model(&self, project_key: &str, slug: &str) -> Result<BranchingModel> {
        self.get(&format!(
            "{BRANCH_UTILS}{}/branchmodel/configuration",
            repo_path(project_key, slug)
        ))
    }

    fn set_branching_model(&self, project_key: &str, slug: &str, model: &BranchingModel) -> Result<()> {
        let path = format!(
            "{BRANCH_UTILS}{}/branchmodel/configuration",
            repo_path(project_key, slug)
        );
        self.send_empty(self.request(Method::PUT, &path).json(model))
    }

    fn sonar_settings(&self, project_key: &str, slug: &str) -> Result<SonarSettings> {
        self.get(&format!("{SONAR}{}/settings", repo_path(project_key, slug)))
    }

    fn set_sonar_settings(&self, project_key: &str, slug: &str, settings: &SonarSettings) -> Result<()> {
        let path = format!("{SONAR}{}/settings", repo_path(project_key, slug));
        self.send_empty(self.request(Method::POST, &path).json(settings))
    }
}
