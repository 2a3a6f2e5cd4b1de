use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::permission::{PermissionLevel, RestrictionType, optional_level};

/// Hyperlinks keyed by relation (`self`, `clone`, ...).
pub type Links = BTreeMap<String, Vec<Link>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Flattens links to their hrefs, in relation order.
#[must_use]
pub fn link_hrefs(links: &Links) -> Vec<&str> {
    links
        .values()
        .flat_map(|group| group.iter().map(|l| l.href.as_str()))
        .collect()
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl User {
    /// A user reference known only by slug, as given on the command line.
    pub fn with_slug(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: 0,
            name: slug.clone(),
            slug,
            display_name: String::new(),
            email_address: String::new(),
            active: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: u64,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    #[serde(default)]
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    pub project: Project,
    #[serde(default)]
    pub forkable: bool,
    #[serde(default)]
    pub links: Links,
}

impl Repository {
    #[must_use]
    pub fn project_key(&self) -> &str {
        &self.project.key
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.project.key, self.slug)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGrant {
    pub user: User,
    #[serde(default, with = "optional_level")]
    pub permission: Option<PermissionLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupGrant {
    pub group: Group,
    #[serde(default, with = "optional_level")]
    pub permission: Option<PermissionLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherType {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Identifies which refs a restriction or reviewer condition applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    pub id: String,
    #[serde(default)]
    pub display_id: String,
    #[serde(rename = "type")]
    pub kind: MatcherType,
    #[serde(default)]
    pub active: bool,
}

impl Matcher {
    /// Matcher for a single branch; the display id is the last ref segment.
    pub fn branch(ref_id: &str) -> Self {
        let display_id = ref_id.rsplit('/').next().unwrap_or(ref_id).to_string();
        Self {
            id: ref_id.to_string(),
            display_id,
            kind: MatcherType {
                id: "BRANCH".to_string(),
                name: "Branch".to_string(),
            },
            active: true,
        }
    }

    #[must_use]
    pub fn any_ref() -> Self {
        Self {
            id: "ANY_REF_MATCHER_ID".to_string(),
            display_id: "ANY_REF_MATCHER_ID".to_string(),
            kind: MatcherType {
                id: "ANY_REF".to_string(),
                name: "Any branch".to_string(),
            },
            active: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRestriction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: RestrictionType,
    pub matcher: Matcher,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl BranchRestriction {
    /// A restriction that does not exist remotely yet.
    pub fn new(kind: RestrictionType, branch_ref: &str, users: &[String], groups: &[String]) -> Self {
        Self {
            id: None,
            kind,
            matcher: Matcher::branch(branch_ref),
            users: users.iter().map(User::with_slug).collect(),
            groups: groups.to_vec(),
        }
    }

    #[must_use]
    pub fn user_slugs(&self) -> Vec<&str> {
        self.users.iter().map(|u| u.slug.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultReviewersSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    #[serde(alias = "sourceMatcher")]
    pub source_ref_matcher: Matcher,
    #[serde(alias = "targetMatcher")]
    pub target_ref_matcher: Matcher,
    #[serde(default)]
    pub reviewers: Vec<User>,
    #[serde(default)]
    pub required_approvals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDetails {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    pub enabled: bool,
    pub details: HookDetails,
}

/// Pull request settings. Fields not managed here (merge config, ...) are
/// carried through `extra` so a write-back does not clear them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestSettings {
    #[serde(default)]
    pub required_all_approvers: bool,
    #[serde(default)]
    pub required_all_tasks_complete: bool,
    #[serde(default)]
    pub required_approvers: u32,
    #[serde(default)]
    pub required_successful_builds: u32,
    #[serde(default)]
    pub unapprove_on_update: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub use_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchType {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchingModel {
    #[serde(default)]
    pub development: BranchRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<BranchRef>,
    #[serde(default)]
    pub types: Vec<BranchType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Project section of the Sonar for Bitbucket repository settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SonarProjectSettings {
    pub sonar_enabled: bool,
    pub master_project_key: String,
    pub project_base_key: String,
    pub analysis_mode: String,
    pub use_sonar_branch_feature: bool,
    pub show_issues_in_source: bool,
    pub show_only_new_or_changed_lines: bool,
    pub illegal_branch_char_replacement: String,
    pub project_cleanup_enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sonar settings of one repository. Sections other than `project` are
/// carried through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SonarSettings {
    #[serde(default)]
    pub project: SonarProjectSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepository {
    pub name: String,
    pub scm_id: String,
    pub forkable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRepository {
    pub name: String,
    pub project: ProjectRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_matcher_display_id() {
        let m = Matcher::branch("refs/heads/release/2.0");
        assert_eq!(m.id, "refs/heads/release/2.0");
        assert_eq!(m.display_id, "2.0");
        assert_eq!(m.kind.id, "BRANCH");
        assert!(m.active);
    }

    #[test]
    fn test_user_defaults_to_active() {
        let user: User = serde_json::from_str(r#"{"slug":"alice"}"#).unwrap();
        assert!(user.active);
        let user: User = serde_json::from_str(r#"{"slug":"bob","active":false}"#).unwrap();
        assert!(!user.active);
    }

    #[test]
    fn test_restriction_parses_remote_shape() {
        let json = r#"{
            "id": 12,
            "type": "read-only",
            "matcher": {
                "id": "refs/heads/master",
                "displayId": "master",
                "type": {"id": "BRANCH", "name": "Branch"},
                "active": true
            },
            "users": [{"name": "alice", "slug": "alice", "active": true}],
            "groups": ["release-managers"]
        }"#;
        let r: BranchRestriction = serde_json::from_str(json).unwrap();
        assert_eq!(r.id, Some(12));
        assert_eq!(r.kind, RestrictionType::ReadOnly);
        assert_eq!(r.user_slugs(), vec!["alice"]);
        assert_eq!(r.groups, vec!["release-managers"]);
    }

    #[test]
    fn test_pull_request_settings_keep_unknown_fields() {
        let json = r#"{"requiredApprovers":2,"mergeConfig":{"defaultStrategy":{"id":"squash"}}}"#;
        let mut settings: PullRequestSettings = serde_json::from_str(json).unwrap();
        settings.required_approvers = 3;
        let out = serde_json::to_value(&settings).unwrap();
        assert_eq!(out["requiredApprovers"], 3);
        assert_eq!(out["mergeConfig"]["defaultStrategy"]["id"], "squash");
    }

    #[test]
    fn test_sonar_settings_keep_other_sections() {
        let raw = serde_json::json!({
            "project": { "sonarEnabled": true, "analysisMode": "BRANCH_DIFF", "buildType": "MAVEN" },
            "issues": { "showIssuesInSource": true }
        });
        let settings: SonarSettings = serde_json::from_value(raw.clone()).unwrap();
        assert!(settings.project.sonar_enabled);
        assert_eq!(settings.project.analysis_mode, "BRANCH_DIFF");

        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["issues"], raw["issues"]);
        assert_eq!(back["project"]["buildType"], "MAVEN");
    }

    #[test]
    fn test_link_hrefs_flattens_relations() {
        let mut links = Links::new();
        links.insert(
            "clone".into(),
            vec![
                Link {
                    href: "ssh://git@host/prj/app.git".into(),
                    name: Some("ssh".into()),
                },
                Link {
                    href: "https://host/scm/prj/app.git".into(),
                    name: Some("http".into()),
                },
            ],
        );
        links.insert(
            "self".into(),
            vec![Link {
                href: "https://host/projects/PRJ/repos/app/browse".into(),
                name: None,
            }],
        );
        assert_eq!(link_hrefs(&links).len(), 3);
        assert_eq!(link_hrefs(&links)[2], "https://host/projects/PRJ/repos/app/browse");
    }
}
