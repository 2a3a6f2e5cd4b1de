//! Repository hooks known to the tool and their settings records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::diff::{Comparison, Diffable, FieldSpec, FieldValue, compare};
use crate::error::Result;
use crate::remote::RemoteApi;
use crate::types::Hook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Yet Another Commit Checker.
    Yacc,
    Eol,
    ProtectUnmergedBranch,
    RejectForcePush,
}

impl HookKind {
    pub const ALL: [HookKind; 4] = [
        Self::Yacc,
        Self::Eol,
        Self::ProtectUnmergedBranch,
        Self::RejectForcePush,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Yacc => "com.isroot.stash.plugin.yacc:yaccHook",
            Self::Eol => "com.pbaranchikov.stash-eol-check:stash-check-eol-hook",
            Self::ProtectUnmergedBranch => {
                "com.atlassian.stash.plugin.stash-protect-unmerged-branch-hook:protect-unmerged-branch-hook"
            }
            Self::RejectForcePush => "com.atlassian.bitbucket.server.bitbucket-bundled-hooks:force-push-hook",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yacc => "yacc",
            Self::Eol => "eol",
            Self::ProtectUnmergedBranch => "protect unmerged branch",
            Self::RejectForcePush => "reject force push",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Settings of the Yet Another Commit Checker hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[serde(default, rename_all = "camelCase")]
pub struct YaccSettings {
    /// Require that the committer email matches the pushing user's email.
    #[serde(skip_serializing_if = "is_false")]
    #[cfg_attr(feature = "cli", arg(long))]
    pub require_matching_author_email: bool,
    /// Require that the committer name matches the pushing user's name.
    #[serde(skip_serializing_if = "is_false")]
    #[cfg_attr(feature = "cli", arg(long))]
    pub require_matching_author_name: bool,
    /// Regex the committer email must match.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub committer_email_regex: String,
    /// Regex commit messages must match.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub commit_message_regex: String,
    /// Require valid JIRA issues in commit messages.
    #[serde(skip_serializing_if = "is_false")]
    #[cfg_attr(feature = "cli", arg(long))]
    pub require_jira_issue: bool,
    /// Ignore issue-like tokens with an unknown project key.
    #[serde(skip_serializing_if = "is_false")]
    #[cfg_attr(feature = "cli", arg(long))]
    pub ignore_unknown_issue_project_keys: bool,
    /// JQL query referenced issues must match.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub issue_jql_matcher: String,
    /// Regex new branch names must match.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub branch_name_regex: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub error_message_header: String,
    #[serde(rename = "errorMessage.COMMITER_EMAIL", skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub error_message_committer_email: String,
    #[serde(rename = "errorMessage.COMMITER_EMAIL_REGEX", skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub error_message_committer_email_regex: String,
    #[serde(rename = "errorMessage.COMMITER_NAME", skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub error_message_committer_name: String,
    #[serde(rename = "errorMessage.COMMIT_REGEX", skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub error_message_commit_regex: String,
    #[serde(rename = "errorMessage.ISSUE_JQL", skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub error_message_issue_jql: String,
    #[serde(rename = "errorMessage.BRANCH_NAME", skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub error_message_branch_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub error_message_footer: String,
    /// Skip merge commits.
    #[serde(skip_serializing_if = "is_false")]
    #[cfg_attr(feature = "cli", arg(long))]
    pub exclude_merge_commits: bool,
    /// Skip commits whose message matches this regex.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub exclude_by_regex: String,
    /// Skip commits to branches matching this regex.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub exclude_branch_regex: String,
    /// Skip commits pushed by service users.
    #[serde(skip_serializing_if = "is_false")]
    #[cfg_attr(feature = "cli", arg(long))]
    pub exclude_service_user_commits: bool,
    /// Comma separated user names whose commits are skipped.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub exclude_users: String,
}

macro_rules! flag {
    ($path:literal, $ty:ty, $field:ident) => {
        FieldSpec {
            path: $path,
            ignore_whitespace: false,
            get: |s: &$ty| FieldValue::Bool(s.$field),
        }
    };
}

macro_rules! text {
    ($path:literal, $ty:ty, $field:ident) => {
        text!($path, $ty, $field, false)
    };
    ($path:literal, $ty:ty, $field:ident, $ignore_ws:literal) => {
        FieldSpec {
            path: $path,
            ignore_whitespace: $ignore_ws,
            get: |s: &$ty| FieldValue::Text(s.$field.clone()),
        }
    };
}

impl Diffable for YaccSettings {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        flag!("requireMatchingAuthorEmail", YaccSettings, require_matching_author_email),
        flag!("requireMatchingAuthorName", YaccSettings, require_matching_author_name),
        text!("committerEmailRegex", YaccSettings, committer_email_regex),
        text!("commitMessageRegex", YaccSettings, commit_message_regex),
        flag!("requireJiraIssue", YaccSettings, require_jira_issue),
        flag!("ignoreUnknownIssueProjectKeys", YaccSettings, ignore_unknown_issue_project_keys),
        text!("issueJqlMatcher", YaccSettings, issue_jql_matcher, true),
        text!("branchNameRegex", YaccSettings, branch_name_regex),
        text!("errorMessageHeader", YaccSettings, error_message_header),
        text!("errorMessage.COMMITER_EMAIL", YaccSettings, error_message_committer_email),
        text!("errorMessage.COMMITER_EMAIL_REGEX", YaccSettings, error_message_committer_email_regex),
        text!("errorMessage.COMMITER_NAME", YaccSettings, error_message_committer_name),
        text!("errorMessage.COMMIT_REGEX", YaccSettings, error_message_commit_regex),
        text!("errorMessage.ISSUE_JQL", YaccSettings, error_message_issue_jql, true),
        text!("errorMessage.BRANCH_NAME", YaccSettings, error_message_branch_name),
        text!("errorMessageFooter", YaccSettings, error_message_footer),
        flag!("excludeMergeCommits", YaccSettings, exclude_merge_commits),
        text!("excludeByRegex", YaccSettings, exclude_by_regex),
        text!("excludeBranchRegex", YaccSettings, exclude_branch_regex),
        flag!("excludeServiceUserCommits", YaccSettings, exclude_service_user_commits),
        text!("excludeUsers", YaccSettings, exclude_users),
    ];
}

/// Settings of the Stash EOL check hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[serde(default, rename_all = "camelCase")]
pub struct EolSettings {
    /// Comma separated file patterns exempt from the check.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[cfg_attr(feature = "cli", arg(long, default_value = ""))]
    pub exclude_files: String,
    /// Accept files that already had CRLF endings.
    #[serde(skip_serializing_if = "is_false")]
    #[cfg_attr(feature = "cli", arg(long))]
    pub allow_inherited_eol: bool,
}

impl Diffable for EolSettings {
    const FIELDS: &'static [FieldSpec<Self>] = &[
        text!("excludeFiles", EolSettings, exclude_files),
        flag!("allowInheritedEol", EolSettings, allow_inherited_eol),
    ];
}

/// Enables `kind`, sending `settings` along for hooks that take them.
pub fn enable<S: Serialize>(
    remote: &dyn RemoteApi,
    project_key: &str,
    slug: &str,
    kind: HookKind,
    settings: Option<&S>,
) -> Result<()> {
    let payload = settings.map(serde_json::to_value).transpose()?;
    debug!(hook = kind.key(), with_settings = payload.is_some(), "enabling hook");
    remote.enable_hook(project_key, slug, kind.key(), payload.as_ref())
}

pub fn disable(remote: &dyn RemoteApi, project_key: &str, slug: &str, kind: HookKind) -> Result<()> {
    remote.disable_hook(project_key, slug, kind.key())
}

pub fn list(remote: &dyn RemoteApi, project_key: &str, slug: &str) -> Result<Vec<Hook>> {
    remote.hooks(project_key, slug)
}

/// Current YACC settings. A hook that was never configured reads as default.
pub fn yacc_settings(remote: &dyn RemoteApi, project_key: &str, slug: &str) -> Result<YaccSettings> {
    match remote.hook_settings(project_key, slug, HookKind::Yacc.key()) {
        Ok(Value::Null) => Ok(YaccSettings::default()),
        Err(e) if e.status() == Some(404) => Ok(YaccSettings::default()),
        Ok(value) => Ok(serde_json::from_value(value)?),
        Err(e) => Err(e),
    }
}

/// Compares `desired` YACC settings against the live ones.
///
/// Returns the live settings along with the comparison so callers can print
/// both.
pub fn diff_yacc(
    remote: &dyn RemoteApi,
    project_key: &str,
    slug: &str,
    desired: &YaccSettings,
) -> Result<(YaccSettings, Comparison)> {
    let actual = yacc_settings(remote, project_key, slug)?;
    let comparison = compare(desired, &actual);
    Ok((actual, comparison))
}
