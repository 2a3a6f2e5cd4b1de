use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::SettingsSource;
use crate::hooks::{EolSettings, YaccSettings};
use crate::types::{PermissionLevel, RestrictionType};

use super::completions::CompletionShell;

fn parse_permission(s: &str) -> Result<PermissionLevel, String> {
    s.parse().map_err(|e: crate::error::Error| e.to_string())
}

#[derive(Parser)]
#[command(name = "bitadmin")]
#[command(about = "Administration tool for Bitbucket Server", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Base URL of the Bitbucket server
    #[arg(long, global = true, env = "BITADMIN_URL")]
    pub url: Option<String>,

    /// Authenticate as this user
    #[arg(long, global = true, env = "BITADMIN_USER")]
    pub user: Option<String>,

    /// Read the password from this file (mode 0600)
    #[arg(long, global = true, env = "BITADMIN_PASSWORD_FILE")]
    pub password_file: Option<PathBuf>,

    /// Directory holding the local entity cache
    #[arg(long, global = true, env = "BITADMIN_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn source(&self) -> SettingsSource {
        SettingsSource {
            url: self.url.clone(),
            user: self.user.clone(),
            password_file: self.password_file.clone(),
            cache_dir: self.cache_dir.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the local entity cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Repository operations
    Repository {
        #[command(subcommand)]
        command: RepositoryCommands,
    },

    /// User permissions on a repository
    User {
        #[command(subcommand)]
        command: PrincipalCommands,
    },

    /// Group permissions on a repository
    Group {
        #[command(subcommand)]
        command: PrincipalCommands,
    },

    /// Repository hook operations
    Hooks {
        #[command(subcommand)]
        command: HookCommands,
    },

    /// Print cached candidate values for a flag
    Complete {
        /// Flag being completed, e.g. --project
        #[arg(allow_hyphen_values = true)]
        flag: String,
    },

    /// Generate a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Fetch users, projects and repositories from the server
    Warmup,

    /// Empty the cache
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Print the cache content
    Dump {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Repository addressed by project key and slug.
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Project key
    #[arg(long)]
    pub project: String,

    /// Repository slug
    #[arg(long)]
    pub repository: String,
}

#[derive(Subcommand)]
pub enum RepositoryCommands {
    /// Create a repository
    Create {
        /// Project key
        #[arg(long)]
        project: String,

        /// Repository name
        #[arg(long)]
        name: String,

        /// SCM of the new repository
        #[arg(long, default_value = "git")]
        scm: String,

        /// Allow forks
        #[arg(long)]
        forkable: bool,
    },

    /// Move or rename a repository
    #[command(group(clap::ArgGroup::new("target").required(true).multiple(true)))]
    Move {
        #[command(flatten)]
        repo: RepoArgs,

        /// Destination project key
        #[arg(long, group = "target")]
        target_project: Option<String>,

        /// New repository name
        #[arg(long, group = "target")]
        target_name: Option<String>,
    },

    /// Show effective read, write and merge access per principal
    ShowPermissions {
        #[command(flatten)]
        repo: RepoArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy permissions and branch restrictions between repositories
    CloneSettings {
        /// Source repository, as slug or PROJECT/slug
        #[arg(long)]
        source_repository: String,

        /// Target repository, as slug or PROJECT/slug
        #[arg(long)]
        target_repository: String,

        /// Copy user permissions
        #[arg(long)]
        user_permissions: bool,

        /// Copy group permissions
        #[arg(long)]
        group_permissions: bool,

        /// Copy branch restrictions
        #[arg(long)]
        branch_restrictions: bool,
    },

    /// Create or edit a branch restriction
    SetBranchRestriction {
        #[command(flatten)]
        repo: RepoArgs,

        /// Restriction type
        #[arg(long, value_enum)]
        restriction: RestrictionType,

        /// Branch the restriction applies to
        #[arg(long, default_value = "refs/heads/master")]
        branch_ref: String,

        /// Exempted user slug (repeatable)
        #[arg(long = "username")]
        usernames: Vec<String>,

        /// Exempted group (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,

        /// Add to the existing principals instead of replacing them
        #[arg(long)]
        update: bool,
    },

    /// Set default reviewers for pull requests targeting a branch
    SetDefaultReviewers {
        #[command(flatten)]
        repo: RepoArgs,

        /// Target branch of the pull requests
        #[arg(long)]
        branch_ref: String,

        /// Reviewer username (repeatable)
        #[arg(long = "username", required = true)]
        usernames: Vec<String>,

        /// Minimum approvals required from default reviewers
        #[arg(long, default_value_t = 0)]
        required_approvers: u32,

        /// Replace existing reviewers instead of adding to them
        #[arg(long)]
        replace: bool,
    },

    /// Update pull request settings
    SetPrSettings {
        #[command(flatten)]
        repo: RepoArgs,

        /// Minimum number of approvals
        #[arg(long)]
        required_approvers: Option<u32>,

        /// Minimum number of successful builds
        #[arg(long)]
        required_successful_builds: Option<u32>,

        /// Require every reviewer to approve
        #[arg(long)]
        required_all_approvers: Option<bool>,

        /// Require every task to be resolved
        #[arg(long)]
        required_all_tasks_complete: Option<bool>,

        /// Withdraw approvals when the source branch changes
        #[arg(long)]
        unapprove_on_update: Option<bool>,
    },

    /// Configure the branching model
    SetBranchingModel {
        #[command(flatten)]
        repo: RepoArgs,

        #[arg(long)]
        enable_bugfix: bool,
        #[arg(long)]
        enable_feature: bool,
        #[arg(long)]
        enable_hotfix: bool,
        #[arg(long)]
        enable_release: bool,

        #[arg(long)]
        prefix_bugfix: Option<String>,
        #[arg(long)]
        prefix_feature: Option<String>,
        #[arg(long)]
        prefix_hotfix: Option<String>,
        #[arg(long)]
        prefix_release: Option<String>,

        /// Production branch ref
        #[arg(long)]
        production_ref: Option<String>,

        /// Development branch ref
        #[arg(long)]
        development_ref: Option<String>,
    },

    /// Configure the Sonar for Bitbucket plugin of a repository
    Sonar {
        #[command(flatten)]
        repo: RepoArgs,

        /// Enable Sonar analysis
        #[arg(long)]
        enabled: bool,

        #[arg(long)]
        master_project_key: Option<String>,

        #[arg(long)]
        project_base_key: Option<String>,

        #[arg(long, value_parser = ["LEAK_PERIOD", "BRANCH_DIFF"])]
        analysis_mode: Option<String>,

        /// Use the branch feature of the Sonar server
        #[arg(long)]
        use_sonar_branch_feature: bool,

        #[arg(long)]
        show_issues_in_source: bool,

        #[arg(long)]
        show_only_new_or_changed_lines: bool,

        /// Replacement for characters Sonar does not accept in branch names
        #[arg(long)]
        illegal_branch_char_replacement: Option<String>,

        /// Remove Sonar projects of deleted branches
        #[arg(long)]
        project_cleanup_enabled: bool,
    },
}

#[derive(Subcommand)]
pub enum PrincipalCommands {
    /// Grant a permission on a repository
    Grant {
        #[command(flatten)]
        repo: RepoArgs,

        /// User slug or group name (repeatable)
        #[arg(long = "name", required = true)]
        names: Vec<String>,

        /// REPO_READ, REPO_WRITE or REPO_ADMIN
        #[arg(long, value_parser = parse_permission)]
        permission: PermissionLevel,
    },

    /// Remove every repository permission
    UnsetPermissions {
        #[command(flatten)]
        repo: RepoArgs,

        /// User slug or group name (repeatable)
        #[arg(long = "name", required = true)]
        names: Vec<String>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum HookCommands {
    /// List hooks and their state
    List {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Yet Another Commit Checker hook
    YetAnotherCommitChecker {
        #[command(subcommand)]
        command: YaccCommands,
    },

    /// Stash EOL check hook
    StashCheckEol {
        #[command(subcommand)]
        command: EolCommands,
    },

    /// Protect unmerged branch hook
    ProtectUnmergedBranch {
        #[command(subcommand)]
        command: ToggleCommands,
    },

    /// Reject force push hook
    RejectForcePush {
        #[command(subcommand)]
        command: ToggleCommands,
    },
}

#[derive(Subcommand)]
pub enum YaccCommands {
    /// Enable the hook with the given settings
    Enable {
        #[command(flatten)]
        repo: RepoArgs,

        #[command(flatten)]
        settings: YaccSettings,
    },

    /// Disable the hook
    Disable {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Print the current settings as JSON
    GetSettings {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Compare the current settings with the given ones
    DiffSettings {
        #[command(flatten)]
        repo: RepoArgs,

        #[command(flatten)]
        settings: YaccSettings,
    },
}

#[derive(Subcommand)]
pub enum EolCommands {
    /// Enable the hook with the given settings
    Enable {
        #[command(flatten)]
        repo: RepoArgs,

        #[command(flatten)]
        settings: EolSettings,
    },

    /// Disable the hook
    Disable {
        #[command(flatten)]
        repo: RepoArgs,
    },
}

#[derive(Subcommand)]
pub enum ToggleCommands {
    /// Enable the hook
    Enable {
        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Disable the hook
    Disable {
        #[command(flatten)]
        repo: RepoArgs,
    },
}
