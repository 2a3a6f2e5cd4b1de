use std::io;

use anyhow::Context;

use crate::access::{
    self, BulkOutcome, CloneOptions, MergeMode, ReviewersChange, apply_default_reviewers, apply_restriction,
    collect_access,
};
use crate::cache::EntityCache;
use crate::config::Settings;
use crate::error::Error;
use crate::remote::RemoteApi;
use crate::repository::{self, BranchingModelUpdate, PullRequestUpdate, SonarUpdate};
use crate::types::{BranchRestriction, CreateRepository, PrincipalKind, RestrictionType, User, link_hrefs};

use super::{client, report_outcome};
use super::commands::RepoArgs;

pub fn run_repository_create(
    settings: &Settings,
    project: &str,
    name: &str,
    scm: &str,
    forkable: bool,
) -> anyhow::Result<()> {
    let client = client(settings)?;
    let mut cache = EntityCache::open(settings.cache_dir());
    let request = CreateRepository {
        name: name.to_string(),
        scm_id: scm.to_string(),
        forkable,
    };
    let repo = repository::create(&client, &mut cache, project, &request)?;

    println!("[OK] Created repository {}", repo.full_name());
    for href in link_hrefs(&repo.links) {
        println!("  {href}");
    }
    Ok(())
}

pub fn run_repository_move(
    settings: &Settings,
    repo: &RepoArgs,
    target_project: Option<&str>,
    target_name: Option<&str>,
) -> anyhow::Result<()> {
    let client = client(settings)?;
    let cache = EntityCache::open(settings.cache_dir());
    let source = cache.find_repository(&repo.project, &repo.repository)?;
    let request = repository::move_request(source, target_project, target_name);

    let moved = client.move_repository(source.project_key(), &source.slug, &request)?;
    println!(
        "[OK] Moved {} to {}",
        source.full_name(),
        moved.full_name()
    );
    Ok(())
}

pub fn run_repository_show_permissions(settings: &Settings, repo: &RepoArgs, json: bool) -> anyhow::Result<()> {
    let client = client(settings)?;
    let access = collect_access(&client, &repo.project, &repo.repository)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&access)?);
        return Ok(());
    }
    if access.rows.is_empty() {
        println!("No permissions found.");
        return Ok(());
    }

    let width = access.rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(4);
    let mark = |b: bool| if b { "x" } else { "-" };
    println!();
    println!("  {:<width$}  {:<5}  READ  WRITE  MERGE", "NAME", "KIND");
    for row in &access.rows {
        println!(
            "  {:<width$}  {:<5}  {:<4}  {:<5}  {}",
            row.name,
            row.kind.to_string(),
            mark(row.read),
            mark(row.write),
            mark(row.merge)
        );
    }
    println!();
    Ok(())
}

pub fn run_repository_clone_settings(
    settings: &Settings,
    source: &str,
    target: &str,
    options: CloneOptions,
) -> anyhow::Result<()> {
    if !(options.user_permissions || options.group_permissions || options.branch_restrictions) {
        anyhow::bail!("Nothing to clone: pass --user-permissions, --group-permissions or --branch-restrictions");
    }

    let client = client(settings)?;
    let cache = EntityCache::open(settings.cache_dir());
    let source = cache.resolve_repository(source)?;
    let target = cache.resolve_repository(target)?;

    // Every selected part runs; failures are reported together at the end.
    let mut outcomes: Vec<(&str, BulkOutcome)> = Vec::new();
    if options.user_permissions {
        let outcome = access::clone_permissions(&client, source, target, PrincipalKind::User)?;
        outcomes.push(("user permission", outcome));
    }
    if options.group_permissions {
        let outcome = access::clone_permissions(&client, source, target, PrincipalKind::Group)?;
        outcomes.push(("group permission", outcome));
    }
    if options.branch_restrictions {
        let outcome = access::clone_restrictions(&client, source, target)?;
        outcomes.push(("branch restriction", outcome));
    }

    let mut errors: Vec<Error> = Vec::new();
    for (label, outcome) in outcomes {
        errors.extend(report_outcome(&mut io::stdout(), outcome, |item| format!("{label} {item}")).err());
    }

    if !errors.is_empty() {
        let summary: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("{}", summary.join("\n"));
    }
    println!(
        "[OK] Cloned settings from {} to {}",
        source.full_name(),
        target.full_name()
    );
    Ok(())
}

pub fn run_repository_set_branch_restriction(
    settings: &Settings,
    repo: &RepoArgs,
    restriction: RestrictionType,
    branch_ref: &str,
    usernames: &[String],
    groups: &[String],
    update: bool,
) -> anyhow::Result<()> {
    let client = client(settings)?;
    let desired = BranchRestriction::new(restriction, branch_ref, usernames, groups);
    let mode = if update { MergeMode::Update } else { MergeMode::Replace };

    let applied = apply_restriction(&client, &repo.project, &repo.repository, &desired, mode)?;
    println!(
        "[OK] {} restriction on {} for {}/{}: users [{}], groups [{}]",
        applied.kind,
        applied.matcher.display_id,
        repo.project,
        repo.repository,
        applied.user_slugs().join(", "),
        applied.groups.join(", ")
    );
    Ok(())
}

pub fn run_repository_set_default_reviewers(
    settings: &Settings,
    repo: &RepoArgs,
    branch_ref: &str,
    usernames: &[String],
    required_approvers: u32,
    replace: bool,
) -> anyhow::Result<()> {
    let client = client(settings)?;
    let cache = EntityCache::open(settings.cache_dir());
    let target = cache.find_repository(&repo.project, &repo.repository)?;
    let reviewers: Vec<User> = usernames
        .iter()
        .map(|name| cache.find_user_by_username(name).cloned())
        .collect::<Result<_, _>>()?;

    let change = apply_default_reviewers(&client, target, branch_ref, &reviewers, required_approvers, replace)?;
    let verb = match change {
        ReviewersChange::Updated(_) => "Updated",
        ReviewersChange::Created(_) => "Created",
    };
    println!(
        "[OK] {verb} default reviewers on {branch_ref} for {}: {} reviewers",
        target.full_name(),
        change.setting().reviewers.len()
    );
    Ok(())
}

pub fn run_repository_set_pr_settings(
    settings: &Settings,
    repo: &RepoArgs,
    update: &PullRequestUpdate,
) -> anyhow::Result<()> {
    let client = client(settings)?;
    let mut current = client.pull_request_settings(&repo.project, &repo.repository)?;
    update.apply(&mut current);
    client.set_pull_request_settings(&repo.project, &repo.repository, &current)?;
    println!(
        "[OK] Updated pull request settings for {}/{}",
        repo.project, repo.repository
    );
    Ok(())
}

pub fn run_repository_set_branching_model(
    settings: &Settings,
    repo: &RepoArgs,
    update: &BranchingModelUpdate,
) -> anyhow::Result<()> {
    let client = client(settings)?;
    let mut model = client
        .branching_model(&repo.project, &repo.repository)
        .context("Failed to read branching model")?;
    update.apply(&mut model)?;
    client.set_branching_model(&repo.project, &repo.repository, &model)?;
    println!(
        "[OK] Set branching model for repository {}/{}",
        repo.project, repo.repository
    );
    Ok(())
}

pub fn run_repository_sonar(settings: &Settings, repo: &RepoArgs, update: &SonarUpdate) -> anyhow::Result<()> {
    let client = client(settings)?;
    repository::update_sonar(&client, &repo.project, &repo.repository, update)
        .context("Failed to update sonar settings")?;
    println!(
        "[OK] Updated sonar settings for repository {}/{}",
        repo.project, repo.repository
    );
    Ok(())
}
