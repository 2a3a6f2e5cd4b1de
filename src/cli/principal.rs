use std::io;

use crate::access;
use crate::config::Settings;
use crate::types::{PermissionLevel, PrincipalKind};

use super::commands::RepoArgs;
use super::pickers::confirm_action;
use super::{client, report_outcome};

pub fn run_principal_grant(
    settings: &Settings,
    kind: PrincipalKind,
    repo: &RepoArgs,
    names: &[String],
    level: PermissionLevel,
) -> anyhow::Result<()> {
    let client = client(settings)?;
    let outcome = access::grant(&client, &repo.project, &repo.repository, kind, names, level);

    report_outcome(&mut io::stdout(), outcome, |name| {
        format!(
            "Granted {} to {kind} '{name}' on {}/{}",
            level.as_repo_str(),
            repo.project,
            repo.repository
        )
    })?;
    Ok(())
}

pub fn run_principal_unset(
    settings: &Settings,
    kind: PrincipalKind,
    repo: &RepoArgs,
    names: &[String],
    yes: bool,
) -> anyhow::Result<()> {
    let message = format!(
        "Remove all permissions of {} {kind}(s) on {}/{}?",
        names.len(),
        repo.project,
        repo.repository
    );
    if !confirm_action(&message, yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    let client = client(settings)?;
    let outcome = access::unset(&client, &repo.project, &repo.repository, kind, names);
    report_outcome(&mut io::stdout(), outcome, |name| {
        format!(
            "Removed permissions of {kind} '{name}' on {}/{}",
            repo.project, repo.repository
        )
    })?;
    Ok(())
}
