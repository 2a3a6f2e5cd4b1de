use crate::config::Settings;
use crate::diff::Comparison;
use crate::hooks::{self, EolSettings, HookKind, YaccSettings};

use super::client;
use super::commands::RepoArgs;

pub fn run_hooks_list(settings: &Settings, repo: &RepoArgs) -> anyhow::Result<()> {
    let client = client(settings)?;
    let list = hooks::list(&client, &repo.project, &repo.repository)?;

    if list.is_empty() {
        println!("No hooks found.");
        return Ok(());
    }
    for hook in list {
        let state = if hook.enabled { "[ENABLED ]" } else { "[DISABLED]" };
        println!("{state} {} ({})", hook.details.name, hook.details.key);
    }
    Ok(())
}

/// Enables a hook that takes no settings.
pub fn run_hook_enable(settings: &Settings, kind: HookKind, repo: &RepoArgs) -> anyhow::Result<()> {
    let client = client(settings)?;
    hooks::enable::<()>(&client, &repo.project, &repo.repository, kind, None)?;
    println!(
        "[OK] Enabled {} hook on {}/{}",
        kind.label(),
        repo.project,
        repo.repository
    );
    Ok(())
}

pub fn run_hook_disable(settings: &Settings, kind: HookKind, repo: &RepoArgs) -> anyhow::Result<()> {
    let client = client(settings)?;
    hooks::disable(&client, &repo.project, &repo.repository, kind)?;
    println!(
        "[OK] Disabled {} hook on {}/{}",
        kind.label(),
        repo.project,
        repo.repository
    );
    Ok(())
}

pub fn run_yacc_enable(settings: &Settings, repo: &RepoArgs, yacc: &YaccSettings) -> anyhow::Result<()> {
    let client = client(settings)?;
    hooks::enable(&client, &repo.project, &repo.repository, HookKind::Yacc, Some(yacc))?;
    println!(
        "[OK] Enabled {} hook on {}/{}",
        HookKind::Yacc.label(),
        repo.project,
        repo.repository
    );
    Ok(())
}

pub fn run_eol_enable(settings: &Settings, repo: &RepoArgs, eol: &EolSettings) -> anyhow::Result<()> {
    let client = client(settings)?;
    hooks::enable(&client, &repo.project, &repo.repository, HookKind::Eol, Some(eol))?;
    println!(
        "[OK] Enabled {} hook on {}/{}",
        HookKind::Eol.label(),
        repo.project,
        repo.repository
    );
    Ok(())
}

pub fn run_yacc_get_settings(settings: &Settings, repo: &RepoArgs) -> anyhow::Result<()> {
    let client = client(settings)?;
    let current = hooks::yacc_settings(&client, &repo.project, &repo.repository)?;
    println!("{}", serde_json::to_string_pretty(&current)?);
    Ok(())
}

/// Prints `YES|NO# <live settings as JSON># <differences>`.
pub fn run_yacc_diff_settings(settings: &Settings, repo: &RepoArgs, desired: &YaccSettings) -> anyhow::Result<()> {
    let client = client(settings)?;
    let (actual, comparison) = hooks::diff_yacc(&client, &repo.project, &repo.repository, desired)?;

    match comparison {
        Comparison::Skipped => println!("Default settings empty, no comparison will be made"),
        Comparison::Compared(report) => {
            let verdict = if report.is_equal() { "YES" } else { "NO" };
            let json = serde_json::to_string(&actual)?;
            print!("{verdict}# {json}# {report}");
            if report.is_equal() {
                println!();
            }
        }
    }
    Ok(())
}
