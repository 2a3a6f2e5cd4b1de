mod cache;
mod commands;
mod completions;
pub mod http_client;
mod hooks;
pub mod pickers;
mod principal;
mod repository;

pub use cache::{run_cache_clear, run_cache_dump, run_cache_warmup, run_complete};
pub use commands::{
    CacheCommands, Cli, Commands, EolCommands, GlobalArgs, HookCommands, PrincipalCommands, RepoArgs,
    RepositoryCommands, ToggleCommands, YaccCommands,
};
pub use completions::{CompletionShell, run_completions};
pub use hooks::{
    run_eol_enable, run_hook_disable, run_hook_enable, run_hooks_list, run_yacc_diff_settings, run_yacc_enable,
    run_yacc_get_settings,
};
pub use principal::{run_principal_grant, run_principal_unset};
pub use repository::{
    run_repository_clone_settings, run_repository_create, run_repository_move, run_repository_set_branch_restriction,
    run_repository_set_branching_model, run_repository_set_default_reviewers, run_repository_set_pr_settings,
    run_repository_show_permissions, run_repository_sonar,
};

use std::io::Write;

use crate::access::BulkOutcome;
use crate::config::Settings;
use crate::error::Result;
use http_client::ApiClient;

/// Builds an API client from the resolved credentials.
pub fn client(settings: &Settings) -> anyhow::Result<ApiClient> {
    let credentials = settings.credentials()?;
    ApiClient::new(&credentials).map_err(Into::into)
}

/// Writes an `[OK]` line per applied item, then fails with the rejected ones.
pub(crate) fn report_outcome<W, F>(out: &mut W, outcome: BulkOutcome, line: F) -> Result<()>
where
    W: Write,
    F: Fn(&str) -> String,
{
    for item in &outcome.succeeded {
        writeln!(out, "[OK] {}", line(item))?;
    }
    outcome.into_result().map(|_| ())
}
