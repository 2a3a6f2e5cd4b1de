use clap::Parser;
use tracing_subscriber::EnvFilter;

use bitadmin::access::CloneOptions;
use bitadmin::cli::{
    CacheCommands, Cli, Commands, EolCommands, HookCommands, PrincipalCommands, RepositoryCommands, ToggleCommands,
    YaccCommands, run_cache_clear, run_cache_dump, run_cache_warmup, run_complete, run_completions, run_eol_enable,
    run_hook_disable, run_hook_enable, run_hooks_list, run_principal_grant, run_principal_unset,
    run_repository_clone_settings, run_repository_create, run_repository_move, run_repository_set_branch_restriction,
    run_repository_set_branching_model, run_repository_set_default_reviewers, run_repository_set_pr_settings,
    run_repository_show_permissions, run_repository_sonar, run_yacc_diff_settings, run_yacc_enable, run_yacc_get_settings,
};
use bitadmin::config::{Settings, SettingsSource, load_profile, profile_path};
use bitadmin::hooks::HookKind;
use bitadmin::repository::{BranchTypeUpdate, BranchingModelUpdate, PullRequestUpdate, SonarUpdate};
use bitadmin::types::PrincipalKind;

/// Flags and environment win over the profile file.
fn resolve_settings(cli: &Cli) -> Settings {
    let profile = profile_path().map_or_else(|| Ok(SettingsSource::default()), |path| load_profile(&path));
    Settings::resolve(cli.global.source(), profile)
}

fn run_principal(settings: &Settings, kind: PrincipalKind, command: PrincipalCommands) -> anyhow::Result<()> {
    match command {
        PrincipalCommands::Grant {
            repo,
            names,
            permission,
        } => run_principal_grant(settings, kind, &repo, &names, permission),
        PrincipalCommands::UnsetPermissions { repo, names, yes } => {
            run_principal_unset(settings, kind, &repo, &names, yes)
        }
    }
}

fn run_toggle(settings: &Settings, kind: HookKind, command: ToggleCommands) -> anyhow::Result<()> {
    match command {
        ToggleCommands::Enable { repo } => run_hook_enable(settings, kind, &repo),
        ToggleCommands::Disable { repo } => run_hook_disable(settings, kind, &repo),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "bitadmin=info" } else { "bitadmin=warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let settings = resolve_settings(&cli);

    match cli.command {
        Commands::Cache { command } => match command {
            CacheCommands::Warmup => run_cache_warmup(&settings)?,
            CacheCommands::Clear { yes } => run_cache_clear(&settings, yes)?,
            CacheCommands::Dump { json } => run_cache_dump(&settings, json)?,
        },
        Commands::Repository { command } => match command {
            RepositoryCommands::Create {
                project,
                name,
                scm,
                forkable,
            } => run_repository_create(&settings, &project, &name, &scm, forkable)?,
            RepositoryCommands::Move {
                repo,
                target_project,
                target_name,
            } => run_repository_move(&settings, &repo, target_project.as_deref(), target_name.as_deref())?,
            RepositoryCommands::ShowPermissions { repo, json } => {
                run_repository_show_permissions(&settings, &repo, json)?;
            }
            RepositoryCommands::CloneSettings {
                source_repository,
                target_repository,
                user_permissions,
                group_permissions,
                branch_restrictions,
            } => {
                let options = CloneOptions {
                    user_permissions,
                    group_permissions,
                    branch_restrictions,
                };
                run_repository_clone_settings(&settings, &source_repository, &target_repository, options)?;
            }
            RepositoryCommands::SetBranchRestriction {
                repo,
                restriction,
                branch_ref,
                usernames,
                groups,
                update,
            } => run_repository_set_branch_restriction(
                &settings,
                &repo,
                restriction,
                &branch_ref,
                &usernames,
                &groups,
                update,
            )?,
            RepositoryCommands::SetDefaultReviewers {
                repo,
                branch_ref,
                usernames,
                required_approvers,
                replace,
            } => run_repository_set_default_reviewers(
                &settings,
                &repo,
                &branch_ref,
                &usernames,
                required_approvers,
                replace,
            )?,
            RepositoryCommands::SetPrSettings {
                repo,
                required_approvers,
                required_successful_builds,
                required_all_approvers,
                required_all_tasks_complete,
                unapprove_on_update,
            } => {
                let update = PullRequestUpdate {
                    required_approvers,
                    required_successful_builds,
                    required_all_approvers,
                    required_all_tasks_complete,
                    unapprove_on_update,
                };
                run_repository_set_pr_settings(&settings, &repo, &update)?;
            }
            RepositoryCommands::SetBranchingModel {
                repo,
                enable_bugfix,
                enable_feature,
                enable_hotfix,
                enable_release,
                prefix_bugfix,
                prefix_feature,
                prefix_hotfix,
                prefix_release,
                production_ref,
                development_ref,
            } => {
                let update = BranchingModelUpdate {
                    development_ref,
                    production_ref,
                    bugfix: BranchTypeUpdate {
                        enabled: enable_bugfix,
                        prefix: prefix_bugfix,
                    },
                    feature: BranchTypeUpdate {
                        enabled: enable_feature,
                        prefix: prefix_feature,
                    },
                    hotfix: BranchTypeUpdate {
                        enabled: enable_hotfix,
                        prefix: prefix_hotfix,
                    },
                    release: BranchTypeUpdate {
                        enabled: enable_release,
                        prefix: prefix_release,
                    },
                };
                run_repository_set_branching_model(&settings, &repo, &update)?;
            }
            RepositoryCommands::Sonar {
                repo,
                enabled,
                master_project_key,
                project_base_key,
                analysis_mode,
                use_sonar_branch_feature,
                show_issues_in_source,
                show_only_new_or_changed_lines,
                illegal_branch_char_replacement,
                project_cleanup_enabled,
            } => {
                let update = SonarUpdate {
                    enabled,
                    master_project_key,
                    project_base_key,
                    analysis_mode,
                    use_branch_feature: use_sonar_branch_feature,
                    show_issues_in_source,
                    show_only_new_or_changed_lines,
                    illegal_branch_char_replacement,
                    project_cleanup_enabled,
                };
                run_repository_sonar(&settings, &repo, &update)?;
            }
        },
        Commands::User { command } => run_principal(&settings, PrincipalKind::User, command)?,
        Commands::Group { command } => run_principal(&settings, PrincipalKind::Group, command)?,
        Commands::Hooks { command } => match command {
            HookCommands::List { repo } => run_hooks_list(&settings, &repo)?,
            HookCommands::YetAnotherCommitChecker { command } => match command {
                YaccCommands::Enable { repo, settings: yacc } => run_yacc_enable(&settings, &repo, &yacc)?,
                YaccCommands::Disable { repo } => run_hook_disable(&settings, HookKind::Yacc, &repo)?,
                YaccCommands::GetSettings { repo } => run_yacc_get_settings(&settings, &repo)?,
                YaccCommands::DiffSettings { repo, settings: yacc } => {
                    run_yacc_diff_settings(&settings, &repo, &yacc)?;
                }
            },
            HookCommands::StashCheckEol { command } => match command {
                EolCommands::Enable { repo, settings: eol } => run_eol_enable(&settings, &repo, &eol)?,
                EolCommands::Disable { repo } => run_hook_disable(&settings, HookKind::Eol, &repo)?,
            },
            HookCommands::ProtectUnmergedBranch { command } => {
                run_toggle(&settings, HookKind::ProtectUnmergedBranch, command)?;
            }
            HookCommands::RejectForcePush { command } => {
                run_toggle(&settings, HookKind::RejectForcePush, command)?;
            }
        },
        Commands::Complete { flag } => run_complete(&settings, &flag)?,
        Commands::Completions { shell } => run_completions(shell)?,
    }

    Ok(())
}
