use std::io;

use clap::{CommandFactory, ValueEnum};
use clap_complete::{Shell, generate};

use super::commands::Cli;

/// Shells a completion script can be generated for.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::PowerShell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Writes the completion script for `shell` to stdout.
pub fn run_completions(shell: CompletionShell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    generate(Shell::from(shell), &mut cmd, "bitadmin", &mut io::stdout());
    Ok(())
}
