use std::io::IsTerminal;

/// Asks before a destructive operation. `--yes` skips the prompt; without a
/// terminal to ask on, `--yes` is required.
pub fn confirm_action(message: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if !std::io::stdin().is_terminal() {
        anyhow::bail!("--yes is required for destructive operations when not running interactively");
    } else {
        Ok(inquire::Confirm::new(message).with_default(false).prompt()?)
    }
}
