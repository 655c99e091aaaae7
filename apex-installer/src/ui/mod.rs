//! Terminal front end: prompts, confirmation, rendering and Ctrl+C.

use std::io::IsTerminal;

pub mod cancel;
pub mod confirm;
pub mod progress;
pub mod prompt;
pub mod style;
pub mod validation;

pub fn ensure_interactive_terminal() -> anyhow::Result<()> {
    if std::io::stdin().is_terminal() && std::io::stdout().is_terminal() {
        return Ok(());
    }

    anyhow::bail!(
        "No TTY detected. The interactive installer needs a terminal.\n\
         For scripted runs pass --disk, --image or --search-defaults,\n\
         --password-stdin and --yes-i-know."
    );
}
