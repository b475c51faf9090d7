//! Command trait definition for CLI commands.
//!
//! The trait uses `enum_dispatch` so `main` can call [`Command::execute`] on the parsed
//! subcommand enum without boxing.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Trait implemented by all bamchunk CLI commands.
///
/// `command_line` is the full invocation, captured before argument parsing.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
