use anyhow::Result;
use std::io::Write;

use crate::session::Session;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line
/// tools.
pub type ExitCode = i32;

/// Object-safe trait for a command executed inside the shell process.
///
/// Built-ins implement this via a blanket impl; external programs never go
/// through it, they are forked and exec'd instead.
pub trait ExecutableCommand {
    /// Executes the command against the session state.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, session: &mut Session)
    -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`; the
/// interpreter then falls back to launching an external program.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and
    /// arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
