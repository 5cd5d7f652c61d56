//! Per-session shell state.

use std::fmt;

use crate::jobs::JobTable;

/// Exit disposition of a child process, as observed by `waitpid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The process exited normally with the given code.
    Exited(i32),
    /// The process was terminated by the given signal number.
    Signaled(i32),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Exited(code) => write!(f, "exit value {}", code),
            Status::Signaled(sig) => write!(f, "terminated by signal {}", sig),
        }
    }
}

/// Mutable state owned by the interpreter for the lifetime of the shell.
///
/// Note: fields are public for simplicity to keep the crate small.
pub struct Session {
    /// Disposition of the most recent foreground command; read by `status`.
    pub last_status: Status,
    /// Background children not yet confirmed terminated.
    pub jobs: JobTable,
    /// When set to true, indicates that the interactive loop should exit.
    pub should_exit: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            last_status: Status::Exited(0),
            jobs: JobTable::new(),
            should_exit: false,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_formatting() {
        assert_eq!(Status::Exited(0).to_string(), "exit value 0");
        assert_eq!(Status::Exited(1).to_string(), "exit value 1");
        assert_eq!(Status::Signaled(15).to_string(), "terminated by signal 15");
    }

    #[test]
    fn fresh_session_reports_exit_value_zero() {
        let session = Session::new();
        assert_eq!(session.last_status, Status::Exited(0));
        assert!(!session.should_exit);
        assert!(session.jobs.is_empty());
    }
}
