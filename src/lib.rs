//! A small interactive command shell.
//!
//! This crate implements a minimal shell: it reads a line, expands every
//! `$$` into the shell's own pid, splits the line into a command with
//! optional `<`/`>` redirections and a trailing `&` background marker, and
//! then either runs a built-in (`exit`, `cd`, `status`) in-process or forks
//! a child that execs the external program. Background children are tracked
//! in a bounded job table and reaped non-blockingly before every prompt.
//!
//! SIGTSTP toggles a foreground-only mode in which the `&` marker is
//! silently ignored; SIGINT is ignored by the shell itself and only reaches
//! foreground children. The main entry point is [`Interpreter`], whose
//! [`Interpreter::repl`] runs the read-eval loop.

mod builtin;
pub mod command;
pub mod expand;
mod external;
mod interpreter;
pub mod jobs;
pub mod parser;
pub mod session;
pub mod signals;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
