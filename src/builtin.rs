use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::interpreter::Factory;
use crate::session::Session;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process. Redirection and
/// background markers on a built-in line were already stripped by the
/// parser and are deliberately ignored.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "status".
    fn name() -> &'static str;

    /// Executes the command against the session.
    ///
    /// Return value should follow shell conventions: 0 for success,
    /// non-zero for error.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        match T::execute(*self, stdout, session) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{:#}", e)?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _session: &mut Session,
    ) -> Result<ExitCode> {
        stdout.write_all(self.output.as_bytes())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Terminate every tracked background job and end the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; the original shell accepts and discards extra arguments.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        session.jobs.kill_all();
        session.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the
/// HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current
    /// directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, _session: &mut Session) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => match env::var("HOME") {
                Ok(home) => PathBuf::from(home),
                Err(_) => return Err(anyhow::anyhow!("cd: no target and HOME not set")),
            },
        };

        env::set_current_dir(&target)
            .with_context(|| format!("cd: can't chdir to {}", target.display()))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Report the exit value or terminating signal of the last foreground
/// command.
pub struct Status {
    #[argh(positional, greedy)]
    /// ignored; the original shell accepts and discards extra arguments.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Status {
    fn name() -> &'static str {
        "status"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        writeln!(stdout, "{}", session.last_status)?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Status as ExitDisposition;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    fn run<T: BuiltinCommand>(args: &[&str], session: &mut Session) -> (ExitCode, String) {
        let cmd = T::from_args(&[T::name()], args).expect("args should parse");
        let mut out = Vec::new();
        let code = Box::new(cmd).execute(&mut out, session).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn status_reports_initial_exit_value_zero() {
        let mut session = Session::new();
        let (code, out) = run::<Status>(&[], &mut session);
        assert_eq!(code, 0);
        assert_eq!(out, "exit value 0\n");
    }

    #[test]
    fn status_reports_signal_termination() {
        let mut session = Session::new();
        session.last_status = ExitDisposition::Signaled(9);
        let (_, out) = run::<Status>(&[], &mut session);
        assert_eq!(out, "terminated by signal 9\n");
    }

    #[test]
    fn exit_sets_the_should_exit_flag() {
        let mut session = Session::new();
        let (code, _) = run::<Exit>(&[], &mut session);
        assert_eq!(code, 0);
        assert!(session.should_exit);
        assert!(session.jobs.is_empty());
    }

    #[test]
    fn cd_to_nonexistent_path_reports_and_stays_put() {
        let _guard = lock_current_dir();
        let before = env::current_dir().unwrap();
        let mut session = Session::new();
        let (code, out) = run::<Cd>(&["/definitely/not/a/real/path"], &mut session);
        assert_eq!(code, 1);
        assert!(out.contains("cd: can't chdir to /definitely/not/a/real/path"));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn cd_with_no_argument_moves_to_home() {
        let _guard = lock_current_dir();
        let before = env::current_dir().unwrap();
        let home = env::var("HOME").expect("HOME set in test environment");
        let mut session = Session::new();
        let (code, _) = run::<Cd>(&[], &mut session);
        assert_eq!(code, 0);
        assert_eq!(
            env::current_dir().unwrap(),
            std::fs::canonicalize(home).unwrap()
        );
        env::set_current_dir(before).unwrap();
    }

    #[test]
    fn factory_only_matches_its_own_name() {
        let factory = Factory::<Cd>::default();
        assert!(factory.try_create("cd", &["/tmp"]).is_some());
        assert!(factory.try_create("status", &[]).is_none());
    }
}
