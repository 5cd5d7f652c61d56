use crate::command::CommandFactory;
use crate::expand;
use crate::external;
use crate::parser;
use crate::session::Session;
use crate::signals;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the built-in commands defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive shell: session state plus the set of built-in command
/// factories queried before falling back to an external program.
///
/// [`Interpreter::repl`] runs the main loop; [`Interpreter::eval`] runs a
/// single already-read line, which is what the loop and the tests share.
pub struct Interpreter {
    session: Session,
    builtins: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(builtins: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            session: Session::new(),
            builtins,
        }
    }

    /// The read-eval loop.
    ///
    /// Each iteration reaps finished background jobs, drains any pending
    /// foreground-only mode notices, prompts, and evaluates one line.
    /// Ctrl-C surfaces as `Interrupted` and is ignored, like the SIGINT it
    /// stands for; end of input behaves like `exit`.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        signals::install()?;
        let mut rl = DefaultEditor::new()?;

        while !self.session.should_exit {
            for report in self.session.jobs.reap() {
                println!("background pid {} is done: {}", report.pid, report.status);
            }
            for notice in signals::drain_mode_notices() {
                println!("{}", notice);
            }

            match rl.readline(": ") {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    self.eval(&line);
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    self.session.jobs.kill_all();
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }

    /// Expand, parse, and dispatch a single input line.
    ///
    /// Every failure is reported to the user and leaves the shell running.
    pub fn eval(&mut self, line: &str) {
        let expanded = match expand::expand_pid(line, std::process::id()) {
            Ok(expanded) => expanded,
            Err(err) => {
                eprintln!("{}", err);
                return;
            }
        };

        let command = match parser::parse(&expanded, signals::foreground_only()) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(err) => {
                eprintln!("{}", err);
                return;
            }
        };

        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        for factory in &self.builtins {
            if let Some(builtin) = factory.try_create(&command.program, &args) {
                let mut stdout = io::stdout();
                if let Err(err) = builtin.execute(&mut stdout, &mut self.session) {
                    eprintln!("{}: {:#}", command.program, err);
                }
                let _ = stdout.flush();
                return;
            }
        }

        if let Err(err) = external::launch(&command, &mut self.session) {
            eprintln!("{}: {:#}", command.program, err);
        }
    }

    /// State shared across iterations; exposed for tests.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the built-ins the shell knows:
    /// `exit`, `cd`, and `status`. Everything else is launched as an
    /// external program.
    fn default() -> Self {
        use crate::builtin::*;
        Self::new(vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Status>::default()),
        ])
    }
}
