//! Forking and exec'ing external programs.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use std::ffi::CString;

use crate::parser::Command;
use crate::session::{Session, Status};

/// Fork a child that execs `command`, then either wait for it (foreground)
/// or record it in the job table and return immediately (background).
///
/// A fork failure is reported and abandoned without touching the session;
/// nothing here is fatal to the shell. Every child-side failure (redirect
/// target missing, program not found) makes the child print its error and
/// exit 1, which the parent observes as an ordinary termination.
pub(crate) fn launch(command: &Command, session: &mut Session) -> Result<()> {
    match unsafe { unistd::fork() } {
        Err(err) => {
            eprintln!("fork: {}", err);
            Ok(())
        }
        Ok(ForkResult::Child) => {
            let err = exec_child(command);
            eprintln!("{:#}", err);
            std::process::exit(1);
        }
        Ok(ForkResult::Parent { child }) => {
            if command.background {
                println!("background pid is {}", child);
                session.jobs.push(child);
                Ok(())
            } else {
                let status = wait_foreground(child)?;
                session.last_status = status;
                if let Status::Signaled(sig) = status {
                    println!("terminated by signal {}", sig);
                }
                Ok(())
            }
        }
    }
}

/// Child-side half of [`launch`]: rebind the standard streams, restore the
/// signal dispositions appropriate for the child's role, and exec. Only
/// returns on failure.
fn exec_child(command: &Command) -> anyhow::Error {
    if let Err(err) = redirect_streams(command) {
        return err;
    }
    if let Err(err) = set_child_signals(command.background) {
        return anyhow::Error::from(err);
    }

    let argv = match build_argv(command) {
        Ok(argv) => argv,
        Err(err) => return err,
    };
    // execvp only returns on failure.
    let err = match unistd::execvp(&argv[0], &argv) {
        Ok(never) => match never {},
        Err(err) => err,
    };
    anyhow::Error::from(err).context(command.program.clone())
}

/// Rebind stdin/stdout for the about-to-exec process image. Explicit
/// redirections win; an un-redirected background command reads from and
/// writes to /dev/null so it cannot fight the shell over the terminal.
fn redirect_streams(command: &Command) -> Result<()> {
    if let Some(path) = &command.input_path {
        let fd = fcntl::open(path.as_str(), OFlag::O_RDONLY, Mode::empty())
            .with_context(|| format!("cannot open {} for input", path))?;
        rebind(fd, libc::STDIN_FILENO)?;
    } else if command.background {
        let fd = fcntl::open("/dev/null", OFlag::O_RDONLY, Mode::empty())
            .context("cannot open /dev/null for input")?;
        rebind(fd, libc::STDIN_FILENO)?;
    }

    if let Some(path) = &command.output_path {
        let fd = fcntl::open(
            path.as_str(),
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            Mode::from_bits_truncate(0o644),
        )
        .with_context(|| format!("cannot open {} for output", path))?;
        rebind(fd, libc::STDOUT_FILENO)?;
    } else if command.background {
        let fd = fcntl::open("/dev/null", OFlag::O_WRONLY, Mode::empty())
            .context("cannot open /dev/null for output")?;
        rebind(fd, libc::STDOUT_FILENO)?;
    }

    Ok(())
}

fn rebind(fd: i32, stream: i32) -> Result<()> {
    unistd::dup2(fd, stream).context("dup2")?;
    unistd::close(fd).context("close")?;
    Ok(())
}

/// A foreground child must be interruptible even though the shell ignores
/// SIGINT, so the default disposition is restored before exec. A background
/// child must not be stopped by the terminal's SIGTSTP, so it ignores it.
fn set_child_signals(background: bool) -> nix::Result<()> {
    if background {
        unsafe { signal::signal(Signal::SIGTSTP, SigHandler::SigIgn)? };
    } else {
        unsafe { signal::signal(Signal::SIGINT, SigHandler::SigDfl)? };
    }
    Ok(())
}

fn build_argv(command: &Command) -> Result<Vec<CString>> {
    let mut argv = Vec::with_capacity(command.args.len() + 1);
    argv.push(CString::new(command.program.as_str()).context("program name")?);
    for arg in &command.args {
        argv.push(CString::new(arg.as_str()).context("argument")?);
    }
    Ok(argv)
}

/// Block until the foreground child terminates, retrying across signal
/// interruptions, and translate its wait status.
fn wait_foreground(pid: Pid) -> Result<Status> {
    loop {
        match wait::waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(Status::Exited(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(Status::Signaled(sig as i32)),
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(err).context("waitpid"),
        }
    }
}
