//! Tracking and reaping of background children.

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::session::Status;

/// Upper bound on simultaneously tracked background children. A child
/// spawned while the table is full still runs, it just isn't tracked and
/// its completion is never reported.
pub const MAX_JOBS: usize = 100;

/// A background child whose termination has been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    pub pid: Pid,
    pub status: Status,
}

/// A bounded, ordered list of background child pids.
///
/// Invariant: every tracked pid is a child of the shell that has not yet
/// been confirmed terminated; a pid leaves the table exactly once, through
/// [`JobTable::reap`] or [`JobTable::kill_all`].
pub struct JobTable {
    pids: Vec<Pid>,
}

impl JobTable {
    pub fn new() -> Self {
        Self { pids: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// Start tracking a background child. Returns false when the table is
    /// full or the pid is already tracked; the caller treats that as a soft
    /// degradation, not an error.
    pub fn push(&mut self, pid: Pid) -> bool {
        if self.pids.len() >= MAX_JOBS || self.pids.contains(&pid) {
            return false;
        }
        self.pids.push(pid);
        true
    }

    /// Poll every tracked pid without blocking and remove those that have
    /// terminated, preserving the relative order of the rest.
    ///
    /// Each confirmed termination is returned exactly once. A pid that was
    /// somehow already reaped elsewhere (`ECHILD`) is dropped silently.
    pub fn reap(&mut self) -> Vec<JobReport> {
        let mut done = Vec::new();
        self.pids
            .retain(|&pid| match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(pid, code)) => {
                    done.push(JobReport {
                        pid,
                        status: Status::Exited(code),
                    });
                    false
                }
                Ok(WaitStatus::Signaled(pid, sig, _)) => {
                    done.push(JobReport {
                        pid,
                        status: Status::Signaled(sig as i32),
                    });
                    false
                }
                Ok(_) => true,
                Err(Errno::ECHILD) => false,
                Err(_) => true,
            });
        done
    }

    /// Send SIGTERM to every tracked child and stop tracking them, without
    /// waiting for them to die. Used on shell exit.
    pub fn kill_all(&mut self) {
        for pid in self.pids.drain(..) {
            let _ = signal::kill(pid, Signal::SIGTERM);
        }
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn push_rejects_duplicates_and_overflow() {
        let mut table = JobTable::new();
        for raw in 1..=MAX_JOBS as i32 {
            assert!(table.push(Pid::from_raw(raw)));
        }
        assert_eq!(table.len(), MAX_JOBS);
        // Duplicate.
        assert!(!table.push(Pid::from_raw(1)));
        // Full.
        assert!(!table.push(Pid::from_raw(MAX_JOBS as i32 + 1)));
        assert_eq!(table.len(), MAX_JOBS);
    }

    #[test]
    fn reap_reports_a_terminated_child_exactly_once() {
        let child = Command::new("true")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .expect("spawn true");
        let pid = Pid::from_raw(child.id() as i32);

        let mut table = JobTable::new();
        assert!(table.push(pid));

        let mut reports = Vec::new();
        for _ in 0..50 {
            reports.extend(table.reap());
            if !reports.is_empty() {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].pid, pid);
        assert_eq!(reports[0].status, Status::Exited(0));
        assert!(table.is_empty());
        // Already reaped, nothing more to report.
        assert!(table.reap().is_empty());
    }

    #[test]
    fn reap_leaves_running_children_in_order() {
        let mut children: Vec<_> = (0..3)
            .map(|_| {
                Command::new("sleep")
                    .arg("30")
                    .stdin(Stdio::null())
                    .spawn()
                    .expect("spawn sleep")
            })
            .collect();
        let pids: Vec<Pid> = children
            .iter()
            .map(|c| Pid::from_raw(c.id() as i32))
            .collect();

        let mut table = JobTable::new();
        for &pid in &pids {
            assert!(table.push(pid));
        }

        assert!(table.reap().is_empty());
        assert_eq!(table.len(), 3);

        table.kill_all();
        assert!(table.is_empty());
        for child in &mut children {
            let status = child.wait().expect("wait");
            assert!(!status.success());
        }
    }
}
