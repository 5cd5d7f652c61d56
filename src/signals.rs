//! Signal dispositions and the foreground-only mode flag.
//!
//! The shell ignores SIGINT for its own lifetime; only foreground children
//! restore the default disposition before exec. SIGTSTP toggles
//! foreground-only mode. The handler itself does no formatted output: it
//! only flips an atomic flag and records that a toggle happened, and the
//! main loop drains the corresponding notices at a safe point between
//! commands.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use nix::libc::c_int;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);
static PENDING_TOGGLES: AtomicUsize = AtomicUsize::new(0);

const ENTERING_NOTICE: &str = "Entering foreground-only mode (& is now ignored)";
const EXITING_NOTICE: &str = "Exiting foreground-only mode";

extern "C" fn handle_sigtstp(_: c_int) {
    record_toggle();
}

fn record_toggle() {
    FOREGROUND_ONLY.fetch_xor(true, Ordering::SeqCst);
    PENDING_TOGGLES.fetch_add(1, Ordering::SeqCst);
}

/// Install the shell-process signal dispositions: SIGINT ignored, SIGTSTP
/// toggling foreground-only mode. Both restart interrupted reads.
pub fn install() -> nix::Result<()> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::SA_RESTART, SigSet::all());
    unsafe { signal::sigaction(Signal::SIGINT, &ignore)? };

    let toggle = SigAction::new(
        SigHandler::Handler(handle_sigtstp),
        SaFlags::SA_RESTART,
        SigSet::all(),
    );
    unsafe { signal::sigaction(Signal::SIGTSTP, &toggle)? };
    Ok(())
}

/// Whether foreground-only mode is currently on. Read synchronously by the
/// parser when it strips a trailing `&`.
pub fn foreground_only() -> bool {
    FOREGROUND_ONLY.load(Ordering::SeqCst)
}

/// Take the notices for every toggle delivered since the last drain, in
/// delivery order, one notice per toggle.
///
/// The sequence is reconstructed from the toggle count and the current
/// mode: the last toggle landed on the current mode, and each earlier one
/// alternates back from there.
pub fn drain_mode_notices() -> Vec<&'static str> {
    let toggles = PENDING_TOGGLES.swap(0, Ordering::SeqCst);
    if toggles == 0 {
        return Vec::new();
    }

    let mut notices = vec![""; toggles];
    let mut mode = FOREGROUND_ONLY.load(Ordering::SeqCst);
    for slot in notices.iter_mut().rev() {
        *slot = if mode { ENTERING_NOTICE } else { EXITING_NOTICE };
        mode = !mode;
    }
    notices
}
