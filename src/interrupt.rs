//! Ctrl-C handling.
//!
//! An interrupt is a user cancellation, not a failure. While the session is
//! waiting at a prompt there is nothing to clean up, so the handler prints a
//! note and exits with status 0 on the spot. While an engine run is in
//! flight the handler only raises [`flag`]; the run loop sees it, kills the
//! child and returns, the stack unwinds (dropping scratch directories) and
//! the session reports the cancellation itself.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static REQUESTED: AtomicBool = AtomicBool::new(false);
static BUSY: AtomicUsize = AtomicUsize::new(0);

/// Raised once an interrupt arrives during an engine run.
pub fn flag() -> &'static AtomicBool {
    &REQUESTED
}

/// Whether an interrupt is waiting to be acted on.
pub fn requested() -> bool {
    REQUESTED.load(Ordering::SeqCst)
}

/// Marks an engine run as in flight until dropped.
pub struct Busy(());

pub fn busy() -> Busy {
    BUSY.fetch_add(1, Ordering::SeqCst);
    Busy(())
}

impl Drop for Busy {
    fn drop(&mut self) {
        BUSY.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(unix)]
pub fn install() {
    extern "C" fn on_interrupt(_signal: libc::c_int) {
        // Atomics, write(2) and _exit(2) only.
        if BUSY.load(Ordering::SeqCst) > 0 {
            REQUESTED.store(true, Ordering::SeqCst);
            return;
        }
        const MESSAGE: &[u8] = b"\nCancelled.\n";
        unsafe {
            libc::write(libc::STDOUT_FILENO, MESSAGE.as_ptr().cast(), MESSAGE.len());
            libc::_exit(0);
        }
    }

    unsafe {
        libc::signal(libc::SIGINT, on_interrupt as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
pub fn install() {}

