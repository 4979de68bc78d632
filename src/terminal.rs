/// Raw terminal mode, restored on exit and on termination signals
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::style::{Print, ResetColor};

/// Holds stdin out of canonical, echoing mode until dropped.
///
/// Only `ICANON` and `ECHO` are cleared, so Ctrl-C still raises SIGINT.
/// Restoration happens once, whichever of `Drop`, [`RawMode::restore`] or
/// the signal watcher gets there first.
pub struct RawMode {
    #[cfg(unix)]
    saved: Option<libc::termios>,
    restored: Arc<AtomicBool>,
}

impl RawMode {
    /// Engages raw mode and arms restoration on SIGINT, SIGTERM and SIGHUP.
    pub fn enable() -> Self {
        let mode = Self::engage();
        mode.restore_on_signal();
        mode
    }

    // No-op when stdin is not a terminal.
    fn engage() -> Self {
        Self {
            #[cfg(unix)]
            saved: unix::disable_canonical_echo(),
            restored: Arc::new(AtomicBool::new(false)),
        }
    }

    #[cfg(test)]
    fn is_engaged(&self) -> bool {
        #[cfg(unix)]
        {
            self.saved.is_some() && !self.restored.load(Ordering::SeqCst)
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    pub fn restore(&self) {
        if self.restored.swap(true, Ordering::SeqCst) {
            return;
        }
        #[cfg(unix)]
        if let Some(saved) = &self.saved {
            unix::apply(saved);
        }
    }

    #[cfg(unix)]
    fn restore_on_signal(&self) {
        unix::restore_on_signal(self.saved, Arc::clone(&self.restored));
    }

    #[cfg(windows)]
    fn restore_on_signal(&self) {
        if let Err(e) = ctrlc::set_handler(|| {
            reset_colors();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    #[cfg(not(any(unix, windows)))]
    fn restore_on_signal(&self) {}
}

impl Drop for RawMode {
    fn drop(&mut self) {
        self.restore();
    }
}

// Leaves the cursor on a clean, uncolored line after an interrupted frame.
fn reset_colors() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(stdout, ResetColor, Print("\n"));
}

#[cfg(unix)]
mod unix {
    use std::io::{self, IsTerminal};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use log::{info, warn};
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    pub(super) fn disable_canonical_echo() -> Option<libc::termios> {
        if !io::stdin().is_terminal() {
            return None;
        }

        unsafe {
            let mut orig: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &mut orig) != 0 {
                warn!("tcgetattr failed: {}", io::Error::last_os_error());
                return None;
            }

            let mut raw = orig;
            raw.c_lflag &= !(libc::ICANON | libc::ECHO);
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw) != 0 {
                warn!("tcsetattr failed: {}", io::Error::last_os_error());
                return None;
            }
            Some(orig)
        }
    }

    pub(super) fn apply(saved: &libc::termios) {
        unsafe {
            let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, saved);
        }
    }

    pub(super) fn restore_on_signal(saved: Option<libc::termios>, restored: Arc<AtomicBool>) {
        let mut signals = match Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            Ok(signals) => signals,
            Err(e) => {
                warn!("could not watch termination signals: {e}");
                return;
            }
        };

        thread::spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("received signal {sig}, restoring terminal");
                if !restored.swap(true, Ordering::SeqCst) {
                    if let Some(saved) = &saved {
                        apply(saved);
                    }
                }
                super::reset_colors();
                std::process::exit(128 + sig);
            }
        });
    }
}
