//! Signal flags for burrow.
//!
//! The handlers installed by [SignalFlags::register] only store to atomics. The event
//! loop polls them through [crate::app::Session::tick] and shuts down on its own thread.
//!
//! SIGINT is kept apart from SIGTERM/SIGHUP: a Ctrl-C typed into a foreground child
//! reaches burrow as well, and is dropped again by an [InterruptShield].

use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::flag;

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct SignalFlags {
    terminate: Arc<AtomicBool>,
    interrupt: Arc<AtomicBool>,
}

impl SignalFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the handlers for SIGINT, SIGTERM and SIGHUP.
    pub fn register(&self) -> io::Result<()> {
        flag::register(SIGINT, Arc::clone(&self.interrupt))?;
        for sig in [SIGTERM, SIGHUP] {
            flag::register(sig, Arc::clone(&self.terminate))?;
        }
        Ok(())
    }

    /// Whether any of the signals arrived.
    pub fn raised(&self) -> bool {
        self.terminate.load(Ordering::Relaxed) || self.interrupt.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn terminate_flag(&self) -> &Arc<AtomicBool> {
        &self.terminate
    }

    #[inline]
    pub fn interrupt_flag(&self) -> &Arc<AtomicBool> {
        &self.interrupt
    }

    /// Held while a child owns the terminal. SIGINT received in the meantime is
    /// forgotten when the shield drops; SIGTERM and SIGHUP are not touched.
    pub fn shield_interrupt(&self) -> InterruptShield {
        InterruptShield {
            flag: Arc::clone(&self.interrupt),
            was_set: self.interrupt.load(Ordering::Relaxed),
        }
    }
}

pub struct InterruptShield {
    flag: Arc<AtomicBool>,
    was_set: bool,
}

impl Drop for InterruptShield {
    fn drop(&mut self) {
        if !self.was_set {
            self.flag.store(false, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_hook::low_level::raise;

    // The only test in this crate that raises real signals.
    #[test]
    fn interrupt_during_child_is_dropped_but_termination_is_not() -> io::Result<()> {
        let signals = SignalFlags::new();
        signals.register()?;

        {
            let _shield = signals.shield_interrupt();
            raise(SIGINT)?;
            assert!(signals.interrupt_flag().load(Ordering::Relaxed));
        }
        assert!(!signals.raised());

        {
            let _shield = signals.shield_interrupt();
            raise(SIGTERM)?;
        }
        assert!(signals.raised());
        assert!(signals.terminate_flag().load(Ordering::Relaxed));
        Ok(())
    }

    #[test]
    fn interrupt_seen_before_the_child_stays_set() {
        let signals = SignalFlags::new();
        signals.interrupt_flag().store(true, Ordering::Relaxed);
        drop(signals.shield_interrupt());
        assert!(signals.raised());
    }
}
