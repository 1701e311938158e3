// src/exec/interrupt.rs

//! Run-wide interrupt flag.
//!
//! `lib::run` wires Ctrl-C to an [`InterruptHandle`]; the runner checks the
//! flag between invocations and the launcher races it against the running
//! child.

use tokio::sync::watch;

/// Sending side: flips the flag once.
#[derive(Debug)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

impl InterruptHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving side, cheap to clone.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    pub fn channel() -> (InterruptHandle, Interrupt) {
        let (tx, rx) = watch::channel(false);
        (InterruptHandle { tx }, Interrupt { rx })
    }

    /// An interrupt that can never fire.
    pub fn never() -> Self {
        Self::channel().1
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves to `true` once triggered, or to `false` if the handle is
    /// dropped without triggering.
    pub async fn triggered(&mut self) -> bool {
        self.rx.wait_for(|flag| *flag).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_is_observed_after_handle_drop() {
        let (handle, mut interrupt) = Interrupt::channel();
        assert!(!interrupt.is_triggered());
        handle.trigger();
        drop(handle);
        assert!(interrupt.is_triggered());
        assert!(interrupt.triggered().await);
    }

    #[tokio::test]
    async fn never_resolves_false() {
        let mut interrupt = Interrupt::never();
        assert!(!interrupt.triggered().await);
    }
}
