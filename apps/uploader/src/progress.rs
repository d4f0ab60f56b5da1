//! Cosmetic progress. The value is presentation-only: it rises on a timer while
//! a parse is in flight and says nothing about how far the parse actually got.

use std::time::Duration;

use tokio::sync::watch;

pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
pub const STEP: u8 = 10;
/// The ticker never passes this until the parse resolves.
pub const CAP: u8 = 90;
pub const DONE: u8 = 100;

/// Next displayed value after one tick.
pub fn advance(current: u8) -> u8 {
    if current >= CAP {
        current
    } else {
        current.saturating_add(STEP).min(CAP)
    }
}

/// Publishes progress on a watch channel for whatever front end renders it.
pub struct ProgressTicker {
    tx: watch::Sender<u8>,
}

impl ProgressTicker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    pub fn reset(&self) {
        self.tx.send_replace(0);
    }

    pub fn tick(&self) {
        self.tx.send_modify(|p| *p = advance(*p));
    }

    pub fn complete(&self) {
        self.tx.send_replace(DONE);
    }
}

impl Default for ProgressTicker {
    fn default() -> Self {
        Self::new()
    }
}
