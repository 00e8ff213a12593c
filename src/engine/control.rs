//! State shared between a running simulation and its handle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SimControl {
    canceled: AtomicBool,
    running: AtomicBool,
    sub_days_done: AtomicU64,
}

impl SimControl {
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn sub_day_done(&self) {
        self.sub_days_done.fetch_add(1, Ordering::SeqCst);
    }

    pub fn sub_days_done(&self) -> u64 {
        self.sub_days_done.load(Ordering::SeqCst)
    }
}
