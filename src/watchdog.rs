use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A recurring timer that re-asserts desired state on its own thread until
/// stopped. Dropping the handle stops it, so a watchdog cannot outlive the
/// component that started it.
pub struct Watchdog {
    stop: Arc<AtomicBool>,
}

impl Watchdog {
    pub fn spawn<F>(name: &'static str, interval: Duration, tick: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        thread::spawn(move || {
            log::debug!("[Watchdog] '{}' started", name);
            loop {
                thread::sleep(interval);
                if stop_flag.load(Ordering::Relaxed) {
                    break;
                }
                tick();
            }
            log::debug!("[Watchdog] '{}' stopped", name);
        });

        Self { stop }
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::Relaxed)
    }

    /// The thread exits after its current sleep; ticks stop immediately.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
