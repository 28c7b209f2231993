//! Background Persistence Engine
//!
//! Best-effort use of every available platform mechanism to keep audio,
//! timers, and the screen alive while a track plays: silent clip, inaudible
//! tone, wake-lock, worker pings, and a self-healing watchdog that
//! re-asserts all of it every five seconds. The strategies target different
//! suspension triggers and fail independently; none of them is required.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::traits::{SilentClip, ToneGenerator, WakeLock, WorkerChannel};
use crate::models::PersistenceState;
use crate::watchdog::Watchdog;

pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(5);
const WAKE_LOCK_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The capabilities this platform actually offers. Absent ones are skipped
/// silently everywhere.
#[derive(Default)]
pub struct Strategies {
    pub clip: Option<Arc<dyn SilentClip>>,
    pub tone: Option<Arc<dyn ToneGenerator>>,
    pub wake_lock: Option<Arc<dyn WakeLock>>,
    pub worker: Option<Arc<dyn WorkerChannel>>,
}

pub struct PersistenceEngine {
    inner: Arc<Inner>,
}

struct Inner {
    clip: Option<Arc<dyn SilentClip>>,
    tone: Option<Arc<dyn ToneGenerator>>,
    wake_lock: Option<Arc<dyn WakeLock>>,
    worker: Option<Arc<dyn WorkerChannel>>,
    active: AtomicBool,
    tone_running: AtomicBool,
    wake_lock_held: AtomicBool,
    watchdog: Mutex<Option<Watchdog>>,
}

impl Clone for PersistenceEngine {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl PersistenceEngine {
    pub fn new(strategies: Strategies) -> Self {
        Self {
            inner: Arc::new(Inner {
                clip: strategies.clip,
                tone: strategies.tone,
                wake_lock: strategies.wake_lock,
                worker: strategies.worker,
                active: AtomicBool::new(false),
                tone_running: AtomicBool::new(false),
                wake_lock_held: AtomicBool::new(false),
                watchdog: Mutex::new(None),
            }),
        }
    }

    /// One-time setup: register the background worker and arm the wake-lock
    /// revocation handler. Nothing is started yet.
    pub fn init(&self) {
        if let Some(ref worker) = self.inner.worker {
            if let Err(e) = worker.register() {
                log::debug!("[KeepAlive] worker registration unavailable: {}", e);
            }
        }

        if let Some(ref lock) = self.inner.wake_lock {
            // Revocation while active gets a single delayed re-request.
            let inner = self.inner.clone();
            lock.set_release_handler(Box::new(move || {
                inner.wake_lock_held.store(false, Ordering::Relaxed);
                if !inner.active.load(Ordering::Relaxed) {
                    return;
                }
                log::debug!("[KeepAlive] wake-lock revoked, re-requesting in 1s");
                let inner = inner.clone();
                thread::spawn(move || {
                    thread::sleep(WAKE_LOCK_RETRY_DELAY);
                    if !inner.active.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Some(ref lock) = inner.wake_lock {
                        match lock.request() {
                            Ok(()) => inner.wake_lock_held.store(true, Ordering::Relaxed),
                            Err(e) => log::debug!("[KeepAlive] wake-lock re-request denied: {}", e),
                        }
                    }
                });
            }));
        }
    }

    /// Idempotent: safe to call on every play, resume, and backgrounding.
    /// Each strategy is attempted regardless of the others' outcome.
    pub fn activate(&self) {
        let first = !self.inner.active.swap(true, Ordering::Relaxed);
        if first {
            log::info!("[KeepAlive] engine active");
        }

        if let Some(ref clip) = self.inner.clip {
            if let Err(e) = clip.play() {
                log::debug!("[KeepAlive] silent clip refused to start: {}", e);
            }
        }

        if let Some(ref tone) = self.inner.tone {
            if tone.is_suspended() {
                if let Err(e) = tone.resume() {
                    log::debug!("[KeepAlive] context resume failed: {}", e);
                }
            }
            if !self.inner.tone_running.load(Ordering::Relaxed) {
                match tone.start() {
                    Ok(()) => {
                        self.inner.tone_running.store(true, Ordering::Relaxed);
                    }
                    Err(e) => log::debug!("[KeepAlive] tone refused to start: {}", e),
                }
            }
        }

        if let Some(ref lock) = self.inner.wake_lock {
            if !self.inner.wake_lock_held.load(Ordering::Relaxed) {
                match lock.request() {
                    Ok(()) => {
                        self.inner.wake_lock_held.store(true, Ordering::Relaxed);
                    }
                    Err(e) => log::debug!("[KeepAlive] wake-lock denied: {}", e),
                }
            }
        }

        self.ensure_watchdog();
    }

    /// Always callable; no effect when already idle.
    pub fn deactivate(&self) {
        if !self.inner.active.swap(false, Ordering::Relaxed) {
            return;
        }
        log::info!("[KeepAlive] engine deactivated");

        if let Some(mut dog) = self.inner.watchdog.lock().take() {
            dog.stop();
        }
        if self.inner.tone_running.swap(false, Ordering::Relaxed) {
            if let Some(ref tone) = self.inner.tone {
                tone.stop();
            }
        }
        if let Some(ref clip) = self.inner.clip {
            clip.pause();
        }
        if self.inner.wake_lock_held.swap(false, Ordering::Relaxed) {
            if let Some(ref lock) = self.inner.wake_lock {
                lock.release();
            }
        }
    }

    /// Backgrounding activates everything unconditionally; returning to the
    /// foreground only resumes a suspended synthesis context.
    pub fn on_visibility_change(&self, hidden: bool) {
        if hidden {
            self.activate();
        } else if let Some(ref tone) = self.inner.tone {
            if tone.is_suspended() {
                if let Err(e) = tone.resume() {
                    log::debug!("[KeepAlive] foreground context resume failed: {}", e);
                }
            }
        }
    }

    pub fn state(&self) -> PersistenceState {
        PersistenceState {
            engine_active: self.inner.active.load(Ordering::Relaxed),
            wake_lock_held: self.inner.wake_lock_held.load(Ordering::Relaxed),
            watchdog_running: self
                .inner
                .watchdog
                .lock()
                .as_ref()
                .is_some_and(Watchdog::is_running),
        }
    }

    fn ensure_watchdog(&self) {
        let mut slot = self.inner.watchdog.lock();
        if slot.as_ref().is_some_and(Watchdog::is_running) {
            return;
        }
        let inner = self.inner.clone();
        *slot = Some(Watchdog::spawn("keepalive", WATCHDOG_INTERVAL, move || {
            inner.tick();
        }));
    }

    #[cfg(test)]
    fn tick_now(&self) {
        self.inner.tick();
    }
}

impl Inner {
    /// Self-healing pass: re-assert the desired state, report nothing.
    fn tick(&self) {
        if let Some(ref tone) = self.tone {
            if tone.is_suspended() {
                let _ = tone.resume();
            }
        }
        if let Some(ref clip) = self.clip {
            if clip.is_paused() {
                let _ = clip.play();
            }
        }
        if let Some(ref worker) = self.worker {
            if let Err(e) = worker.ping() {
                log::debug!("[KeepAlive] worker ping failed: {}", e);
            }
        }
    }
}
