//! Visibility/Lifecycle Coordinator
//!
//! Maps the embedder's page-lifecycle signals (hidden, visible, blur,
//! focus, pageshow-restore, before-unload) onto session and persistence
//! actions. While hidden it runs a 2 s watchdog that force-resumes a
//! stalled player and recovers missed end-of-track events.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::keepalive::PersistenceEngine;
use crate::session::PlaybackSession;
use crate::watchdog::Watchdog;

const HIDDEN_WATCHDOG_INTERVAL: Duration = Duration::from_secs(2);

pub struct VisibilityCoordinator {
    session: Arc<PlaybackSession>,
    engine: PersistenceEngine,
    hidden_watchdog: Mutex<Option<Watchdog>>,
}

impl VisibilityCoordinator {
    pub fn new(session: Arc<PlaybackSession>, engine: PersistenceEngine) -> Self {
        Self {
            session,
            engine,
            hidden_watchdog: Mutex::new(None),
        }
    }

    /// Page moved to the background.
    pub fn on_hidden(&self) {
        log::debug!("[Lifecycle] page hidden");
        if self.session.is_playing() {
            self.session.save_position();
        }
        self.engine.on_visibility_change(true);
        self.start_hidden_watchdog();
    }

    /// Page returned to the foreground.
    pub fn on_visible(&self) {
        log::debug!("[Lifecycle] page visible");
        self.stop_hidden_watchdog();
        self.engine.on_visibility_change(false);
        self.session.foreground_restore();
    }

    /// Window lost focus. On some platforms this fires before the page is
    /// reported hidden, and playback is already being throttled; the engine
    /// is armed regardless of whether anything is playing yet.
    pub fn on_blur(&self) {
        log::debug!("[Lifecycle] window blurred");
        self.session.force_play();
        self.engine.activate();
    }

    pub fn on_focus(&self) {
        log::debug!("[Lifecycle] window focused");
        self.on_visible();
    }

    /// Restore from the navigation cache behaves like a foreground return.
    pub fn on_pageshow_restore(&self) {
        log::debug!("[Lifecycle] restored from navigation cache");
        self.on_visible();
    }

    /// Whether the embedder should ask the user to confirm leaving.
    pub fn on_before_unload(&self) -> bool {
        self.session.is_playing()
    }

    pub fn hidden_watchdog_running(&self) -> bool {
        self.hidden_watchdog
            .lock()
            .as_ref()
            .is_some_and(Watchdog::is_running)
    }

    fn start_hidden_watchdog(&self) {
        let mut slot = self.hidden_watchdog.lock();
        if slot.as_ref().is_some_and(Watchdog::is_running) {
            return;
        }
        let session = self.session.clone();
        *slot = Some(Watchdog::spawn(
            "hidden-check",
            HIDDEN_WATCHDOG_INTERVAL,
            move || session.background_tick(),
        ));
    }

    fn stop_hidden_watchdog(&self) {
        if let Some(mut watchdog) = self.hidden_watchdog.lock().take() {
            watchdog.stop();
        }
    }
}

impl Drop for VisibilityCoordinator {
    fn drop(&mut self) {
        self.stop_hidden_watchdog();
    }
}
