//! Seam around the external embeddable player. The real implementation
//! lives in the embedding shell (an iframe player driven over a JS bridge);
//! this crate only ever talks to it through these traits and treats every
//! call as fallible, because the handle may be mid-instantiation or already
//! destroyed when a timer fires.

use crossbeam_channel::Sender;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    /// The underlying player library has not finished loading; instantiation
    /// should be retried shortly.
    #[error("player library not loaded yet")]
    NotLoaded,

    #[error("stale player handle: {0}")]
    Stale(String),

    #[error("player call failed: {0}")]
    Call(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Ready { duration_secs: f64 },
    StatusChange(PlayerStatus),
    Failed { code: i32 },
}

pub trait PlayerHandle: Send {
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self) -> Result<(), PlayerError>;
    fn seek_to(&mut self, seconds: f64) -> Result<(), PlayerError>;
    fn position_secs(&self) -> Result<f64, PlayerError>;
    fn duration_secs(&self) -> Result<f64, PlayerError>;
    fn status(&self) -> Result<PlayerStatus, PlayerError>;
    fn set_volume(&mut self, percent: u8) -> Result<(), PlayerError>;
    fn destroy(&mut self);
}

pub trait PlayerBackend: Send + Sync {
    /// Instantiate a player bound to `video_id`, delivering its callbacks on
    /// `events`. `Err(PlayerError::NotLoaded)` is the polling-wait signal,
    /// not a hard failure.
    fn create(
        &self,
        video_id: &str,
        events: Sender<PlayerEvent>,
    ) -> Result<Box<dyn PlayerHandle>, PlayerError>;
}

/// Wrapper that downgrades every handle error to a logged no-op. A failed
/// read reports zero position/duration and an unknown status; the session
/// treats all of these as transient.
pub struct GuardedPlayer {
    inner: Box<dyn PlayerHandle>,
}

impl GuardedPlayer {
    pub fn new(inner: Box<dyn PlayerHandle>) -> Self {
        Self { inner }
    }

    pub fn play(&mut self) {
        if let Err(e) = self.inner.play() {
            log::debug!("[Player] play ignored: {}", e);
        }
    }

    pub fn pause(&mut self) {
        if let Err(e) = self.inner.pause() {
            log::debug!("[Player] pause ignored: {}", e);
        }
    }

    pub fn seek_to(&mut self, seconds: f64) {
        if let Err(e) = self.inner.seek_to(seconds) {
            log::debug!("[Player] seek ignored: {}", e);
        }
    }

    pub fn set_volume(&mut self, percent: u8) {
        if let Err(e) = self.inner.set_volume(percent) {
            log::debug!("[Player] set_volume ignored: {}", e);
        }
    }

    pub fn position_secs(&self) -> f64 {
        self.inner.position_secs().unwrap_or(0.0)
    }

    pub fn duration_secs(&self) -> f64 {
        self.inner.duration_secs().unwrap_or(0.0)
    }

    /// `None` when the handle cannot be inspected; callers leave state as-is.
    pub fn status(&self) -> Option<PlayerStatus> {
        self.inner.status().ok()
    }
}

impl Drop for GuardedPlayer {
    fn drop(&mut self) {
        self.inner.destroy();
    }
}
