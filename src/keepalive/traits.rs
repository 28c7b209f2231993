//! Platform keep-alive capabilities, one trait per suspension trigger they
//! resist. Each is independently optional and independently failable: a
//! platform lacking one capability loses that strategy and nothing else.

use anyhow::Result;

/// Looping, near-silent embedded audio clip. Keeps the platform's audio
/// session classified as "playing media" while the real player is an
/// embedded video surface the OS may not count.
pub trait SilentClip: Send + Sync {
    fn play(&self) -> Result<()>;
    fn pause(&self);
    fn is_paused(&self) -> bool;
}

/// Low-level audio synthesis context driving a near-inaudible continuous
/// tone. The context itself can be suspended by the platform and must then
/// be resumed; the tone is started once and stopped on deactivation.
pub trait ToneGenerator: Send + Sync {
    fn is_suspended(&self) -> bool;
    fn resume(&self) -> Result<()>;
    fn start(&self) -> Result<()>;
    fn stop(&self);
}

/// Screen wake-lock grant. The platform may revoke it at any time; the
/// revocation is reported through the handler registered here.
pub trait WakeLock: Send + Sync {
    fn request(&self) -> Result<()>;
    fn release(&self);
    fn set_release_handler(&self, handler: Box<dyn Fn() + Send + Sync>);
}

/// Persistent background worker registered for the app origin. Pings are
/// fire-and-forget; the ack only matters to implementations that want to
/// detect a dead worker.
pub trait WorkerChannel: Send + Sync {
    fn register(&self) -> Result<()>;
    fn ping(&self) -> Result<()>;
}
