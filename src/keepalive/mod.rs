mod engine;
mod traits;

pub use engine::{PersistenceEngine, Strategies, WATCHDOG_INTERVAL};
pub use traits::{SilentClip, ToneGenerator, WakeLock, WorkerChannel};
