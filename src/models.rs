use serde::{Deserialize, Serialize};

/// A playable unit of audio-as-video content. Immutable once fetched from
/// the catalog; the `id` is the platform's opaque video identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(rename = "thumb")]
    pub thumb_url: String,
    /// Pre-formatted popularity string ("1.2M"); set on trending results only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        thumb_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            thumb_url: thumb_url.into(),
            views: None,
        }
    }
}

/// Point-in-time view of the playback session, safe to read from any thread.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaybackSnapshot {
    pub current: Option<Track>,
    pub is_playing: bool,
    pub progress_secs: f64,
    pub duration_secs: f64,
    pub saved_position_secs: f64,
}

/// Observable state of the background persistence engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistenceState {
    pub engine_active: bool,
    pub wake_lock_held: bool,
    pub watchdog_running: bool,
}
