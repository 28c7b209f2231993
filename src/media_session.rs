use parking_lot::RwLock;
use souvlaki::{MediaControls, MediaMetadata, MediaPlayback, MediaPosition, PlatformConfig};
use std::time::Duration;

// Re-exported so the facade can wire transport events without importing souvlaki
pub use souvlaki::MediaControlEvent;
pub use souvlaki::SeekDirection;

use crate::models::Track;

const ALBUM_NAME: &str = "Auric";

struct NowPlaying {
    track: Track,
    duration_secs: f64,
}

/// System now-playing integration (MPRIS on Linux, SMTC on Windows). The
/// platform may refuse the registration; every call then degrades to a
/// no-op, same as the rest of the keep-alive surface.
pub struct MediaSessionManager {
    controls: RwLock<Option<MediaControls>>,
    now_playing: RwLock<Option<NowPlaying>>,
}

impl Default for MediaSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaSessionManager {
    #[cfg(not(target_os = "windows"))]
    pub fn new() -> Self {
        let config = PlatformConfig {
            dbus_name: "auric",
            display_name: "Auric",
            hwnd: None,
        };
        Self {
            controls: RwLock::new(MediaControls::new(config).ok()),
            now_playing: RwLock::new(None),
        }
    }

    // On Windows the controls need a window handle, supplied later.
    #[cfg(target_os = "windows")]
    pub fn new() -> Self {
        Self {
            controls: RwLock::new(None),
            now_playing: RwLock::new(None),
        }
    }

    #[cfg(target_os = "windows")]
    pub fn init_with_hwnd(&self, hwnd: *mut std::ffi::c_void) {
        let config = PlatformConfig {
            dbus_name: "auric",
            display_name: "Auric",
            hwnd: Some(hwnd),
        };
        if let Ok(controls) = MediaControls::new(config) {
            *self.controls.write() = Some(controls);
        }
    }

    pub fn attach_handler<F>(&self, handler: F)
    where
        F: Fn(MediaControlEvent) + Send + 'static,
    {
        if let Some(ref mut controls) = *self.controls.write() {
            let _ = controls.attach(handler);
        }
    }

    pub fn set_now_playing(&self, track: &Track, duration_secs: f64) {
        *self.now_playing.write() = Some(NowPlaying {
            track: track.clone(),
            duration_secs,
        });
        self.apply_metadata();
    }

    fn apply_metadata(&self) {
        if let Some(ref mut controls) = *self.controls.write() {
            let guard = self.now_playing.read();
            let Some(now) = guard.as_ref() else { return };

            let duration = if now.duration_secs > 0.0 {
                Some(Duration::from_secs_f64(now.duration_secs))
            } else {
                None
            };
            let cover_url = if now.track.thumb_url.is_empty() {
                None
            } else {
                Some(now.track.thumb_url.as_str())
            };

            let _ = controls.set_metadata(MediaMetadata {
                title: Some(&now.track.title),
                artist: Some(&now.track.artist),
                album: Some(ALBUM_NAME),
                cover_url,
                duration,
            });
        }
    }

    pub fn set_playback(&self, playing: bool, position_secs: Option<f64>) {
        if let Some(ref mut controls) = *self.controls.write() {
            let progress =
                position_secs.map(|secs| MediaPosition(Duration::from_secs_f64(secs.max(0.0))));
            let playback = if playing {
                MediaPlayback::Playing { progress }
            } else {
                MediaPlayback::Paused { progress }
            };
            let _ = controls.set_playback(playback);
        }
    }

    pub fn set_stopped(&self) {
        if let Some(ref mut controls) = *self.controls.write() {
            let _ = controls.set_playback(MediaPlayback::Stopped);
        }
    }
}
