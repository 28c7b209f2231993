//! Favorites and listening history, each a bounded in-memory list mirrored
//! to one persisted blob. Both dedup by track id; history keeps the 50 most
//! recent plays, most recent first.

use parking_lot::RwLock;

use crate::models::Track;
use crate::store::BlobStore;

pub const HISTORY_CAP: usize = 50;

const FAVORITES_KEY: &str = "favorites";
const HISTORY_KEY: &str = "history";

pub struct Library {
    store: BlobStore,
    favorites: RwLock<Vec<Track>>,
    history: RwLock<Vec<Track>>,
}

impl Library {
    pub fn open(store: BlobStore) -> Self {
        let favorites: Vec<Track> = store.load_or_default(FAVORITES_KEY);
        let history: Vec<Track> = store.load_or_default(HISTORY_KEY);
        log::info!(
            "[Library] loaded {} favorites, {} history entries",
            favorites.len(),
            history.len()
        );
        Self {
            store,
            favorites: RwLock::new(favorites),
            history: RwLock::new(history),
        }
    }

    pub fn favorites(&self) -> Vec<Track> {
        self.favorites.read().clone()
    }

    pub fn history(&self) -> Vec<Track> {
        self.history.read().clone()
    }

    pub fn is_favorite(&self, track_id: &str) -> bool {
        self.favorites.read().iter().any(|t| t.id == track_id)
    }

    /// Present => removed, absent => prepended. Returns whether the track is
    /// a favorite afterwards.
    pub fn toggle_favorite(&self, track: &Track) -> bool {
        let now_favorite;
        {
            let mut favs = self.favorites.write();
            if favs.iter().any(|t| t.id == track.id) {
                favs.retain(|t| t.id != track.id);
                now_favorite = false;
            } else {
                favs.insert(0, track.clone());
                now_favorite = true;
            }
            self.persist(FAVORITES_KEY, &favs);
        }
        now_favorite
    }

    /// Called on every track load. Re-playing a track moves it to the front
    /// instead of duplicating it.
    pub fn record_play(&self, track: &Track) {
        let mut hist = self.history.write();
        hist.retain(|t| t.id != track.id);
        hist.insert(0, track.clone());
        hist.truncate(HISTORY_CAP);
        self.persist(HISTORY_KEY, &hist);
    }

    fn persist(&self, key: &str, list: &[Track]) {
        if let Err(e) = self.store.save(key, &list) {
            log::warn!("[Library] failed to persist '{}': {}", key, e);
        }
    }
}
