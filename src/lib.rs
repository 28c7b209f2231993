//! Mobile music-player core: catalog search, a playback session wrapped
//! around an unreliable embeddable player, queue navigation, background
//! persistence, and page-lifecycle coordination. The embedder supplies a
//! `PlayerBackend` for the actual player and `Strategies` for whatever
//! keep-alive capabilities the platform offers; everything degrades to a
//! logged no-op when a capability is missing.

pub mod catalog;
pub mod errors;
pub mod keepalive;
pub mod library;
pub mod lifecycle;
pub mod media_session;
pub mod models;
pub mod player;
pub mod queue;
pub mod session;
pub mod store;
pub mod watchdog;

use std::sync::Arc;

use catalog::TrackCatalog;
use errors::AppError;
use keepalive::{PersistenceEngine, Strategies};
use library::Library;
use lifecycle::VisibilityCoordinator;
use media_session::{MediaControlEvent, MediaSessionManager, SeekDirection};
use models::{PersistenceState, PlaybackSnapshot, Track};
use player::PlayerBackend;
use session::PlaybackSession;
use store::BlobStore;

const MEDIA_SEEK_STEP_SECS: f64 = 10.0;

/// Top-level assembly. One per application; the embedding shell forwards
/// lifecycle signals to [`AuricPlayer::lifecycle`] and user actions to the
/// playback methods. Logging goes through `log`; the embedder picks the
/// backend (`env_logger` in the desktop shell).
pub struct AuricPlayer {
    catalog: Arc<dyn TrackCatalog>,
    library: Arc<Library>,
    session: Arc<PlaybackSession>,
    coordinator: VisibilityCoordinator,
    engine: PersistenceEngine,
}

impl AuricPlayer {
    pub fn new(
        backend: Arc<dyn PlayerBackend>,
        catalog: Arc<dyn TrackCatalog>,
        strategies: Strategies,
    ) -> Result<Self, AppError> {
        Self::with_store(backend, catalog, strategies, BlobStore::open_default()?)
    }

    pub fn with_store(
        backend: Arc<dyn PlayerBackend>,
        catalog: Arc<dyn TrackCatalog>,
        strategies: Strategies,
        store: BlobStore,
    ) -> Result<Self, AppError> {
        let library = Arc::new(Library::open(store));
        let media = Arc::new(MediaSessionManager::new());
        let engine = PersistenceEngine::new(strategies);
        engine.init();

        let session = Arc::new(PlaybackSession::new(
            backend,
            library.clone(),
            media.clone(),
            engine.clone(),
        ));
        let coordinator = VisibilityCoordinator::new(session.clone(), engine.clone());

        Self::wire_media_handlers(media.as_ref(), &session, &engine);

        Ok(Self {
            catalog,
            library,
            session,
            coordinator,
            engine,
        })
    }

    /// OS transport controls invoke the same session operations as in-app
    /// controls.
    fn wire_media_handlers(
        media: &MediaSessionManager,
        session: &Arc<PlaybackSession>,
        engine: &PersistenceEngine,
    ) {
        let session = session.clone();
        let engine = engine.clone();
        media.attach_handler(move |event| match event {
            MediaControlEvent::Play => {
                engine.activate();
                session.play();
            }
            MediaControlEvent::Pause => session.pause(),
            MediaControlEvent::Toggle => session.toggle_play_pause(),
            MediaControlEvent::Next => session.next(),
            MediaControlEvent::Previous => session.previous(),
            MediaControlEvent::Stop => session.stop(),
            MediaControlEvent::Seek(SeekDirection::Forward) => {
                session.seek_by(MEDIA_SEEK_STEP_SECS)
            }
            MediaControlEvent::Seek(SeekDirection::Backward) => {
                session.seek_by(-MEDIA_SEEK_STEP_SECS)
            }
            MediaControlEvent::SeekBy(SeekDirection::Forward, amount) => {
                session.seek_by(amount.as_secs_f64())
            }
            MediaControlEvent::SeekBy(SeekDirection::Backward, amount) => {
                session.seek_by(-amount.as_secs_f64())
            }
            MediaControlEvent::SetPosition(position) => {
                session.seek_to(position.0.as_secs_f64())
            }
            _ => {}
        });
    }

    /// Catalog search. Transport and decode failures surface as an empty
    /// result list here; callers render "no results" either way.
    pub async fn search(&self, query: &str) -> Vec<Track> {
        match self.catalog.search(query).await {
            Ok(tracks) => tracks,
            Err(e) => {
                log::warn!("[App] search '{}' failed: {:#}", query, e);
                Vec::new()
            }
        }
    }

    pub async fn trending(&self) -> Vec<Track> {
        match self.catalog.trending().await {
            Ok(tracks) => tracks,
            Err(e) => {
                log::warn!("[App] trending fetch failed: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Selecting the track that is already current toggles play/pause
    /// instead of reloading it.
    pub fn play_track(&self, track: Track) {
        let same = self
            .session
            .current_track()
            .is_some_and(|current| current.id == track.id);
        if same {
            self.session.toggle_play_pause();
        } else {
            self.session.load(track);
        }
    }

    pub fn set_queue(&self, tracks: Vec<Track>) {
        self.session.set_queue(tracks);
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn lifecycle(&self) -> &VisibilityCoordinator {
        &self.coordinator
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.session.snapshot()
    }

    pub fn persistence_state(&self) -> PersistenceState {
        self.engine.state()
    }

    pub fn shutdown(&self) {
        self.session.shutdown();
        self.engine.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerError, PlayerEvent, PlayerHandle, PlayerStatus};
    use crate::store::tests::temp_store;
    use async_trait::async_trait;
    use crossbeam_channel::Sender;
    use std::time::{Duration, Instant};

    struct StubHandle {
        status: PlayerStatus,
    }

    impl PlayerHandle for StubHandle {
        fn play(&mut self) -> Result<(), PlayerError> {
            self.status = PlayerStatus::Playing;
            Ok(())
        }
        fn pause(&mut self) -> Result<(), PlayerError> {
            self.status = PlayerStatus::Paused;
            Ok(())
        }
        fn seek_to(&mut self, _seconds: f64) -> Result<(), PlayerError> {
            Ok(())
        }
        fn position_secs(&self) -> Result<f64, PlayerError> {
            Ok(0.0)
        }
        fn duration_secs(&self) -> Result<f64, PlayerError> {
            Ok(0.0)
        }
        fn status(&self) -> Result<PlayerStatus, PlayerError> {
            Ok(self.status)
        }
        fn set_volume(&mut self, _percent: u8) -> Result<(), PlayerError> {
            Ok(())
        }
        fn destroy(&mut self) {}
    }

    struct StubBackend;

    impl PlayerBackend for StubBackend {
        fn create(
            &self,
            _video_id: &str,
            events: Sender<PlayerEvent>,
        ) -> Result<Box<dyn PlayerHandle>, PlayerError> {
            let _ = events.send(PlayerEvent::Ready {
                duration_secs: 120.0,
            });
            Ok(Box::new(StubHandle {
                status: PlayerStatus::Unstarted,
            }))
        }
    }

    struct StubCatalog {
        fail: bool,
    }

    #[async_trait]
    impl TrackCatalog for StubCatalog {
        fn id(&self) -> &str {
            "stub"
        }
        async fn search(&self, query: &str) -> anyhow::Result<Vec<Track>> {
            if self.fail {
                anyhow::bail!("network down");
            }
            Ok(vec![Track::new("s1", query, "Artist", "")])
        }
        async fn trending(&self) -> anyhow::Result<Vec<Track>> {
            if self.fail {
                anyhow::bail!("network down");
            }
            Ok(vec![Track::new("t1", "Hit", "Artist", "")])
        }
    }

    fn app(fail_catalog: bool) -> AuricPlayer {
        AuricPlayer::with_store(
            Arc::new(StubBackend),
            Arc::new(StubCatalog { fail: fail_catalog }),
            Strategies::default(),
            temp_store(),
        )
        .unwrap()
    }

    fn wait_for(what: &str, cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("timed out waiting for {}", what);
    }

    #[tokio::test]
    async fn catalog_failures_surface_as_empty_lists() {
        let app = app(true);
        assert!(app.search("anything").await.is_empty());
        assert!(app.trending().await.is_empty());
    }

    #[tokio::test]
    async fn catalog_results_pass_through() {
        let app = app(false);
        let results = app.search("lofi").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "s1");
    }

    #[test]
    fn selecting_current_track_toggles_instead_of_reloading() {
        let app = app(false);
        let track = Track::new("v1", "Song", "Artist", "");

        app.play_track(track.clone());
        wait_for("playing", || app.snapshot().is_playing);

        app.play_track(track.clone());
        wait_for("toggled to paused", || !app.snapshot().is_playing);
        // still the same current track
        assert_eq!(app.snapshot().current.unwrap().id, "v1");

        app.play_track(track);
        wait_for("toggled back to playing", || app.snapshot().is_playing);
        app.shutdown();
    }

    #[test]
    fn loading_a_track_records_history_and_activates_engine() {
        let app = app(false);
        app.play_track(Track::new("v1", "Song", "Artist", ""));
        wait_for("history entry", || !app.library().history().is_empty());
        assert!(app.persistence_state().engine_active);
        app.shutdown();
    }
}
