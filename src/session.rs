//! Playback Session
//!
//! Single owner of the live external player handle. All mutation funnels
//! through one controller thread that multiplexes commands, player events,
//! and time on a short heartbeat; the handle is always torn down and
//! replaced on track change, never mutated in place, so no timer can ever
//! touch a previous incarnation. Events from a destroyed handle land in a
//! dropped channel and vanish.

use crossbeam_channel::{never, unbounded, Receiver, Sender};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::keepalive::PersistenceEngine;
use crate::library::Library;
use crate::media_session::MediaSessionManager;
use crate::models::{PlaybackSnapshot, Track};
use crate::player::{GuardedPlayer, PlayerBackend, PlayerError, PlayerEvent, PlayerStatus};
use crate::queue::{self, PrevAction};

const HEARTBEAT: Duration = Duration::from_millis(200);
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_secs(1);
const CREATE_RETRY_DELAY: Duration = Duration::from_millis(300);
const ENDED_DEBOUNCE: Duration = Duration::from_millis(300);
const ERROR_SKIP_DELAY: Duration = Duration::from_millis(500);
/// Foreground restore seeks back to the saved position only past this drift.
const RESTORE_DRIFT_SECS: f64 = 3.0;
const FULL_VOLUME: u8 = 100;

#[derive(Debug)]
enum Command {
    Load(Track),
    TogglePlayPause,
    Play,
    Pause,
    SeekFraction(f64),
    SeekTo(f64),
    SeekBy(f64),
    Next,
    Previous,
    Stop,
    /// Snapshot the live position into the saved position.
    SavePosition,
    /// Defensive resume on early backgrounding signals (window blur).
    ForcePlay,
    /// One pass of the coordinator's hidden-watchdog.
    BackgroundTick,
    /// Foreground return: drift-check against the saved position, resume.
    ForegroundRestore,
    Shutdown,
}

/// Lock-free snapshot state, readable from any thread. Positions are f64
/// bit patterns in atomics.
#[derive(Default)]
pub(crate) struct SharedState {
    current: RwLock<Option<Track>>,
    is_playing: AtomicBool,
    progress_bits: AtomicU64,
    duration_bits: AtomicU64,
    saved_position_bits: AtomicU64,
}

impl SharedState {
    fn load_f64(cell: &AtomicU64) -> f64 {
        f64::from_bits(cell.load(Ordering::Relaxed))
    }

    fn store_f64(cell: &AtomicU64, value: f64) {
        cell.store(value.to_bits(), Ordering::Relaxed);
    }

    fn progress_secs(&self) -> f64 {
        Self::load_f64(&self.progress_bits)
    }

    fn duration_secs(&self) -> f64 {
        Self::load_f64(&self.duration_bits)
    }

    fn saved_position_secs(&self) -> f64 {
        Self::load_f64(&self.saved_position_bits)
    }
}

pub struct PlaybackSession {
    shared: Arc<SharedState>,
    queue: Arc<RwLock<Vec<Track>>>,
    cmd_tx: Sender<Command>,
}

impl PlaybackSession {
    pub fn new(
        backend: Arc<dyn PlayerBackend>,
        library: Arc<Library>,
        media: Arc<MediaSessionManager>,
        engine: PersistenceEngine,
    ) -> Self {
        let shared = Arc::new(SharedState::default());
        let queue = Arc::new(RwLock::new(Vec::new()));
        let (cmd_tx, cmd_rx) = unbounded();

        let mut controller = Controller {
            backend,
            library,
            media,
            engine,
            shared: shared.clone(),
            queue: queue.clone(),
            cmd_rx,
            player_tx: None,
            player_rx: never(),
            player: None,
            pending_create: None,
            advance_due: None,
            error_skip_due: None,
            consecutive_error_skips: 0,
            last_poll: Instant::now(),
        };
        thread::spawn(move || controller.run());

        Self {
            shared,
            queue,
            cmd_tx,
        }
    }

    /// Full replace; the pointer is re-derived by id on the next navigation.
    pub fn set_queue(&self, tracks: Vec<Track>) {
        *self.queue.write() = tracks;
    }

    pub fn queue(&self) -> Vec<Track> {
        self.queue.read().clone()
    }

    pub fn load(&self, track: Track) {
        let _ = self.cmd_tx.send(Command::Load(track));
    }

    pub fn toggle_play_pause(&self) {
        let _ = self.cmd_tx.send(Command::TogglePlayPause);
    }

    pub fn play(&self) {
        let _ = self.cmd_tx.send(Command::Play);
    }

    pub fn pause(&self) {
        let _ = self.cmd_tx.send(Command::Pause);
    }

    /// Seek to a `[0,1]` fraction of the duration; no-op while the duration
    /// is still unknown.
    pub fn seek(&self, fraction: f64) {
        let _ = self.cmd_tx.send(Command::SeekFraction(fraction));
    }

    pub fn seek_to(&self, seconds: f64) {
        let _ = self.cmd_tx.send(Command::SeekTo(seconds));
    }

    pub fn seek_by(&self, delta_secs: f64) {
        let _ = self.cmd_tx.send(Command::SeekBy(delta_secs));
    }

    pub fn next(&self) {
        let _ = self.cmd_tx.send(Command::Next);
    }

    pub fn previous(&self) {
        let _ = self.cmd_tx.send(Command::Previous);
    }

    pub fn stop(&self) {
        let _ = self.cmd_tx.send(Command::Stop);
    }

    pub(crate) fn save_position(&self) {
        let _ = self.cmd_tx.send(Command::SavePosition);
    }

    pub(crate) fn force_play(&self) {
        let _ = self.cmd_tx.send(Command::ForcePlay);
    }

    pub(crate) fn background_tick(&self) {
        let _ = self.cmd_tx.send(Command::BackgroundTick);
    }

    pub(crate) fn foreground_restore(&self) {
        let _ = self.cmd_tx.send(Command::ForegroundRestore);
    }

    pub fn current_track(&self) -> Option<Track> {
        self.shared.current.read().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.shared.is_playing.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current: self.current_track(),
            is_playing: self.is_playing(),
            progress_secs: self.shared.progress_secs(),
            duration_secs: self.shared.duration_secs(),
            saved_position_secs: self.shared.saved_position_secs(),
        }
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

struct PendingCreate {
    video_id: String,
    due: Instant,
}

struct Controller {
    backend: Arc<dyn PlayerBackend>,
    library: Arc<Library>,
    media: Arc<MediaSessionManager>,
    engine: PersistenceEngine,
    shared: Arc<SharedState>,
    queue: Arc<RwLock<Vec<Track>>>,
    cmd_rx: Receiver<Command>,
    /// Sender for the current player incarnation; replaced on every load so
    /// events from a destroyed handle go nowhere.
    player_tx: Option<Sender<PlayerEvent>>,
    player_rx: Receiver<PlayerEvent>,
    player: Option<GuardedPlayer>,
    pending_create: Option<PendingCreate>,
    advance_due: Option<Instant>,
    error_skip_due: Option<Instant>,
    consecutive_error_skips: usize,
    last_poll: Instant,
}

impl Controller {
    fn run(&mut self) {
        log::info!("[Session] controller started");
        loop {
            let cmd_rx = self.cmd_rx.clone();
            let player_rx = self.player_rx.clone();
            crossbeam_channel::select! {
                recv(cmd_rx) -> msg => match msg {
                    Ok(Command::Shutdown) | Err(_) => break,
                    Ok(cmd) => self.handle_command(cmd),
                },
                recv(player_rx) -> msg => {
                    if let Ok(event) = msg {
                        self.handle_player_event(event);
                    }
                },
                default(HEARTBEAT) => {}
            }
            self.heartbeat();
        }
        self.teardown_player();
        log::info!("[Session] controller stopped");
    }

    /// Time-driven work: the create-retry poll, the end/error delays, and
    /// the 1 s progress poll. All of it re-checks current state, so a late
    /// firing against an already-replaced track is harmless.
    fn heartbeat(&mut self) {
        let now = Instant::now();

        if self.pending_create.as_ref().is_some_and(|p| now >= p.due) {
            let video_id = self.pending_create.take().map(|p| p.video_id);
            if let Some(video_id) = video_id {
                self.try_create(video_id);
            }
        }

        if self.advance_due.is_some_and(|due| now >= due) {
            self.advance_due = None;
            self.advance_to_next();
        }

        if self.error_skip_due.is_some_and(|due| now >= due) {
            self.error_skip_due = None;
            self.error_skip();
        }

        if now.duration_since(self.last_poll) >= PROGRESS_POLL_INTERVAL {
            self.last_poll = now;
            self.poll_progress();
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Load(track) => {
                // a user-chosen track resets the give-up counter
                self.consecutive_error_skips = 0;
                self.load(track);
            }
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::Play => {
                if let Some(player) = self.player.as_mut() {
                    player.play();
                    self.set_playing(true);
                    self.engine.activate();
                }
            }
            Command::Pause => {
                if let Some(player) = self.player.as_mut() {
                    player.pause();
                    self.set_playing(false);
                }
            }
            Command::SeekFraction(fraction) => {
                let duration = self.shared.duration_secs();
                if duration > 0.0 {
                    self.seek_to(fraction.clamp(0.0, 1.0) * duration);
                }
            }
            Command::SeekTo(seconds) => self.seek_to(seconds),
            Command::SeekBy(delta) => {
                if let Some(player) = self.player.as_ref() {
                    let target = (player.position_secs() + delta).max(0.0);
                    self.seek_to(target);
                }
            }
            Command::Next => self.advance_to_next(),
            Command::Previous => self.go_previous(),
            Command::Stop => self.stop_playback(),
            Command::SavePosition => self.save_position(),
            Command::ForcePlay => {
                if self.shared.is_playing.load(Ordering::Relaxed) {
                    self.save_position();
                    if let Some(player) = self.player.as_mut() {
                        player.play();
                    }
                }
            }
            Command::BackgroundTick => self.background_tick(),
            Command::ForegroundRestore => self.foreground_restore(),
            // consumed by run(); a stray one here is a no-op, not a panic
            Command::Shutdown => {}
        }
    }

    fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ready { duration_secs } => {
                self.consecutive_error_skips = 0;
                if let Some(player) = self.player.as_mut() {
                    player.set_volume(FULL_VOLUME);
                    player.play();
                }
                if duration_secs > 0.0 {
                    SharedState::store_f64(&self.shared.duration_bits, duration_secs);
                    self.publish_metadata(duration_secs);
                }
                self.set_playing(true);
                self.last_poll = Instant::now();
            }
            PlayerEvent::StatusChange(PlayerStatus::Playing) => self.set_playing(true),
            PlayerEvent::StatusChange(PlayerStatus::Paused) => self.set_playing(false),
            PlayerEvent::StatusChange(PlayerStatus::Ended) => {
                self.advance_due = Some(Instant::now() + ENDED_DEBOUNCE);
            }
            PlayerEvent::StatusChange(_) => {}
            PlayerEvent::Failed { code } => {
                log::warn!("[Session] player reported error {}, scheduling skip", code);
                self.error_skip_due = Some(Instant::now() + ERROR_SKIP_DELAY);
            }
        }
    }

    fn load(&mut self, track: Track) {
        log::info!("[Session] loading '{}' by '{}'", track.title, track.artist);
        self.teardown_player();
        self.advance_due = None;
        self.error_skip_due = None;

        SharedState::store_f64(&self.shared.progress_bits, 0.0);
        SharedState::store_f64(&self.shared.duration_bits, 0.0);
        *self.shared.current.write() = Some(track.clone());
        self.shared.is_playing.store(true, Ordering::Relaxed);

        self.library.record_play(&track);
        self.media.set_now_playing(&track, 0.0);
        self.engine.activate();

        let (tx, rx) = unbounded();
        self.player_tx = Some(tx);
        self.player_rx = rx;
        self.try_create(track.id);
    }

    fn try_create(&mut self, video_id: String) {
        let Some(events) = self.player_tx.clone() else {
            return;
        };
        match self.backend.create(&video_id, events) {
            Ok(handle) => {
                self.player = Some(GuardedPlayer::new(handle));
            }
            Err(PlayerError::NotLoaded) => {
                log::debug!("[Session] player library not ready, retrying");
                self.pending_create = Some(PendingCreate {
                    video_id,
                    due: Instant::now() + CREATE_RETRY_DELAY,
                });
            }
            Err(e) => {
                log::warn!("[Session] player creation failed: {}", e);
                self.error_skip_due = Some(Instant::now() + ERROR_SKIP_DELAY);
            }
        }
    }

    fn toggle_play_pause(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        // an uninspectable handle leaves state exactly as it was
        match player.status() {
            Some(PlayerStatus::Playing) => {
                player.pause();
                self.set_playing(false);
            }
            Some(_) => {
                player.play();
                self.set_playing(true);
                self.engine.activate();
            }
            None => {}
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        if let Some(player) = self.player.as_mut() {
            player.seek_to(seconds);
            SharedState::store_f64(&self.shared.progress_bits, seconds);
            let playing = self.shared.is_playing.load(Ordering::Relaxed);
            self.media.set_playback(playing, Some(seconds));
        }
    }

    fn advance_to_next(&mut self) {
        let next = {
            let q = self.queue.read();
            let current = self.shared.current.read();
            current
                .as_ref()
                .and_then(|c| queue::next(&q, &c.id))
                .cloned()
        };
        match next {
            Some(track) => self.load(track),
            None => self.stop_playback(),
        }
    }

    fn go_previous(&mut self) {
        let elapsed = self
            .player
            .as_ref()
            .map(GuardedPlayer::position_secs)
            .unwrap_or_else(|| self.shared.progress_secs());

        let prev = {
            let q = self.queue.read();
            let current = self.shared.current.read();
            let Some(current) = current.as_ref() else {
                return;
            };
            match queue::previous(&q, &current.id, elapsed) {
                Some(PrevAction::Restart) => None,
                Some(PrevAction::Jump(track)) => Some(track.clone()),
                None => return,
            }
        };
        match prev {
            Some(track) => self.load(track),
            None => self.seek_to(0.0),
        }
    }

    /// Skip forward past a track the platform refuses to play. Consecutive
    /// skips are capped at one full queue pass so an entirely unplayable
    /// queue stops instead of looping.
    fn error_skip(&mut self) {
        let queue_len = self.queue.read().len();
        self.consecutive_error_skips += 1;

        if queue_len == 0 || self.consecutive_error_skips >= queue_len {
            log::warn!("[Session] giving up after {} failed tracks", self.consecutive_error_skips);
            self.stop_playback();
            return;
        }

        let next = {
            let q = self.queue.read();
            let current = self.shared.current.read();
            let idx = current.as_ref().and_then(|c| queue::index_of(&q, &c.id));
            match idx {
                // forward only: an error on the last entry does not wrap
                Some(i) if i + 1 < q.len() => Some(q[i + 1].clone()),
                _ => None,
            }
        };
        match next {
            Some(track) => self.load(track),
            None => self.stop_playback(),
        }
    }

    /// Hidden-watchdog pass: force-resume a stalled player, recover a missed
    /// end-of-track, refresh the saved position.
    fn background_tick(&mut self) {
        if !self.shared.is_playing.load(Ordering::Relaxed) {
            return;
        }
        let Some(player) = self.player.as_mut() else {
            return;
        };
        match player.status() {
            Some(PlayerStatus::Paused | PlayerStatus::Unstarted | PlayerStatus::Cued) => {
                log::debug!("[Session] background check: player stalled, forcing resume");
                player.play();
            }
            Some(PlayerStatus::Ended) => {
                log::debug!("[Session] background check: missed end-of-track, advancing");
                self.advance_to_next();
                return;
            }
            _ => {}
        }
        if let Some(player) = self.player.as_ref() {
            let pos = player.position_secs();
            if pos > 0.0 {
                SharedState::store_f64(&self.shared.saved_position_bits, pos);
            }
        }
    }

    /// Foreground return: if playback should be live but the player is not
    /// playing, seek back to the saved position when the platform silently
    /// repositioned us by more than the drift threshold, then resume.
    fn foreground_restore(&mut self) {
        if !self.shared.is_playing.load(Ordering::Relaxed) {
            return;
        }
        let Some(player) = self.player.as_mut() else {
            return;
        };
        if player.status() == Some(PlayerStatus::Playing) {
            return;
        }
        let live = player.position_secs();
        let saved = self.shared.saved_position_secs();
        if saved > 0.0 && (live - saved).abs() > RESTORE_DRIFT_SECS {
            log::info!(
                "[Session] restoring position {:.1}s (player drifted to {:.1}s)",
                saved,
                live
            );
            player.seek_to(saved);
        }
        player.play();
    }

    fn save_position(&mut self) {
        if !self.shared.is_playing.load(Ordering::Relaxed) {
            return;
        }
        if let Some(player) = self.player.as_ref() {
            let pos = player.position_secs();
            if pos > 0.0 {
                SharedState::store_f64(&self.shared.saved_position_bits, pos);
            }
        }
    }

    fn poll_progress(&mut self) {
        let Some(player) = self.player.as_ref() else {
            return;
        };
        let pos = player.position_secs();
        let duration = player.duration_secs();

        SharedState::store_f64(&self.shared.progress_bits, pos);
        SharedState::store_f64(&self.shared.saved_position_bits, pos);
        if duration > 0.0 {
            let known = self.shared.duration_secs();
            SharedState::store_f64(&self.shared.duration_bits, duration);
            if known <= 0.0 {
                self.publish_metadata(duration);
            }
            let playing = self.shared.is_playing.load(Ordering::Relaxed);
            self.media
                .set_playback(playing, Some(pos.clamp(0.0, duration)));
        }
    }

    fn stop_playback(&mut self) {
        self.teardown_player();
        self.advance_due = None;
        self.error_skip_due = None;
        self.set_playing(false);
        self.media.set_stopped();
    }

    fn teardown_player(&mut self) {
        // dropping the guard destroys the handle; swapping the receiver
        // orphans any in-flight events from it
        self.player = None;
        self.player_tx = None;
        self.player_rx = never();
        self.pending_create = None;
    }

    fn set_playing(&mut self, playing: bool) {
        self.shared.is_playing.store(playing, Ordering::Relaxed);
        let pos = self
            .player
            .as_ref()
            .map(GuardedPlayer::position_secs)
            .unwrap_or_else(|| self.shared.progress_secs());
        self.media.set_playback(playing, Some(pos));
    }

    fn publish_metadata(&self, duration_secs: f64) {
        if let Some(track) = self.shared.current.read().as_ref() {
            self.media.set_now_playing(track, duration_secs);
        }
    }
}
