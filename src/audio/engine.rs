use std::sync::{Arc, Mutex};
use std::time::Duration;

use flume::{Receiver, Sender};
use tracing::{debug, warn};

use crate::audio::config::EngineConfig;
use crate::audio::decoder::{DecoderEvent, DecoderEvents, DecoderFactory, MediaDecoder};
use crate::audio::error::AudioError;
use crate::audio::focus::{FocusArbiter, FocusAuthority, FocusChange, FocusDirective};
use crate::audio::guard::{RouteWatch, SessionGuard, WakeLock};
use crate::audio::progress::ProgressPoller;
use crate::audio::state::PlaybackState;
use crate::event::events::PlayerEvent;
use crate::model::playlist::Playlist;
use crate::model::track::Track;

/// Everything that can wake the engine besides a direct command: decoder
/// notifications (tagged with the generation they were issued under),
/// focus changes, and route loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSignal {
    Decoder { generation: u64, event: DecoderEvent },
    Focus(FocusChange),
    RouteUnusable,
}

/// Cloneable handle the operating environment uses to feed focus and
/// route signals into the engine's dispatch channel.
#[derive(Clone)]
pub struct SignalHandle {
    tx: Sender<EngineSignal>,
}

impl SignalHandle {
    pub fn focus_changed(&self, change: FocusChange) {
        let _ = self.tx.send(EngineSignal::Focus(change));
    }

    pub fn route_unusable(&self) {
        let _ = self.tx.send(EngineSignal::RouteUnusable);
    }
}

/// The playback state machine. Owns one decoder resource at a time and
/// drives it through load, prepare, play, pause, seek, completion-driven
/// advance and error recovery, against a wrapping playlist cursor.
///
/// Commands mutate the interior under a single lock; decoder and
/// environment signals are serialized through the same lock by the
/// dispatch task, so a command racing an in-flight callback resolves in
/// whichever order the lock grants, never interleaved. Subscribers see
/// every state in transition order.
pub struct AudioEngine {
    inner: Arc<Mutex<Inner>>,
    signal_tx: Sender<EngineSignal>,
}

struct Inner {
    factory: Box<dyn DecoderFactory>,
    decoder: Option<Box<dyn MediaDecoder>>,
    generation: u64,
    playlist: Option<Playlist>,
    state: PlaybackState,
    play_when_prepared: bool,
    looping: bool,
    arbiter: FocusArbiter,
    guard: SessionGuard,
    poller: ProgressPoller,
    volume: u8,
    muted: bool,
    config: EngineConfig,
    observers: Vec<Sender<PlayerEvent>>,
    signal_tx: Sender<EngineSignal>,
}

impl AudioEngine {
    /// Must be called inside a tokio runtime: the dispatch task draining
    /// decoder and environment signals is spawned here.
    pub fn new(
        factory: Box<dyn DecoderFactory>,
        focus: Arc<dyn FocusAuthority>,
        wake_lock: Arc<dyn WakeLock>,
        route_watch: Arc<dyn RouteWatch>,
        config: EngineConfig,
    ) -> Self {
        let (signal_tx, signal_rx) = flume::unbounded();
        let inner = Arc::new(Mutex::new(Inner {
            factory,
            decoder: None,
            generation: 0,
            playlist: None,
            state: PlaybackState::None,
            play_when_prepared: false,
            looping: false,
            arbiter: FocusArbiter::new(focus, config.duck_volume),
            guard: SessionGuard::new(wake_lock, route_watch),
            poller: ProgressPoller::new(),
            volume: config.volume,
            muted: false,
            config,
            observers: Vec::new(),
            signal_tx: signal_tx.clone(),
        }));

        let dispatch_inner = inner.clone();
        tokio::spawn(async move {
            while let Ok(signal) = signal_rx.recv_async().await {
                dispatch_inner.lock().unwrap().dispatch(signal);
            }
        });

        Self { inner, signal_tx }
    }

    pub fn signals(&self) -> SignalHandle {
        SignalHandle {
            tx: self.signal_tx.clone(),
        }
    }

    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        let (tx, rx) = flume::unbounded();
        self.inner.lock().unwrap().observers.push(tx);
        rx
    }

    /// Starts (or restarts) a session over `playlist`. Acquires the session
    /// resources and begins preparing the current track; `play_when_ready`
    /// is the caller's intent once preparation completes.
    pub fn start_session(
        &self,
        playlist: Playlist,
        play_when_ready: bool,
    ) -> Result<(), AudioError> {
        if playlist.is_empty() {
            return Err(AudioError::InvalidNavigation);
        }
        let mut inner = self.inner.lock().unwrap();
        debug!(
            title = playlist.title(),
            tracks = playlist.len(),
            "session_start"
        );
        inner.poller.stop();
        inner.playlist = Some(playlist);
        inner.play_when_prepared = play_when_ready;
        inner.guard.acquire();
        inner.initialize_decoder();
        Ok(())
    }

    pub fn end_session(&self) {
        self.inner.lock().unwrap().end_session();
    }

    pub fn play(&self) {
        self.inner.lock().unwrap().play();
    }

    pub fn pause(&self) {
        self.inner.lock().unwrap().pause();
    }

    /// Advances to the next track. The playlist cursor moves before any
    /// asynchronous preparation starts; playback resumes automatically
    /// after prepare iff the engine was started (or had just completed).
    pub fn next(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.playlist.as_ref().is_some_and(Playlist::has_next) {
            inner.advance_forward();
            inner.initialize_decoder();
        }
    }

    pub fn prev(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.playlist.as_ref().is_some_and(Playlist::has_prev) {
            inner.fall_back();
            inner.initialize_decoder();
        }
    }

    pub fn seek(&self, position_ms: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(decoder) = inner.decoder.as_mut() {
            decoder.seek(Duration::from_millis(position_ms));
        }
    }

    pub fn set_looping(&self, looping: bool) {
        self.inner.lock().unwrap().looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.inner.lock().unwrap().looping
    }

    pub fn set_shuffle(&self, enabled: bool) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(playlist) = inner.playlist.as_mut() {
            playlist.set_shuffle(enabled);
        }
    }

    pub fn is_shuffle_enabled(&self) -> bool {
        self.inner
            .lock()
            .unwrap()
            .playlist
            .as_ref()
            .is_some_and(Playlist::is_shuffle_enabled)
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.lock().unwrap().state
    }

    pub fn current_track(&self) -> Option<Track> {
        self.inner
            .lock()
            .unwrap()
            .playlist
            .as_ref()
            .and_then(Playlist::current)
            .cloned()
    }

    pub fn has_next(&self) -> bool {
        self.inner
            .lock()
            .unwrap()
            .playlist
            .as_ref()
            .is_some_and(Playlist::has_next)
    }

    pub fn has_prev(&self) -> bool {
        self.inner
            .lock()
            .unwrap()
            .playlist
            .as_ref()
            .is_some_and(Playlist::has_prev)
    }

    pub fn current_position_ms(&self) -> u64 {
        self.inner.lock().unwrap().position_ms()
    }

    pub fn set_volume(&self, volume: u8) {
        let mut inner = self.inner.lock().unwrap();
        inner.volume = volume.min(100);
        inner.muted = false;
        inner.apply_volume();
    }

    pub fn volume_up(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.volume = inner.volume.saturating_add(inner.config.volume_step).min(100);
        inner.muted = false;
        inner.apply_volume();
    }

    pub fn volume_down(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.volume = inner.volume.saturating_sub(inner.config.volume_step);
        inner.muted = false;
        inner.apply_volume();
    }

    pub fn toggle_mute(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.muted = !inner.muted;
        inner.apply_volume();
    }

    pub fn volume(&self) -> u8 {
        self.inner.lock().unwrap().volume
    }

    pub fn is_muted(&self) -> bool {
        self.inner.lock().unwrap().muted
    }

    /// Emits `Progress` events to subscribers at the configured interval
    /// until stopped, paused or torn down.
    pub fn start_progress_updates(&self) {
        let tick_inner = self.inner.clone();
        let inner = self.inner.lock().unwrap();
        let interval = Duration::from_millis(inner.config.progress_interval_ms);
        inner.poller.start(interval, move || {
            let mut inner = tick_inner.lock().unwrap();
            let position_ms = inner.position_ms();
            inner.emit(PlayerEvent::Progress { position_ms });
        });
    }

    pub fn stop_progress_updates(&self) {
        self.inner.lock().unwrap().poller.stop();
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.end_session();
        }
    }
}

impl Inner {
    fn dispatch(&mut self, signal: EngineSignal) {
        match signal {
            EngineSignal::Decoder { generation, event } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "stale_decoder_signal");
                    return;
                }
                match event {
                    DecoderEvent::Prepared => self.on_prepared(),
                    DecoderEvent::Completed => self.on_completed(),
                    DecoderEvent::Error(code) => self.on_decoder_error(code),
                }
            }
            EngineSignal::Focus(change) => self.on_focus_change(change),
            EngineSignal::RouteUnusable => self.on_route_unusable(),
        }
    }

    /// Releases the current decoder, creates a fresh one under a new
    /// generation and loads the playlist's current track into it.
    fn initialize_decoder(&mut self) {
        self.generation += 1;
        self.decoder = None;
        let events = DecoderEvents::new(self.signal_tx.clone(), self.generation);
        match self.factory.create(events) {
            Ok(decoder) => self.decoder = Some(decoder),
            Err(e) => {
                warn!(error = %e, "decoder_create_failed");
                return;
            }
        }
        self.set_state(PlaybackState::Idle);
        self.apply_volume();

        let Some(track) = self.playlist.as_ref().and_then(Playlist::current).cloned() else {
            return;
        };
        let result = match self.decoder.as_mut() {
            Some(decoder) => decoder.set_source(track.audio_url()),
            None => return,
        };
        match result {
            Ok(()) => {
                self.set_state(PlaybackState::Initialized);
                self.emit(PlayerEvent::TrackChanged(track));
                if let Some(decoder) = self.decoder.as_mut() {
                    decoder.prepare_async();
                }
                self.set_state(PlaybackState::Preparing);
            }
            Err(e) => warn!(error = %e, id = track.id(), "decoder_set_source_failed"),
        }
    }

    fn on_prepared(&mut self) {
        debug!("decoder_prepared");
        self.set_state(PlaybackState::Prepared);
        if self.play_when_prepared {
            if let Some(decoder) = self.decoder.as_mut() {
                decoder.start();
            }
            self.set_state(PlaybackState::Started);
        }
    }

    fn on_completed(&mut self) {
        debug!(looping = self.looping, "decoder_completed");
        self.state = PlaybackState::Completed;
        if self.looping {
            self.notify_state();
            if let Some(decoder) = self.decoder.as_mut() {
                decoder.start();
            }
            self.set_state(PlaybackState::Started);
        } else if self.playlist.as_ref().is_some_and(Playlist::has_next) {
            self.advance_forward();
            self.notify_state();
            self.initialize_decoder();
        } else {
            self.notify_state();
        }
    }

    /// A decoder error is never fatal to the session: it is broadcast as
    /// an `Error` state, then the decoder is recreated and the current
    /// track reloaded. One attempt per occurrence, no backoff.
    fn on_decoder_error(&mut self, code: i32) {
        warn!(code, "decoder_error");
        self.set_state(PlaybackState::Error);
        self.initialize_decoder();
    }

    fn on_focus_change(&mut self, change: FocusChange) {
        debug!(change = ?change, "focus_change");
        let started = self.state == PlaybackState::Started;
        match self.arbiter.on_change(change, started) {
            FocusDirective::Regained { resume } => {
                if resume {
                    self.play();
                }
                self.apply_volume();
            }
            FocusDirective::Pause => self.pause(),
            FocusDirective::Duck { volume } => {
                if let Some(decoder) = self.decoder.as_mut() {
                    decoder.set_volume(volume);
                }
            }
            FocusDirective::Ignore => {}
        }
    }

    fn on_route_unusable(&mut self) {
        if matches!(
            self.state,
            PlaybackState::Started | PlaybackState::Completed
        ) {
            debug!("route_unusable_pausing");
            self.pause();
        }
    }

    fn play(&mut self) {
        if self.decoder.is_none()
            || !matches!(
                self.state,
                PlaybackState::Prepared | PlaybackState::Paused | PlaybackState::Completed
            )
        {
            return;
        }
        if let Err(e) = self.arbiter.request() {
            // playback continues without exclusive access
            warn!(error = %e, "focus_request_denied");
        }
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.start();
        }
        self.set_state(PlaybackState::Started);
    }

    fn pause(&mut self) {
        if self.decoder.is_none() {
            return;
        }
        self.poller.stop();
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.pause();
        }
        self.set_state(PlaybackState::Paused);
    }

    fn advance_forward(&mut self) {
        self.play_when_prepared = matches!(
            self.state,
            PlaybackState::Completed | PlaybackState::Started
        );
        if let Some(playlist) = self.playlist.as_mut() {
            playlist.next();
        }
    }

    fn fall_back(&mut self) {
        self.play_when_prepared = self.state == PlaybackState::Started;
        if let Some(playlist) = self.playlist.as_mut() {
            playlist.prev();
        }
    }

    /// Releases decoder, guard holdings and the focus token together; runs
    /// on explicit teardown and on drop, and is idempotent.
    fn end_session(&mut self) {
        self.poller.stop();
        let was_active = self.guard.is_active();
        self.guard.release();
        // invalidate any signal still in flight from the released decoder
        self.generation += 1;
        if self.decoder.take().is_some() {
            self.set_state(PlaybackState::Stopped);
        }
        if was_active {
            self.arbiter.abandon();
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        self.notify_state();
    }

    fn notify_state(&mut self) {
        debug!(state = ?self.state, "engine_state");
        let event = PlayerEvent::StateChanged(self.state);
        self.emit(event);
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn apply_volume(&mut self) {
        let volume = if self.muted {
            0.0
        } else {
            f32::from(self.volume) / 100.0
        };
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.set_volume(volume);
        }
    }

    fn position_ms(&self) -> u64 {
        self.decoder
            .as_ref()
            .map(|decoder| decoder.position().as_millis() as u64)
            .unwrap_or(0)
    }
}
