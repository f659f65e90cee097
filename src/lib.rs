pub mod audio;
pub mod event;
pub mod model;
pub mod util;

pub use audio::config::EngineConfig;
pub use audio::decoder::{DecoderEvent, DecoderEvents, DecoderFactory, MediaDecoder};
pub use audio::engine::{AudioEngine, EngineSignal, SignalHandle};
pub use audio::error::AudioError;
pub use audio::focus::{
    FocusArbiter, FocusAuthority, FocusChange, FocusDirective, UncontendedFocus,
};
pub use audio::guard::{RouteSubscription, RouteWatch, SessionGuard, SoftWakeLock, WakeLock};
#[cfg(feature = "playback")]
pub use audio::output::{RodioOutput, RodioOutputFactory};
pub use audio::progress::ProgressPoller;
pub use audio::state::PlaybackState;
pub use event::events::PlayerEvent;
pub use model::playlist::Playlist;
pub use model::track::{MalformedDuration, Track};
