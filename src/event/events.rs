use crate::audio::state::PlaybackState;
use crate::model::track::Track;

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    StateChanged(PlaybackState),
    TrackChanged(Track),
    Progress { position_ms: u64 },
}
