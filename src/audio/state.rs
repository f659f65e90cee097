/// Lifecycle states of the playback engine's decoder resource. Observers
/// see every transition in the order the engine enters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    None,
    Idle,
    Initialized,
    Preparing,
    Prepared,
    Started,
    Paused,
    Completed,
    Error,
    Stopped,
}
