use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("Audio output device error: {0}")]
    Device(String),

    #[error("Decoder resource error: code {0}")]
    Resource(i32),

    #[error("Audio source error: {0}")]
    Source(String),

    #[error("Audio focus request denied")]
    FocusDenied,

    #[error("Playlist has no track at the requested position")]
    InvalidNavigation,
}
