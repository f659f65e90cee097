use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::audio::error::AudioError;

/// Focus-change notifications delivered by the operating environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Gained,
    LostTransient,
    LostTransientCanDuck,
    LostPermanent,
    Unknown,
}

/// Grants and revokes exclusive access to the shared audio output.
pub trait FocusAuthority: Send + Sync {
    fn request_exclusive(&self) -> Result<(), AudioError>;
    fn abandon(&self);
}

/// Default authority for environments without focus contention. Always
/// grants; keeps request/abandon counts for auditing.
#[derive(Default)]
pub struct UncontendedFocus {
    requests: AtomicUsize,
    abandons: AtomicUsize,
}

impl UncontendedFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn abandons(&self) -> usize {
        self.abandons.load(Ordering::Relaxed)
    }
}

impl FocusAuthority for UncontendedFocus {
    fn request_exclusive(&self) -> Result<(), AudioError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn abandon(&self) {
        self.abandons.fetch_add(1, Ordering::Relaxed);
    }
}

/// What the engine should do in reaction to a focus change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusDirective {
    Regained { resume: bool },
    Pause,
    Duck { volume: f32 },
    Ignore,
}

/// Tracks whether a focus loss interrupted active playback, so a later
/// gain can resume it.
pub struct FocusArbiter {
    authority: Arc<dyn FocusAuthority>,
    resume_on_gain: bool,
    duck_volume: f32,
}

impl FocusArbiter {
    pub fn new(authority: Arc<dyn FocusAuthority>, duck_volume: f32) -> Self {
        Self {
            authority,
            resume_on_gain: false,
            duck_volume,
        }
    }

    pub fn request(&self) -> Result<(), AudioError> {
        self.authority.request_exclusive()
    }

    pub fn abandon(&self) {
        self.authority.abandon();
    }

    pub fn resume_on_gain(&self) -> bool {
        self.resume_on_gain
    }

    pub fn on_change(&mut self, change: FocusChange, currently_started: bool) -> FocusDirective {
        match change {
            FocusChange::Gained => FocusDirective::Regained {
                resume: self.resume_on_gain,
            },
            FocusChange::LostTransient | FocusChange::LostPermanent => {
                self.resume_on_gain = currently_started;
                FocusDirective::Pause
            }
            FocusChange::LostTransientCanDuck => {
                self.resume_on_gain = false;
                FocusDirective::Duck {
                    volume: self.duck_volume,
                }
            }
            FocusChange::Unknown => {
                self.resume_on_gain = false;
                FocusDirective::Ignore
            }
        }
    }
}
