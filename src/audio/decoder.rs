use std::time::Duration;

use crate::audio::engine::EngineSignal;
use crate::audio::error::AudioError;

/// Asynchronous notifications a decoder delivers back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderEvent {
    Prepared,
    Completed,
    Error(i32),
}

/// Notification handle given to a decoder at creation. Events are tagged
/// with the generation the decoder was created under so signals from a
/// released decoder are discarded by the engine.
#[derive(Clone)]
pub struct DecoderEvents {
    tx: flume::Sender<EngineSignal>,
    generation: u64,
}

impl DecoderEvents {
    pub(crate) fn new(tx: flume::Sender<EngineSignal>, generation: u64) -> Self {
        Self { tx, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn prepared(&self) {
        self.send(DecoderEvent::Prepared);
    }

    pub fn completed(&self) {
        self.send(DecoderEvent::Completed);
    }

    pub fn error(&self, code: i32) {
        self.send(DecoderEvent::Error(code));
    }

    fn send(&self, event: DecoderEvent) {
        let _ = self.tx.send(EngineSignal::Decoder {
            generation: self.generation,
            event,
        });
    }
}

/// The single active decoding/rendering resource. `prepare_async` must not
/// block; its outcome arrives later through the `DecoderEvents` handle.
/// `start` (re)starts output from the beginning once the source has
/// completed. Dropping the decoder releases the underlying resource.
pub trait MediaDecoder: Send {
    fn set_source(&mut self, url: &str) -> Result<(), AudioError>;
    fn prepare_async(&mut self);
    fn start(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: Duration);
    fn position(&self) -> Duration;
    fn set_volume(&mut self, volume: f32);
}

pub trait DecoderFactory: Send {
    fn create(&self, events: DecoderEvents) -> Result<Box<dyn MediaDecoder>, AudioError>;
}
