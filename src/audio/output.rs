use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use crate::audio::decoder::{DecoderEvents, DecoderFactory, MediaDecoder};
use crate::audio::error::AudioError;

const ERROR_SOURCE_UNREADABLE: i32 = 1;
const ERROR_FORMAT_UNSUPPORTED: i32 = 2;

/// `MediaDecoder` backed by a rodio output stream and sink. Sources are
/// local paths or `file://` URLs. Preparation decodes on a background
/// thread; a monitor thread reports completion once the sink drains.
pub struct RodioOutput {
    _stream: OutputStream,
    sink: Arc<Sink>,
    events: DecoderEvents,
    source: Option<PathBuf>,
    playing: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
}

impl RodioOutput {
    pub fn new(events: DecoderEvents) -> Result<Self, AudioError> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        let sink = Arc::new(Sink::connect_new(stream.mixer()));

        let output = Self {
            _stream: stream,
            sink,
            events,
            source: None,
            playing: Arc::new(AtomicBool::new(false)),
            alive: Arc::new(AtomicBool::new(true)),
        };
        output.spawn_monitor();
        Ok(output)
    }

    fn spawn_monitor(&self) {
        let sink = self.sink.clone();
        let playing = self.playing.clone();
        let alive = self.alive.clone();
        let events = self.events.clone();

        thread::spawn(move || {
            loop {
                if !alive.load(Ordering::Relaxed) {
                    break;
                }
                if playing.load(Ordering::Relaxed) && sink.empty() {
                    playing.store(false, Ordering::Relaxed);
                    events.completed();
                }
                thread::sleep(Duration::from_millis(125));
            }
        });
    }

    fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, i32> {
        let file = File::open(path).map_err(|_| ERROR_SOURCE_UNREADABLE)?;
        Decoder::new(BufReader::new(file)).map_err(|_| ERROR_FORMAT_UNSUPPORTED)
    }

    fn append_source(sink: &Sink, path: &Path) -> Result<(), i32> {
        let source = Self::decode(path)?;
        sink.append(source);
        Ok(())
    }
}

impl MediaDecoder for RodioOutput {
    fn set_source(&mut self, url: &str) -> Result<(), AudioError> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        if path.is_empty() {
            return Err(AudioError::Source(url.to_string()));
        }
        self.source = Some(PathBuf::from(path));
        Ok(())
    }

    fn prepare_async(&mut self) {
        let Some(path) = self.source.clone() else {
            self.events.error(ERROR_SOURCE_UNREADABLE);
            return;
        };
        let sink = self.sink.clone();
        let events = self.events.clone();

        thread::spawn(move || match Self::decode(&path) {
            Ok(source) => {
                sink.pause();
                sink.append(source);
                events.prepared();
            }
            Err(code) => {
                warn!(path = %path.display(), code, "rodio_prepare_failed");
                events.error(code);
            }
        });
    }

    fn start(&mut self) {
        // restart from the top when the previous pass drained the sink
        if self.sink.empty() {
            if let Some(path) = self.source.clone() {
                if let Err(code) = Self::append_source(&self.sink, &path) {
                    self.events.error(code);
                    return;
                }
            }
        }
        self.sink.play();
        self.playing.store(true, Ordering::Relaxed);
    }

    fn pause(&mut self) {
        self.sink.pause();
        self.playing.store(false, Ordering::Relaxed);
    }

    fn seek(&mut self, position: Duration) {
        if let Err(e) = self.sink.try_seek(position) {
            debug!(error = %e, "rodio_seek_failed");
        }
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Relaxed);
        self.playing.store(false, Ordering::Relaxed);
        self.sink.stop();
    }
}

pub struct RodioOutputFactory;

impl DecoderFactory for RodioOutputFactory {
    fn create(&self, events: DecoderEvents) -> Result<Box<dyn MediaDecoder>, AudioError> {
        Ok(Box::new(RodioOutput::new(events)?))
    }
}
