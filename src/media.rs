use std::{
    collections::VecDeque,
    io::Cursor,
    sync::{
        Arc, Mutex,
        mpsc::{self, Receiver, TryRecvError},
    },
    thread,
    time::{Duration, Instant},
};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use symphonia::core::{
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use tracing::{debug, error, info};

use crate::error::{PlayerError, Result};
use crate::remote::Remote;

// Shared ring buffer of mono samples, read by the analyser
pub type SampleBuf = Arc<Mutex<VecDeque<f32>>>;

pub const SAMPLE_BUF_SIZE: usize = 4096;

const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

pub fn new_sample_buf() -> SampleBuf {
    Arc::new(Mutex::new(VecDeque::with_capacity(SAMPLE_BUF_SIZE)))
}

/// Lifecycle events of a media element, drained once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    Play,
    Pause,
    TimeUpdate,
    LoadedMetadata,
    Ended,
    Error,
}

/// The playback primitive the player drives. Mirrors the subset of an HTML
/// media element the UI needs; `duration()` is `None` until metadata loads.
pub trait MediaElement {
    fn src(&self) -> &str;
    fn set_src(&mut self, path: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn paused(&self) -> bool;
    fn current_time(&self) -> Duration;
    fn set_current_time(&mut self, time: Duration);
    fn duration(&self) -> Option<Duration>;
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    fn muted(&self) -> bool;
    fn poll_events(&mut self) -> Vec<MediaEvent>;
    fn samples(&self) -> SampleBuf;
}

// Source wrapper that mixes each frame to mono and copies it to a shared buffer
struct TappedSource<S> {
    inner: S,
    buf: SampleBuf,
    channels: u16,
    frame_sum: f32,
    frame_pos: u16,
}

impl<S> TappedSource<S>
where
    S: Source<Item = f32>,
{
    fn new(source: S, buf: SampleBuf) -> Self {
        let channels = source.channels().max(1);
        TappedSource {
            inner: source,
            buf,
            channels,
            frame_sum: 0.0,
            frame_pos: 0,
        }
    }
}

impl<S> Iterator for TappedSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        self.frame_sum += sample;
        self.frame_pos += 1;
        if self.frame_pos >= self.channels {
            let mono = self.frame_sum / self.channels as f32;
            self.frame_sum = 0.0;
            self.frame_pos = 0;
            if let Ok(mut buf) = self.buf.try_lock() {
                if buf.len() >= SAMPLE_BUF_SIZE {
                    buf.pop_front();
                }
                buf.push_back(mono);
            }
        }
        Some(sample)
    }
}

impl<S> Source for TappedSource<S>
where
    S: Source<Item = f32>,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> std::result::Result<(), rodio::source::SeekError> {
        let result = self.inner.try_seek(pos);
        if result.is_ok() {
            self.frame_sum = 0.0;
            self.frame_pos = 0;
            if let Ok(mut buf) = self.buf.lock() {
                buf.clear();
            }
        }
        result
    }
}

fn probe_duration(bytes: &Arc<[u8]>, path: &str) -> Option<Duration> {
    let cursor = Cursor::new(Arc::clone(bytes));
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some((_, ext)) = path.rsplit_once('.') {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .ok()?;

    let reader = probed.format;
    let track = reader.default_track()?;
    let time_base = track.codec_params.time_base?;
    let n_frames = track.codec_params.n_frames?;
    let time = time_base.calc_time(n_frames);

    Some(Duration::from_secs_f64(time.seconds as f64 + time.frac))
}

fn decode(bytes: &Arc<[u8]>) -> Result<Decoder<Cursor<Arc<[u8]>>>> {
    Decoder::new(Cursor::new(Arc::clone(bytes))).map_err(|e| PlayerError::Decode(e.to_string()))
}

/// Media element backed by a rodio sink. Sources are downloaded whole from
/// the song server on a worker thread, then decoded in memory.
pub struct RodioElement {
    remote: Remote,
    stream: OutputStream,
    sink: Sink,
    src: String,
    download: Option<Receiver<Result<Vec<u8>>>>,
    bytes: Option<Arc<[u8]>>,
    duration: Option<Duration>,
    seek_base: Duration,
    paused: bool,
    ended: bool,
    volume: f32,
    muted: bool,
    samples: SampleBuf,
    events: Vec<MediaEvent>,
    last_time_update: Instant,
}

impl RodioElement {
    pub fn new(remote: Remote) -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlayerError::Output(e.to_string()))?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();

        Ok(RodioElement {
            remote,
            stream,
            sink,
            src: String::new(),
            download: None,
            bytes: None,
            duration: None,
            seek_base: Duration::ZERO,
            paused: true,
            ended: false,
            volume: 1.0,
            muted: false,
            samples: new_sample_buf(),
            events: Vec::new(),
            last_time_update: Instant::now(),
        })
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    // Drop old sink and create a fresh one positioned at `pos`
    fn rebuild_sink(&mut self, pos: Duration) -> Result<()> {
        self.sink.stop();
        let new_sink = Sink::connect_new(self.stream.mixer());
        new_sink.set_volume(self.effective_volume());
        new_sink.pause();

        if let Some(bytes) = &self.bytes {
            let mut source = decode(bytes)?;
            if !pos.is_zero() {
                let _ = source.try_seek(pos);
            }
            new_sink.append(TappedSource::new(source, Arc::clone(&self.samples)));
        }

        if !self.paused {
            new_sink.play();
        }

        self.sink = new_sink;
        self.seek_base = pos;
        if let Ok(mut sbuf) = self.samples.lock() {
            sbuf.clear();
        }
        Ok(())
    }

    fn attach(&mut self, data: Vec<u8>) {
        let bytes: Arc<[u8]> = data.into();
        self.duration = probe_duration(&bytes, &self.src);
        self.bytes = Some(bytes);
        match self.rebuild_sink(Duration::ZERO) {
            Ok(()) => {
                info!(src = %self.src, duration = ?self.duration, "source ready");
                self.events.push(MediaEvent::LoadedMetadata);
            }
            Err(e) => {
                error!(src = %self.src, "{e}");
                self.bytes = None;
                self.paused = true;
                self.events.push(MediaEvent::Error);
            }
        }
    }
}

impl MediaElement for RodioElement {
    fn src(&self) -> &str {
        &self.src
    }

    fn set_src(&mut self, path: &str) {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.sink.pause();
        self.sink.set_volume(self.effective_volume());

        self.src = path.to_string();
        self.bytes = None;
        self.duration = None;
        self.seek_base = Duration::ZERO;
        self.paused = true;
        self.ended = false;
        if let Ok(mut sbuf) = self.samples.lock() {
            sbuf.clear();
        }

        let (tx, rx) = mpsc::channel();
        let remote = self.remote.clone();
        let path = path.to_string();
        thread::spawn(move || {
            let _ = tx.send(remote.fetch_bytes(&path));
        });
        self.download = Some(rx);
    }

    fn play(&mut self) {
        if self.ended {
            self.ended = false;
            self.paused = false;
            if let Err(e) = self.rebuild_sink(Duration::ZERO) {
                error!(src = %self.src, "{e}");
            }
        }
        self.paused = false;
        self.sink.play();
        self.last_time_update = Instant::now();
        self.events.push(MediaEvent::Play);
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.sink.pause();
        self.paused = true;
        self.events.push(MediaEvent::Pause);
    }

    fn paused(&self) -> bool {
        self.paused
    }

    fn current_time(&self) -> Duration {
        if self.bytes.is_none() {
            return Duration::ZERO;
        }
        let pos = self.seek_base + self.sink.get_pos();
        match self.duration {
            Some(total) => pos.min(total),
            None => pos,
        }
    }

    fn set_current_time(&mut self, time: Duration) {
        if self.bytes.is_none() {
            return;
        }
        let clamped = self.duration.map(|t| time.min(t)).unwrap_or(time);
        self.ended = false;
        match self.rebuild_sink(clamped) {
            Ok(()) => {
                debug!(pos = ?clamped, "seek");
                self.events.push(MediaEvent::TimeUpdate);
            }
            Err(e) => error!(src = %self.src, "seek failed: {e}"),
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.effective_volume());
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sink.set_volume(self.effective_volume());
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let received = self.download.as_ref().map(|rx| rx.try_recv());
        match received {
            Some(Ok(Ok(data))) => {
                self.download = None;
                self.attach(data);
            }
            Some(Ok(Err(e))) => {
                self.download = None;
                error!(src = %self.src, "{e}");
                self.paused = true;
                self.events.push(MediaEvent::Error);
            }
            Some(Err(TryRecvError::Disconnected)) => {
                self.download = None;
                self.events.push(MediaEvent::Error);
            }
            Some(Err(TryRecvError::Empty)) | None => {}
        }

        if !self.paused && self.bytes.is_some() {
            if self.sink.empty() && !self.ended {
                self.ended = true;
                self.paused = true;
                self.events
                    .extend([MediaEvent::TimeUpdate, MediaEvent::Pause, MediaEvent::Ended]);
            } else if self.last_time_update.elapsed() >= TIME_UPDATE_INTERVAL {
                self.last_time_update = Instant::now();
                self.events.push(MediaEvent::TimeUpdate);
            }
        }

        std::mem::take(&mut self.events)
    }

    fn samples(&self) -> SampleBuf {
        Arc::clone(&self.samples)
    }
}

#[cfg(test)]
mod tests {
    use rodio::source::SineWave;

    use super::*;

    // Interleaves a constant on the left and silence on the right
    struct Stereo {
        left: f32,
        remaining: usize,
        pos: usize,
    }

    impl Iterator for Stereo {
        type Item = f32;

        fn next(&mut self) -> Option<f32> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            self.pos += 1;
            Some(if self.pos % 2 == 1 { self.left } else { 0.0 })
        }
    }

    impl Source for Stereo {
        fn current_span_len(&self) -> Option<usize> {
            None
        }
        fn channels(&self) -> u16 {
            2
        }
        fn sample_rate(&self) -> u32 {
            44_100
        }
        fn total_duration(&self) -> Option<Duration> {
            None
        }
    }

    #[test]
    fn tap_mixes_frames_to_mono() {
        let buf = new_sample_buf();
        let source = Stereo { left: 0.5, remaining: 8, pos: 0 };
        let tapped = TappedSource::new(source, Arc::clone(&buf));
        let passed: Vec<f32> = tapped.collect();
        assert_eq!(passed.len(), 8);
        let mono: Vec<f32> = buf.lock().unwrap().iter().copied().collect();
        assert_eq!(mono, vec![0.25; 4]);
    }

    #[test]
    fn tap_keeps_only_latest_samples() {
        let buf = new_sample_buf();
        let tapped = TappedSource::new(SineWave::new(440.0), Arc::clone(&buf));
        let _ = tapped.take(SAMPLE_BUF_SIZE + 100).count();
        assert_eq!(buf.lock().unwrap().len(), SAMPLE_BUF_SIZE);
    }
}
