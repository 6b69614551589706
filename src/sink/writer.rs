//! WAV writer state machine run on the sink's worker thread.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::buffer::SampleBuffer;
use crate::event::{EventCallback, RecordingEvent};
use crate::sink::format::{AudioFormat, SampleKind};
use crate::SinkError;

type WavFileWriter = hound::WavWriter<BufWriter<File>>;

/// Format discovery state. Transitions only move forward:
/// `Unformatted -> Formatted -> Failed` or `Unformatted -> Failed`.
#[derive(Debug)]
enum FormatState {
    Unformatted,
    Formatted(AudioFormat),
    Failed {
        error: SinkError,
        format: Option<AudioFormat>,
    },
}

/// What happened to one buffer handed to [`SinkWriter::accept`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferOutcome {
    /// The buffer's data was not ready; nothing was written.
    Skipped,
    /// The buffer was appended to the file.
    Written {
        /// Frames appended.
        frames: usize,
    },
    /// The sink had already failed or finished; the buffer was discarded.
    Dropped,
    /// This buffer put the sink into its permanent failure state.
    Failed(SinkError),
}

/// Final accounting for one recording's sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkReport {
    /// Output file path.
    pub path: PathBuf,
    /// Format discovered from the first usable buffer, if any.
    pub format: Option<AudioFormat>,
    /// Frames appended to the file.
    pub frames_written: u64,
    /// Buffers appended to the file.
    pub buffers_written: u64,
    /// Buffers skipped because their data was not ready.
    pub buffers_skipped: u64,
    /// Buffers discarded after a failure or after finishing.
    pub buffers_dropped: u64,
    /// The permanent failure, if the sink entered one.
    pub failure: Option<SinkError>,
}

impl SinkReport {
    /// A report for a sink that never saw a buffer.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
            frames_written: 0,
            buffers_written: 0,
            buffers_skipped: 0,
            buffers_dropped: 0,
            failure: None,
        }
    }

    /// Duration of audio in the file.
    pub fn duration(&self) -> Duration {
        match self.format {
            Some(format) if format.sample_rate > 0 => Duration::from_secs_f64(
                self.frames_written as f64 / f64::from(format.sample_rate),
            ),
            _ => Duration::ZERO,
        }
    }

    /// Returns `true` if an output file was created.
    pub fn file_created(&self) -> bool {
        self.format.is_some() && self.path.exists()
    }
}

/// Scratch copy of one buffer's payload, interleaved, in the session format.
enum ScratchBuffer {
    Float(Vec<f32>),
    Int(Vec<i32>),
}

/// Incremental WAV writer with lazy, at-most-once format discovery.
///
/// The file is created when the first usable buffer arrives, using the format
/// embedded in that buffer. Any failure is permanent: the writer keeps the
/// file open so [`finish`](Self::finish) can still finalize the audio written
/// so far, and every later buffer is dropped.
///
/// A `SinkWriter` is owned by exactly one thread and is never shared, so the
/// open file needs no lock.
pub struct SinkWriter {
    path: PathBuf,
    state: FormatState,
    writer: Option<WavFileWriter>,
    events: EventCallback,
    frames_written: u64,
    buffers_written: u64,
    buffers_skipped: u64,
    buffers_dropped: u64,
    finished: bool,
}

impl SinkWriter {
    /// Creates a writer for `path`. Nothing is created on disk yet.
    pub fn new(path: impl Into<PathBuf>, events: EventCallback) -> Self {
        Self {
            path: path.into(),
            state: FormatState::Unformatted,
            writer: None,
            events,
            frames_written: 0,
            buffers_written: 0,
            buffers_skipped: 0,
            buffers_dropped: 0,
            finished: false,
        }
    }

    /// Output file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The discovered format, if any.
    pub fn format(&self) -> Option<AudioFormat> {
        match &self.state {
            FormatState::Unformatted => None,
            FormatState::Formatted(format) => Some(*format),
            FormatState::Failed { format, .. } => *format,
        }
    }

    /// Returns `true` once the writer has entered its failure state.
    pub fn has_failed(&self) -> bool {
        matches!(self.state, FormatState::Failed { .. })
    }

    /// Handles one buffer.
    pub fn accept(&mut self, buffer: &SampleBuffer) -> BufferOutcome {
        if self.finished || self.has_failed() {
            self.buffers_dropped += 1;
            tracing::trace!(path = %self.path.display(), "dropping buffer");
            return BufferOutcome::Dropped;
        }

        if !buffer.data_ready {
            self.buffers_skipped += 1;
            tracing::trace!(ts = ?buffer.presentation_time, "buffer data not ready; skipping");
            return BufferOutcome::Skipped;
        }

        let format = if let FormatState::Formatted(format) = self.state {
            format
        } else {
            match self.open_file(buffer) {
                Ok(format) => format,
                Err(error) => return self.fail(error),
            }
        };

        let scratch = match copy_payload(&format, buffer) {
            Ok(scratch) => scratch,
            Err(reason) => return self.fail(SinkError::write(&self.path, reason)),
        };

        if let Err(e) = self.append(&scratch, usize::from(format.channels)) {
            return self.fail(SinkError::write(&self.path, e));
        }

        self.frames_written += buffer.frame_count as u64;
        self.buffers_written += 1;
        tracing::trace!(
            frames = buffer.frame_count,
            ts = ?buffer.presentation_time,
            "appended buffer"
        );
        BufferOutcome::Written {
            frames: buffer.frame_count,
        }
    }

    /// Closes the file, updating its header so it is independently playable.
    ///
    /// Idempotent: later calls return the same report without touching the
    /// file again. Also valid after a failure.
    pub fn finish(&mut self) -> SinkReport {
        if !self.finished {
            self.finished = true;
            if let Some(writer) = self.writer.take() {
                if let Err(e) = writer.finalize() {
                    if !self.has_failed() {
                        self.fail(SinkError::write(&self.path, e));
                    }
                } else {
                    tracing::debug!(
                        path = %self.path.display(),
                        frames = self.frames_written,
                        "finalized recording file"
                    );
                }
            }
        }
        self.report()
    }

    /// Current accounting.
    pub fn report(&self) -> SinkReport {
        SinkReport {
            path: self.path.clone(),
            format: self.format(),
            frames_written: self.frames_written,
            buffers_written: self.buffers_written,
            buffers_skipped: self.buffers_skipped,
            buffers_dropped: self.buffers_dropped,
            failure: match &self.state {
                FormatState::Failed { error, .. } => Some(error.clone()),
                _ => None,
            },
        }
    }

    fn open_file(&mut self, buffer: &SampleBuffer) -> Result<AudioFormat, SinkError> {
        let description = buffer
            .description
            .as_ref()
            .ok_or_else(|| SinkError::format("buffer carries no stream description"))?;
        let format = AudioFormat::from_description(description)?;

        let writer = hound::WavWriter::create(&self.path, format.wav_spec())
            .map_err(|e| SinkError::write(&self.path, e))?;

        self.writer = Some(writer);
        self.state = FormatState::Formatted(format);
        (self.events)(RecordingEvent::FormatDiscovered {
            path: self.path.clone(),
            format,
        });
        Ok(format)
    }

    fn append(&mut self, scratch: &ScratchBuffer, channels: usize) -> Result<(), hound::Error> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(hound::Error::IoError(std::io::Error::other(
                "recording file is not open",
            )));
        };
        match scratch {
            ScratchBuffer::Float(samples) => write_frames(writer, samples, channels),
            ScratchBuffer::Int(samples) => write_frames(writer, samples, channels),
        }
    }

    fn fail(&mut self, error: SinkError) -> BufferOutcome {
        let format = self.format();
        tracing::error!(path = %self.path.display(), %error, "sink failed permanently");
        self.state = FormatState::Failed {
            error: error.clone(),
            format,
        };
        (self.events)(RecordingEvent::SinkFailed {
            path: self.path.clone(),
            error: error.clone(),
        });
        BufferOutcome::Failed(error)
    }
}

/// Appends interleaved samples one frame at a time.
///
/// If a write fails part way through a frame, the rest of that frame is
/// filled with silence so the data chunk still holds whole frames when the
/// file is finalized. The original error is returned.
fn write_frames<W, S>(
    writer: &mut hound::WavWriter<W>,
    samples: &[S],
    channels: usize,
) -> Result<(), hound::Error>
where
    W: Write + Seek,
    S: hound::Sample + Copy + Default,
{
    for frame in samples.chunks(channels.max(1)) {
        for (index, &sample) in frame.iter().enumerate() {
            if let Err(e) = writer.write_sample(sample) {
                for _ in index..frame.len() {
                    if writer.write_sample(S::default()).is_err() {
                        break;
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Copies a buffer's planes into an interleaved scratch buffer.
fn copy_payload(format: &AudioFormat, buffer: &SampleBuffer) -> Result<ScratchBuffer, String> {
    let planes = &buffer.planes;
    if planes.len() != format.plane_count() {
        return Err(format!(
            "expected {} plane(s), buffer has {}",
            format.plane_count(),
            planes.len()
        ));
    }

    let frames = buffer.frame_count;
    let needed = frames * format.plane_frame_bytes();
    if let Some((index, plane)) = planes.iter().enumerate().find(|(_, p)| p.len() < needed) {
        return Err(format!(
            "plane {index} holds {} bytes, {needed} needed for {frames} frames",
            plane.len()
        ));
    }

    let channels = usize::from(format.channels);
    let sample_bytes = |frame: usize, channel: usize| sample_at(planes, format, frame, channel);

    let total = frames * channels;
    let scratch = match format.sample_kind {
        SampleKind::Float => {
            let mut samples = Vec::with_capacity(total);
            for frame in 0..frames {
                for channel in 0..channels {
                    let b = sample_bytes(frame, channel);
                    samples.push(f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
                }
            }
            ScratchBuffer::Float(samples)
        }
        SampleKind::Int => {
            let mut samples = Vec::with_capacity(total);
            for frame in 0..frames {
                for channel in 0..channels {
                    samples.push(decode_int(sample_bytes(frame, channel)));
                }
            }
            ScratchBuffer::Int(samples)
        }
    };
    Ok(scratch)
}

/// The bytes of one sample. Bounds were checked by `copy_payload`.
fn sample_at<'a>(
    planes: &'a [Vec<u8>],
    format: &AudioFormat,
    frame: usize,
    channel: usize,
) -> &'a [u8] {
    let width = format.bytes_per_sample();
    let (plane, offset) = if format.interleaved {
        (&planes[0], (frame * usize::from(format.channels) + channel) * width)
    } else {
        (&planes[channel], frame * width)
    };
    &plane[offset..offset + width]
}

/// Decodes a little-endian signed integer of 1 to 4 bytes.
fn decode_int(bytes: &[u8]) -> i32 {
    match bytes.len() {
        1 => i32::from(bytes[0] as i8),
        2 => i32::from(i16::from_le_bytes([bytes[0], bytes[1]])),
        // Place the 24-bit value in the top bytes, then shift back to sign-extend.
        3 => i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8,
        _ => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{
        StreamDescription, FORMAT_FLAG_IS_PACKED, FORMAT_FLAG_IS_SIGNED_INTEGER,
        FORMAT_ID_LINEAR_PCM,
    };
    use crate::event_callback;
    use parking_lot::Mutex;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn recording_events() -> (EventCallback, Arc<Mutex<Vec<RecordingEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        (event_callback(move |e| sink.lock().push(e)), events)
    }

    fn stereo_buffer(frames: usize, ms: u64) -> SampleBuffer {
        SampleBuffer::from_planar_f32(
            48000,
            &[vec![0.25; frames], vec![-0.25; frames]],
            Duration::from_millis(ms),
        )
    }

    #[test]
    fn test_file_created_lazily() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lazy.wav");
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new(&path, events);

        assert!(!path.exists());
        assert_eq!(
            writer.accept(&SampleBuffer::not_ready(Duration::ZERO)),
            BufferOutcome::Skipped
        );
        assert!(!path.exists());

        assert_eq!(
            writer.accept(&stereo_buffer(480, 0)),
            BufferOutcome::Written { frames: 480 }
        );
        assert!(path.exists());
        writer.finish();
    }

    #[test]
    fn test_duration_matches_frame_sum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sum.wav");
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new(&path, events);

        for (i, frames) in [480usize, 1024, 96, 4800].into_iter().enumerate() {
            writer.accept(&stereo_buffer(frames, i as u64 * 10));
        }
        let report = writer.finish();
        assert_eq!(report.frames_written, 480 + 1024 + 96 + 4800);
        assert_eq!(report.buffers_written, 4);

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 32);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.duration(), 480 + 1024 + 96 + 4800);
    }

    #[test]
    fn test_planar_payload_is_interleaved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planar.wav");
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new(&path, events);

        let buffer = SampleBuffer::from_planar_f32(
            48000,
            &[vec![0.1, 0.2, 0.3], vec![-0.1, -0.2, -0.3]],
            Duration::ZERO,
        );
        writer.accept(&buffer);
        writer.finish();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<f32> = reader.samples::<f32>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
    }

    #[test]
    fn test_interleaved_int16_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("int16.wav");
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new(&path, events);

        let buffer =
            SampleBuffer::from_interleaved_i16(44100, 2, &[100, -100, 200, -200], Duration::ZERO);
        assert_eq!(writer.accept(&buffer), BufferOutcome::Written { frames: 2 });
        writer.finish();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.spec().bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![100, -100, 200, -200]);
    }

    #[test]
    fn test_int24_payload_sign_extends() {
        assert_eq!(decode_int(&[0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(decode_int(&[0x00, 0x00, 0x80]), -8_388_608);
        assert_eq!(decode_int(&[0xFF, 0xFF, 0x7F]), 8_388_607);
        assert_eq!(decode_int(&[0x80]), -128);
        assert_eq!(decode_int(&[0x34, 0x12]), 0x1234);
    }

    fn int_buffer(bits: u32, plane: Vec<u8>) -> SampleBuffer {
        let width = bits / 8;
        SampleBuffer::new(
            StreamDescription {
                sample_rate: 48000.0,
                format_id: FORMAT_ID_LINEAR_PCM,
                format_flags: FORMAT_FLAG_IS_SIGNED_INTEGER | FORMAT_FLAG_IS_PACKED,
                bytes_per_frame: width,
                channels_per_frame: 1,
                bits_per_channel: bits,
            },
            plane.len() / width as usize,
            Duration::ZERO,
            vec![plane],
        )
    }

    #[test]
    fn test_integer_widths_round_trip_through_file() {
        let cases: [(u32, Vec<u8>, Vec<i32>); 3] = [
            (8, vec![0x80, 0x7F, 0x00], vec![-128, 127, 0]),
            (
                24,
                vec![0x00, 0x00, 0x80, 0xFF, 0xFF, 0x7F],
                vec![-8_388_608, 8_388_607],
            ),
            (
                32,
                vec![0x00, 0x00, 0x00, 0x80, 0xFF, 0xFF, 0xFF, 0x7F],
                vec![i32::MIN, i32::MAX],
            ),
        ];

        let dir = tempdir().unwrap();
        for (bits, plane, expected) in cases {
            let path = dir.path().join(format!("int{bits}.wav"));
            let (events, _) = recording_events();
            let mut writer = SinkWriter::new(&path, events);

            let frames = expected.len();
            assert_eq!(
                writer.accept(&int_buffer(bits, plane)),
                BufferOutcome::Written { frames }
            );
            writer.finish();

            let mut reader = hound::WavReader::open(&path).unwrap();
            assert_eq!(reader.spec().bits_per_sample, bits as u16);
            assert_eq!(reader.spec().sample_format, hound::SampleFormat::Int);
            let samples: Vec<i32> = reader.samples::<i32>().map(Result::unwrap).collect();
            assert_eq!(samples, expected, "{bits}-bit samples");
        }
    }

    /// File wrapper whose writes start failing once after a countdown.
    struct FlakyFile {
        file: File,
        writes_before_failure: Rc<Cell<Option<u32>>>,
    }

    impl Write for FlakyFile {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Some(remaining) = self.writes_before_failure.get() {
                if remaining == 0 {
                    self.writes_before_failure.set(None);
                    return Err(std::io::Error::other("disk full"));
                }
                self.writes_before_failure.set(Some(remaining - 1));
            }
            self.file.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.file.flush()
        }
    }

    impl Seek for FlakyFile {
        fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
            self.file.seek(pos)
        }
    }

    #[test]
    fn test_failed_write_leaves_whole_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torn.wav");
        let countdown = Rc::new(Cell::new(None));
        let flaky = FlakyFile {
            file: File::create(&path).unwrap(),
            writes_before_failure: Rc::clone(&countdown),
        };
        let format =
            AudioFormat::from_description(&StreamDescription::float32_planar(48000, 2)).unwrap();
        let mut wav = hound::WavWriter::new(flaky, format.wav_spec()).unwrap();

        // The left sample of the first frame lands, the right one fails.
        countdown.set(Some(1));
        let result = write_frames(&mut wav, &[0.5f32, -0.5, 0.25, -0.25], 2);
        assert!(result.is_err());
        wav.finalize().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 1);
        let samples: Vec<f32> = reader.samples::<f32>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![0.5, 0.0]);
    }

    #[test]
    fn test_undecodable_first_buffer_fails_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        let (events, seen) = recording_events();
        let mut writer = SinkWriter::new(&path, events);

        let mut bad = stereo_buffer(480, 0);
        bad.description = Some(StreamDescription {
            format_id: u32::from_be_bytes(*b"aac "),
            ..StreamDescription::float32_planar(48000, 2)
        });

        assert!(matches!(writer.accept(&bad), BufferOutcome::Failed(ref e) if e.is_format()));
        assert_eq!(writer.accept(&stereo_buffer(480, 10)), BufferOutcome::Dropped);
        assert_eq!(writer.accept(&stereo_buffer(480, 20)), BufferOutcome::Dropped);

        let report = writer.finish();
        assert!(report.failure.as_ref().is_some_and(SinkError::is_format));
        assert_eq!(report.buffers_dropped, 2);
        assert_eq!(report.frames_written, 0);
        assert!(report.format.is_none());
        assert!(!path.exists());

        let failures = seen
            .lock()
            .iter()
            .filter(|e| matches!(e, RecordingEvent::SinkFailed { .. }))
            .count();
        assert_eq!(failures, 1);
    }

    #[test]
    fn test_missing_description_is_format_error() {
        let dir = tempdir().unwrap();
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new(dir.path().join("none.wav"), events);

        let mut buffer = stereo_buffer(16, 0);
        buffer.description = None;
        assert!(matches!(writer.accept(&buffer), BufferOutcome::Failed(ref e) if e.is_format()));
        assert!(writer.has_failed());
    }

    #[test]
    fn test_copy_failure_keeps_earlier_audio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.wav");
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new(&path, events);

        writer.accept(&stereo_buffer(480, 0));

        // Claims more frames than its planes hold.
        let mut short = stereo_buffer(100, 10);
        short.frame_count = 200;
        assert!(matches!(
            writer.accept(&short),
            BufferOutcome::Failed(SinkError::Write { .. })
        ));
        assert_eq!(writer.accept(&stereo_buffer(480, 20)), BufferOutcome::Dropped);

        let report = writer.finish();
        assert_eq!(report.frames_written, 480);
        assert!(report.format.is_some());

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 480);
    }

    #[test]
    fn test_plane_count_mismatch_is_write_error() {
        let dir = tempdir().unwrap();
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new(dir.path().join("planes.wav"), events);

        let mut buffer = stereo_buffer(16, 0);
        buffer.planes.pop();
        assert!(matches!(
            writer.accept(&buffer),
            BufferOutcome::Failed(SinkError::Write { .. })
        ));
    }

    #[test]
    fn test_unwritable_path_is_write_error() {
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new("/nonexistent/directory/out.wav", events);
        match writer.accept(&stereo_buffer(16, 0)) {
            BufferOutcome::Failed(SinkError::Write { path, .. }) => {
                assert!(path.to_string_lossy().contains("nonexistent"));
            }
            other => panic!("expected write failure, got {other:?}"),
        }
    }

    #[test]
    fn test_finish_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twice.wav");
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new(&path, events);

        writer.accept(&stereo_buffer(480, 0));
        let first = writer.finish();
        let bytes_after_first = std::fs::read(&path).unwrap();

        let second = writer.finish();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&path).unwrap(), bytes_after_first);

        assert_eq!(writer.accept(&stereo_buffer(480, 10)), BufferOutcome::Dropped);
        assert_eq!(std::fs::read(&path).unwrap(), bytes_after_first);
    }

    #[test]
    fn test_finish_without_buffers_creates_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let (events, _) = recording_events();
        let mut writer = SinkWriter::new(&path, events);

        let report = writer.finish();
        assert_eq!(report, SinkReport::empty(&path));
        assert!(!report.file_created());
        assert!(!path.exists());
    }

    #[test]
    fn test_later_description_is_not_renegotiated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fixed.wav");
        let (events, seen) = recording_events();
        let mut writer = SinkWriter::new(&path, events);

        writer.accept(&stereo_buffer(480, 0));
        let mut later = stereo_buffer(480, 10);
        if let Some(description) = later.description.as_mut() {
            description.sample_rate = 44100.0;
        }
        writer.accept(&later);
        let report = writer.finish();

        assert_eq!(report.format.map(|f| f.sample_rate), Some(48000));
        let discovered = seen
            .lock()
            .iter()
            .filter(|e| matches!(e, RecordingEvent::FormatDiscovered { .. }))
            .count();
        assert_eq!(discovered, 1);
    }

    #[test]
    fn test_report_duration() {
        let mut report = SinkReport::empty("/tmp/x.wav");
        assert_eq!(report.duration(), Duration::ZERO);
        report.format = Some(
            AudioFormat::from_description(&StreamDescription {
                sample_rate: 48000.0,
                format_id: FORMAT_ID_LINEAR_PCM,
                ..StreamDescription::float32_planar(48000, 2)
            })
            .unwrap(),
        );
        report.frames_written = 96000;
        assert_eq!(report.duration(), Duration::from_secs(2));
    }
}
