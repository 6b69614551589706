//! Sample buffers delivered by a capture stream.

use std::time::Duration;

/// Core Audio's `kAudioFormatLinearPCM` ('lpcm').
pub const FORMAT_ID_LINEAR_PCM: u32 = u32::from_be_bytes(*b"lpcm");

/// Sample values are IEEE floats.
pub const FORMAT_FLAG_IS_FLOAT: u32 = 1 << 0;
/// Sample values are big-endian.
pub const FORMAT_FLAG_IS_BIG_ENDIAN: u32 = 1 << 1;
/// Integer sample values are signed.
pub const FORMAT_FLAG_IS_SIGNED_INTEGER: u32 = 1 << 2;
/// Sample values use every bit of their container.
pub const FORMAT_FLAG_IS_PACKED: u32 = 1 << 3;
/// Each channel lives in its own plane.
pub const FORMAT_FLAG_IS_NON_INTERLEAVED: u32 = 1 << 5;

/// The kind of output a capture stream delivered.
///
/// Streams may emit screen frames alongside audio; only
/// [`StreamOutputType::Audio`] is consumed by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutputType {
    /// Application audio.
    Audio,
    /// Video frames.
    Screen,
    /// Microphone audio.
    Microphone,
}

/// Stream description embedded in a sample buffer.
///
/// Mirrors the fields of Core Audio's `AudioStreamBasicDescription` that
/// matter for linear PCM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamDescription {
    /// Frames per second.
    pub sample_rate: f64,
    /// Four-character format code, [`FORMAT_ID_LINEAR_PCM`] for PCM.
    pub format_id: u32,
    /// `FORMAT_FLAG_*` bits.
    pub format_flags: u32,
    /// Bytes in one frame of one plane.
    pub bytes_per_frame: u32,
    /// Channel count.
    pub channels_per_frame: u32,
    /// Bits per sample value.
    pub bits_per_channel: u32,
}

impl StreamDescription {
    /// 32-bit float planar PCM, the layout ScreenCaptureKit usually delivers.
    pub fn float32_planar(sample_rate: u32, channels: u32) -> Self {
        Self {
            sample_rate: f64::from(sample_rate),
            format_id: FORMAT_ID_LINEAR_PCM,
            format_flags: FORMAT_FLAG_IS_FLOAT
                | FORMAT_FLAG_IS_PACKED
                | FORMAT_FLAG_IS_NON_INTERLEAVED,
            bytes_per_frame: 4,
            channels_per_frame: channels,
            bits_per_channel: 32,
        }
    }

    /// Signed 16-bit interleaved PCM.
    pub fn int16_interleaved(sample_rate: u32, channels: u32) -> Self {
        Self {
            sample_rate: f64::from(sample_rate),
            format_id: FORMAT_ID_LINEAR_PCM,
            format_flags: FORMAT_FLAG_IS_SIGNED_INTEGER | FORMAT_FLAG_IS_PACKED,
            bytes_per_frame: 2 * channels,
            channels_per_frame: channels,
            bits_per_channel: 16,
        }
    }

    /// Returns `true` if the given flag bits are all set.
    pub fn has_flag(&self, flag: u32) -> bool {
        self.format_flags & flag == flag
    }
}

/// One chunk of timestamped audio frames from a capture stream.
///
/// `planes` holds the raw payload in native byte order: a single plane for
/// interleaved audio, or one plane per channel for planar audio.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    /// `false` while the backing data is not yet available.
    pub data_ready: bool,
    /// Embedded stream description, if the buffer carries one.
    pub description: Option<StreamDescription>,
    /// Number of frames (one sample per channel each).
    pub frame_count: usize,
    /// Presentation timestamp on the stream's clock.
    pub presentation_time: Duration,
    /// Raw audio payload.
    pub planes: Vec<Vec<u8>>,
}

impl SampleBuffer {
    /// Creates a ready buffer.
    pub fn new(
        description: StreamDescription,
        frame_count: usize,
        presentation_time: Duration,
        planes: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            data_ready: true,
            description: Some(description),
            frame_count,
            presentation_time,
            planes,
        }
    }

    /// Assembles a buffer exactly as a capture backend received it.
    ///
    /// `description` is whatever the platform embedded in the buffer, `None`
    /// if it carried none; the sink decides whether it is usable. A buffer
    /// whose data is not ready keeps no payload.
    pub fn captured(
        data_ready: bool,
        description: Option<StreamDescription>,
        frame_count: usize,
        presentation_time: Duration,
        planes: Vec<Vec<u8>>,
    ) -> Self {
        if !data_ready {
            return Self::not_ready(presentation_time);
        }
        Self {
            data_ready,
            description,
            frame_count,
            presentation_time,
            planes,
        }
    }

    /// Creates a buffer whose data is not ready yet.
    pub fn not_ready(presentation_time: Duration) -> Self {
        Self {
            data_ready: false,
            description: None,
            frame_count: 0,
            presentation_time,
            planes: Vec::new(),
        }
    }

    /// Builds a planar f32 buffer from per-channel samples.
    ///
    /// Channels shorter than the first are treated as a malformed payload by
    /// the sink, which is handy for exercising copy failures.
    pub fn from_planar_f32(
        sample_rate: u32,
        channels: &[Vec<f32>],
        presentation_time: Duration,
    ) -> Self {
        let frame_count = channels.first().map_or(0, Vec::len);
        let planes = channels
            .iter()
            .map(|channel| channel.iter().flat_map(|s| s.to_le_bytes()).collect())
            .collect();
        Self::new(
            StreamDescription::float32_planar(sample_rate, channels.len() as u32),
            frame_count,
            presentation_time,
            planes,
        )
    }

    /// Builds an interleaved i16 buffer.
    pub fn from_interleaved_i16(
        sample_rate: u32,
        channels: u16,
        samples: &[i16],
        presentation_time: Duration,
    ) -> Self {
        let frame_count = if channels == 0 {
            0
        } else {
            samples.len() / usize::from(channels)
        };
        let plane = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(
            StreamDescription::int16_interleaved(sample_rate, u32::from(channels)),
            frame_count,
            presentation_time,
            vec![plane],
        )
    }

    /// Total payload bytes across all planes.
    pub fn payload_len(&self) -> usize {
        self.planes.iter().map(Vec::len).sum()
    }

    /// Duration of this buffer at the given sample rate.
    pub fn duration_at(&self, sample_rate: u32) -> Duration {
        if sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count as f64 / f64::from(sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lpcm_fourcc() {
        assert_eq!(FORMAT_ID_LINEAR_PCM, 0x6C70_636D);
    }

    #[test]
    fn test_planar_f32_layout() {
        let buffer = SampleBuffer::from_planar_f32(
            48000,
            &[vec![0.5; 480], vec![-0.5; 480]],
            Duration::ZERO,
        );
        assert_eq!(buffer.frame_count, 480);
        assert_eq!(buffer.planes.len(), 2);
        assert_eq!(buffer.payload_len(), 480 * 4 * 2);
        let description = buffer.description.unwrap();
        assert!(description.has_flag(FORMAT_FLAG_IS_NON_INTERLEAVED));
        assert!(description.has_flag(FORMAT_FLAG_IS_FLOAT));
    }

    #[test]
    fn test_interleaved_i16_layout() {
        let buffer = SampleBuffer::from_interleaved_i16(44100, 2, &[1, 2, 3, 4], Duration::ZERO);
        assert_eq!(buffer.frame_count, 2);
        assert_eq!(buffer.planes, vec![vec![1, 0, 2, 0, 3, 0, 4, 0]]);
    }

    #[test]
    fn test_not_ready_buffer() {
        let buffer = SampleBuffer::not_ready(Duration::from_millis(10));
        assert!(!buffer.data_ready);
        assert!(buffer.description.is_none());
        assert_eq!(buffer.payload_len(), 0);
    }

    #[test]
    fn test_captured_keeps_embedded_description() {
        let description = StreamDescription::int16_interleaved(44100, 1);
        let buffer = SampleBuffer::captured(
            true,
            Some(description),
            3,
            Duration::from_millis(5),
            vec![vec![0; 6]],
        );
        assert!(buffer.data_ready);
        assert_eq!(buffer.description, Some(description));
        assert_eq!(buffer.frame_count, 3);

        let bare = SampleBuffer::captured(true, None, 3, Duration::ZERO, vec![vec![0; 6]]);
        assert!(bare.data_ready);
        assert!(bare.description.is_none());
    }

    #[test]
    fn test_captured_not_ready_drops_payload() {
        let buffer = SampleBuffer::captured(
            false,
            Some(StreamDescription::float32_planar(48000, 2)),
            480,
            Duration::from_millis(10),
            vec![vec![0; 1920], vec![0; 1920]],
        );
        assert!(!buffer.data_ready);
        assert_eq!(buffer.payload_len(), 0);
        assert_eq!(buffer.presentation_time, Duration::from_millis(10));
    }

    #[test]
    fn test_duration_at() {
        let buffer = SampleBuffer::from_planar_f32(48000, &[vec![0.0; 4800]], Duration::ZERO);
        assert_eq!(buffer.duration_at(48000), Duration::from_millis(100));
        assert_eq!(buffer.duration_at(0), Duration::ZERO);
    }
}
