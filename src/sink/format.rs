//! Audio format discovered from the first sample buffer of a recording.

use std::fmt;

use crate::buffer::{
    StreamDescription, FORMAT_FLAG_IS_BIG_ENDIAN, FORMAT_FLAG_IS_FLOAT,
    FORMAT_FLAG_IS_NON_INTERLEAVED, FORMAT_FLAG_IS_SIGNED_INTEGER, FORMAT_ID_LINEAR_PCM,
};
use crate::SinkError;

/// Representation of individual sample values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// IEEE float.
    Float,
    /// Signed integer.
    Int,
}

/// Linear PCM format of a recording.
///
/// Derived once from the first usable buffer and fixed for the rest of the
/// session. The WAV header written for the recording describes exactly this
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Frames per second.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Bits per sample value.
    pub bits_per_sample: u16,
    /// Float or integer samples.
    pub sample_kind: SampleKind,
    /// `true` for one interleaved plane, `false` for one plane per channel.
    pub interleaved: bool,
}

impl AudioFormat {
    /// Translates an embedded stream description into a usable PCM format.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Format`] for anything the WAV container cannot
    /// hold without converting samples: non-PCM data, big-endian data,
    /// float widths other than 32 bits, unsigned integers, integer widths other
    /// than 8/16/24/32 bits, or inconsistent frame sizes.
    pub fn from_description(description: &StreamDescription) -> Result<Self, SinkError> {
        if description.format_id != FORMAT_ID_LINEAR_PCM {
            let code = description.format_id.to_be_bytes();
            return Err(SinkError::format(format!(
                "not linear PCM (format '{}')",
                String::from_utf8_lossy(&code)
            )));
        }
        if description.has_flag(FORMAT_FLAG_IS_BIG_ENDIAN) {
            return Err(SinkError::format("big-endian samples"));
        }

        let rate = description.sample_rate;
        if !rate.is_finite() || rate < 1.0 || rate > f64::from(u32::MAX) {
            return Err(SinkError::format(format!("invalid sample rate {rate}")));
        }

        let channels = u16::try_from(description.channels_per_frame)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| {
                SinkError::format(format!(
                    "invalid channel count {}",
                    description.channels_per_frame
                ))
            })?;

        let bits = description.bits_per_channel;
        let sample_kind = if description.has_flag(FORMAT_FLAG_IS_FLOAT) {
            if bits != 32 {
                return Err(SinkError::format(format!("{bits}-bit float samples")));
            }
            SampleKind::Float
        } else {
            if !matches!(bits, 8 | 16 | 24 | 32) {
                return Err(SinkError::format(format!("{bits}-bit integer samples")));
            }
            if !description.has_flag(FORMAT_FLAG_IS_SIGNED_INTEGER) {
                return Err(SinkError::format(format!("unsigned {bits}-bit samples")));
            }
            SampleKind::Int
        };

        let interleaved = !description.has_flag(FORMAT_FLAG_IS_NON_INTERLEAVED);
        let format = Self {
            sample_rate: rate.round() as u32,
            channels,
            bits_per_sample: bits as u16,
            sample_kind,
            interleaved,
        };

        // Zero means "unspecified" in Core Audio descriptions.
        if description.bytes_per_frame != 0
            && description.bytes_per_frame as usize != format.plane_frame_bytes()
        {
            return Err(SinkError::format(format!(
                "{} bytes per frame does not match {} channel(s) of {}-bit samples",
                description.bytes_per_frame, channels, bits
            )));
        }

        Ok(format)
    }

    /// Bytes occupied by one sample value.
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    /// Bytes occupied by one frame within a single plane.
    pub fn plane_frame_bytes(&self) -> usize {
        if self.interleaved {
            self.bytes_per_sample() * usize::from(self.channels)
        } else {
            self.bytes_per_sample()
        }
    }

    /// Number of planes a buffer in this format carries.
    pub fn plane_count(&self) -> usize {
        if self.interleaved {
            1
        } else {
            usize::from(self.channels)
        }
    }

    /// The WAV spec matching this format.
    pub fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: match self.sample_kind {
                SampleKind::Float => hound::SampleFormat::Float,
                SampleKind::Int => hound::SampleFormat::Int,
            },
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.sample_kind {
            SampleKind::Float => "float",
            SampleKind::Int => "int",
        };
        let layout = if self.interleaved {
            "interleaved"
        } else {
            "planar"
        };
        write!(
            f,
            "{} Hz, {} ch, {}-bit {} {}",
            self.sample_rate, self.channels, self.bits_per_sample, kind, layout
        )
    }
}
