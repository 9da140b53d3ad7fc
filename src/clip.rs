//! Interleaved audio clip model and length adjustment.

/// Decoded audio in interleaved `f32` samples.
///
/// Length is measured in frames (one sample per channel); `samples.len()` is
/// always a multiple of `channels`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Interleaved sample values in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Native sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count; 1 for mono, 2 for stereo.
    pub channels: u16,
}

impl AudioClip {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }
}

/// Force a clip to exactly `target_frames` frames.
///
/// Shorter clips get zero frames (silence) appended; longer clips are
/// truncated to their first `target_frames` frames; equal length is a no-op.
/// The channel layout is preserved.
pub fn pad_or_trim(clip: &mut AudioClip, target_frames: usize) {
    let channels = clip.channels.max(1) as usize;
    clip.samples.resize(target_frames.saturating_mul(channels), 0.0);
}

/// Widen a mono clip to stereo by duplicating its channel.
///
/// Clips that already have two or more channels are returned unchanged.
pub fn to_stereo(clip: AudioClip) -> AudioClip {
    if clip.channels >= 2 {
        return clip;
    }
    let mut samples = Vec::with_capacity(clip.samples.len() * 2);
    for &value in &clip.samples {
        samples.push(value);
        samples.push(value);
    }
    AudioClip {
        samples,
        sample_rate: clip.sample_rate,
        channels: 2,
    }
}
