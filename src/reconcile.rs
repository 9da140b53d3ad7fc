//! Per-group length reconciliation.
//!
//! For one group (a reference clip plus its stimuli) the reconciler settles
//! on a single target frame count and rewrites every file in the group to
//! exactly that length, in stereo, at the group's native sample rate.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::clip::{self, AudioClip};
use crate::decode::{self, DecodeError};
use crate::encode::{self, EncodeError};
use crate::manifest::Group;

/// Default upper bound on clip duration in seconds.
pub const MAX_DURATION_SECONDS: f64 = 11.9;

/// Errors raised while reconciling a group.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A file in the group failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// A file in the group failed to write back.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// A stimulus was recorded at a different rate than its reference.
    ///
    /// Lengths from different rate spaces cannot be reconciled; the group is
    /// rejected instead of being padded or trimmed in the wrong unit.
    #[error("Sample rate mismatch: {path} is {found} Hz but the group reference is {expected} Hz")]
    SampleRateMismatch {
        /// The offending stimulus path.
        path: PathBuf,
        /// The reference clip's sample rate.
        expected: u32,
        /// The stimulus clip's sample rate.
        found: u32,
    },
}

/// Frame count of the duration cap at `sample_rate`.
pub fn duration_cap_frames(sample_rate: u32, max_duration_seconds: f64) -> usize {
    (max_duration_seconds * f64::from(sample_rate)) as usize
}

/// Final target frame count for a group.
///
/// Starts at the reference length, grows to accommodate longer stimuli, and
/// is always capped at the duration bound. The target only drops below the
/// reference's own length when the reference itself exceeds the cap.
pub fn target_frames(
    reference_frames: usize,
    stimulus_frames: impl IntoIterator<Item = usize>,
    cap_frames: usize,
) -> usize {
    let mut target = reference_frames.min(cap_frames);
    for frames in stimulus_frames {
        target = target.max(frames).min(cap_frames);
    }
    target
}

/// Rewrite every file in `group` to one common frame count.
///
/// All clips are decoded up front, the target length is settled, and each
/// clip is padded or trimmed and written back over its original path. Returns
/// the target frame count applied to the group.
///
/// A failure part way through the write phase leaves the group partially
/// rewritten; individual files are replaced atomically, but there is no
/// group-level rollback.
pub fn reconcile_group(group: &Group, max_duration_seconds: f64) -> Result<usize, ReconcileError> {
    let reference = decode::decode_audio(&group.reference)?;
    let cap = duration_cap_frames(reference.sample_rate, max_duration_seconds);

    let mut stimuli = Vec::with_capacity(group.stimuli.len());
    for path in &group.stimuli {
        let stimulus = decode::decode_audio(path)?;
        if stimulus.sample_rate != reference.sample_rate {
            return Err(ReconcileError::SampleRateMismatch {
                path: path.clone(),
                expected: reference.sample_rate,
                found: stimulus.sample_rate,
            });
        }
        stimuli.push(stimulus);
    }

    let target = target_frames(
        reference.frames(),
        stimuli.iter().map(AudioClip::frames),
        cap,
    );
    debug!(
        reference = %group.reference.display(),
        stimuli = stimuli.len(),
        sample_rate = reference.sample_rate,
        target_frames = target,
        "reconciling group"
    );

    write_at_length(&group.reference, reference, target)?;
    for (path, stimulus) in group.stimuli.iter().zip(stimuli) {
        write_at_length(path, stimulus, target)?;
    }
    Ok(target)
}

fn write_at_length(
    path: &Path,
    mut clip: AudioClip,
    target: usize,
) -> Result<(), ReconcileError> {
    clip::pad_or_trim(&mut clip, target);
    encode::write_wav_in_place(path, clip)?;
    Ok(())
}
