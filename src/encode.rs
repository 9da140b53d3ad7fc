//! WAV encoding with atomic in-place replacement.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::clip::{self, AudioClip};

/// Errors raised while writing a clip back to disk.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Could not create a temporary file next to the target.
    #[error("Failed to stage temporary file for {path}: {source}")]
    Stage {
        /// Target path being replaced.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The WAV encoder rejected the stream.
    #[error("Failed to encode {path}: {source}")]
    Encode {
        /// Target path being replaced.
        path: PathBuf,
        /// Underlying encoder error.
        source: hound::Error,
    },
    /// The finished temporary file could not replace the target.
    #[error("Failed to replace {path}: {source}")]
    Replace {
        /// Target path being replaced.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Write a clip as 32-bit float WAV over `path`, replacing it atomically.
///
/// Mono clips are widened to stereo first; clips with two or more channels
/// keep their layout. The data is staged in a temporary file in the target's
/// directory and renamed over the original, so the target is never left
/// half-written.
pub fn write_wav_in_place(path: &Path, clip: AudioClip) -> Result<(), EncodeError> {
    let clip = clip::to_stereo(clip);
    let spec = WavSpec {
        channels: clip.channels,
        sample_rate: clip.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|source| EncodeError::Stage {
        path: path.to_path_buf(),
        source,
    })?;

    {
        let buf_writer = BufWriter::with_capacity(1024 * 1024, staged.as_file_mut());
        let mut writer =
            WavWriter::new(buf_writer, spec).map_err(|source| EncodeError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
        for &sample in &clip.samples {
            writer
                .write_sample(sample)
                .map_err(|source| EncodeError::Encode {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        writer.finalize().map_err(|source| EncodeError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    }

    staged
        .persist(path)
        .map_err(|err| EncodeError::Replace {
            path: path.to_path_buf(),
            source: err.error,
        })?;
    Ok(())
}
