//! Symphonia-based decoding to interleaved `f32` at the file's native rate.

use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use thiserror::Error;

use crate::clip::AudioClip;

/// Errors raised while decoding an input file.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file could not be opened.
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The file could not be probed or decoded.
    #[error("Audio decode failed for {path}: {message}")]
    Decode {
        /// Path that failed to decode.
        path: PathBuf,
        /// Decoder diagnostic.
        message: String,
    },
    /// The stream produced no samples at all.
    #[error("Decoded 0 samples from {path}")]
    Empty {
        /// Path of the empty stream.
        path: PathBuf,
    },
}

/// Decode a file into an [`AudioClip`] at its native sample rate.
///
/// The full stream is decoded; no resampling and no duration cap is applied
/// here, since the reconciler needs the true native length of every clip.
pub fn decode_audio(path: &Path) -> Result<AudioClip, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| decode_error(path, format!("probe failed: {err}")))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| decode_error(path, "no default track".to_string()))?;
    let codec_params = &track.codec_params;
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| decode_error(path, "missing sample rate".to_string()))?;
    let channels = codec_params
        .channels
        .ok_or_else(|| decode_error(path, "missing channel count".to_string()))?
        .count() as u16;

    let mut decoder = symphonia::default::get_codecs()
        .make(codec_params, &DecoderOptions::default())
        .map_err(|err| decode_error(path, format!("unsupported codec: {err}")))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break,
            Err(err) => {
                return Err(decode_error(path, format!("packet read failed: {err}")));
            }
        };
        let audio_buf = match decoder.decode(&packet) {
            Ok(audio_buf) => audio_buf,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(err) => {
                return Err(decode_error(path, format!("decode failed: {err}")));
            }
        };
        let spec = *audio_buf.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(DecodeError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(AudioClip {
        samples,
        sample_rate: sample_rate.max(1),
        channels: channels.max(1),
    })
}

fn decode_error(path: &Path, message: String) -> DecodeError {
    DecodeError::Decode {
        path: path.to_path_buf(),
        message,
    }
}
