//! TOML manifest describing the stimulus groups to reconcile.
//!
//! Replaces a hardcoded in-program file list: experiments keep a manifest
//! next to their audio data and the tool is pointed at it.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::reconcile::MAX_DURATION_SECONDS;

/// Manifest file name looked up in the working directory by default.
pub const DEFAULT_MANIFEST: &str = "stimprep.toml";

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read the manifest file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The manifest is not valid TOML or does not match the schema.
    #[error("Invalid manifest at {path}: {source}")]
    ParseToml {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// The manifest lists no groups at all.
    #[error("Manifest {path} lists no groups")]
    NoGroups {
        /// Path of the empty manifest.
        path: PathBuf,
    },
    /// A group has a reference but no stimuli.
    #[error("Group {index} in {path} lists no stimuli")]
    NoStimuli {
        /// Path of the offending manifest.
        path: PathBuf,
        /// One-based group position in the manifest.
        index: usize,
    },
}

/// Tool settings from the manifest's optional `[settings]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Upper bound on clip duration in seconds.
    #[serde(default = "default_max_duration")]
    pub max_duration_seconds: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_duration_seconds: default_max_duration(),
        }
    }
}

fn default_max_duration() -> f64 {
    MAX_DURATION_SECONDS
}

/// One reference clip plus the stimuli derived from it.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    /// Baseline recording the stimuli are compared against.
    pub reference: PathBuf,
    /// Processed variants of the reference, in listed order.
    pub stimuli: Vec<PathBuf>,
}

/// A parsed manifest: settings plus the ordered group list.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Optional `[settings]` table.
    #[serde(default)]
    pub settings: Settings,
    /// `[[group]]` entries, processed in listed order.
    #[serde(default, rename = "group")]
    pub groups: Vec<Group>,
}

/// Load and validate a manifest.
///
/// Relative audio paths are resolved against the manifest file's directory so
/// a manifest can live next to its experiment data.
pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut manifest: Manifest =
        toml::from_str(&text).map_err(|source| ManifestError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;

    if manifest.groups.is_empty() {
        return Err(ManifestError::NoGroups {
            path: path.to_path_buf(),
        });
    }
    for (index, group) in manifest.groups.iter().enumerate() {
        if group.stimuli.is_empty() {
            return Err(ManifestError::NoStimuli {
                path: path.to_path_buf(),
                index: index + 1,
            });
        }
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for group in &mut manifest.groups {
        group.reference = resolve(base, std::mem::take(&mut group.reference));
        for stimulus in &mut group.stimuli {
            *stimulus = resolve(base, std::mem::take(stimulus));
        }
    }
    Ok(manifest)
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("stimprep.toml");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn parses_groups_and_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(
            &dir,
            r#"
[settings]
max_duration_seconds = 5.0

[[group]]
reference = "processed/ref.wav"
stimuli = ["processed/a.wav", "segmented/b.wav"]

[[group]]
reference = "/abs/ref2.wav"
stimuli = ["c.wav"]
"#,
        );

        let manifest = load(&path).unwrap();
        assert_eq!(manifest.settings.max_duration_seconds, 5.0);
        assert_eq!(manifest.groups.len(), 2);
        assert_eq!(
            manifest.groups[0].reference,
            dir.path().join("processed/ref.wav")
        );
        assert_eq!(
            manifest.groups[0].stimuli[1],
            dir.path().join("segmented/b.wav")
        );
        assert_eq!(manifest.groups[1].reference, PathBuf::from("/abs/ref2.wav"));
    }

    #[test]
    fn settings_table_is_optional() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(
            &dir,
            r#"
[[group]]
reference = "ref.wav"
stimuli = ["a.wav"]
"#,
        );

        let manifest = load(&path).unwrap();
        assert_eq!(
            manifest.settings.max_duration_seconds,
            MAX_DURATION_SECONDS
        );
    }

    #[test]
    fn empty_manifest_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "");
        assert!(matches!(load(&path), Err(ManifestError::NoGroups { .. })));
    }

    #[test]
    fn group_without_stimuli_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(
            &dir,
            r#"
[[group]]
reference = "ref.wav"
stimuli = []
"#,
        );
        match load(&path) {
            Err(ManifestError::NoStimuli { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected NoStimuli, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_reports_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(load(&path), Err(ManifestError::Read { .. })));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "[[group]\nreference = ");
        assert!(matches!(load(&path), Err(ManifestError::ParseToml { .. })));
    }
}
