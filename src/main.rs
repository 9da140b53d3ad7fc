#![deny(missing_docs)]
#![deny(warnings)]

//! Batch tool that equalizes clip lengths inside MUSHRA stimulus groups.

use std::path::PathBuf;

use stimprep::logging;
use stimprep::manifest;
use stimprep::reconcile;

/// Upper bound accepted for `--max-duration`; a full day of audio is already
/// far beyond any listening-test clip and keeps frame math in range.
const MAX_DURATION_BOUND: f64 = 86_400.0;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let manifest_path = options
        .manifest
        .unwrap_or_else(|| PathBuf::from(manifest::DEFAULT_MANIFEST));
    let manifest = manifest::load(&manifest_path).map_err(|err| err.to_string())?;
    let max_duration = options
        .max_duration_seconds
        .unwrap_or(manifest.settings.max_duration_seconds);
    tracing::info!(
        "Processing {} group(s) from {} (max duration {max_duration} s)",
        manifest.groups.len(),
        manifest_path.display()
    );

    run_groups(&manifest.groups, max_duration, options.keep_going)?;

    println!(
        "Audio processing complete. All files in each group now share one length and a stereo layout."
    );
    Ok(())
}

/// Process groups in listed order.
///
/// Without `keep_going` the first failing group aborts the run and later
/// groups are never touched. With it every group is attempted, failures are
/// logged as they happen, and an error summarizing them is returned at the
/// end so the process still exits nonzero.
fn run_groups(
    groups: &[manifest::Group],
    max_duration: f64,
    keep_going: bool,
) -> Result<(), String> {
    let mut failed_groups = 0usize;
    for (index, group) in groups.iter().enumerate() {
        match reconcile::reconcile_group(group, max_duration) {
            Ok(target_frames) => tracing::info!(
                "Group {}/{}: {} file(s) set to {target_frames} frames ({})",
                index + 1,
                groups.len(),
                group.stimuli.len() + 1,
                group.reference.display()
            ),
            Err(err) if keep_going => {
                failed_groups += 1;
                tracing::error!("Group {} failed, continuing: {err}", index + 1);
            }
            Err(err) => return Err(format!("Group {} failed: {err}", index + 1)),
        }
    }
    if failed_groups > 0 {
        return Err(format!(
            "{failed_groups} of {} group(s) failed; the rest were processed.",
            groups.len()
        ));
    }
    Ok(())
}

#[derive(Default)]
struct Options {
    manifest: Option<PathBuf>,
    max_duration_seconds: Option<f64>,
    keep_going: bool,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--manifest" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--manifest requires a value".to_string())?;
                options.manifest = Some(PathBuf::from(value));
            }
            "--max-duration" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--max-duration requires a value".to_string())?;
                let seconds: f64 = value
                    .parse()
                    .map_err(|_| format!("--max-duration is not a number: {value}"))?;
                if !seconds.is_finite() || seconds <= 0.0 || seconds > MAX_DURATION_BOUND {
                    return Err(format!(
                        "--max-duration must be between 0 and {MAX_DURATION_BOUND} seconds: {value}"
                    ));
                }
                options.max_duration_seconds = Some(seconds);
            }
            "--keep-going" => {
                options.keep_going = true;
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "stimprep: equalize clip lengths inside MUSHRA stimulus groups.",
        "",
        "Rewrites every file of each group in place so that the reference and",
        "its stimuli share one sample length (zero-padded or trimmed), in",
        "stereo, at their native sample rate.",
        "",
        "Usage: stimprep [--manifest <path>] [--max-duration <seconds>] [--keep-going]",
        "",
        "  --manifest <path>        Group manifest (default: stimprep.toml)",
        "  --max-duration <seconds> Duration cap override (default: 11.9)",
        "  --keep-going             Process remaining groups when one fails",
        "  -h, --help               Show this help",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_empty() {
        let options = parse_args(Vec::new()).unwrap().unwrap();
        assert!(options.manifest.is_none());
        assert!(options.max_duration_seconds.is_none());
        assert!(!options.keep_going);
    }

    #[test]
    fn parses_all_flags() {
        let options = parse_args(
            ["--manifest", "groups.toml", "--max-duration", "8.5", "--keep-going"]
                .map(String::from)
                .to_vec(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(options.manifest, Some(PathBuf::from("groups.toml")));
        assert_eq!(options.max_duration_seconds, Some(8.5));
        assert!(options.keep_going);
    }

    #[test]
    fn help_short_circuits() {
        assert!(parse_args(vec!["--help".to_string()]).unwrap().is_none());
    }

    #[test]
    fn rejects_unknown_and_invalid_values() {
        assert!(parse_args(vec!["--frobnicate".to_string()]).is_err());
        assert!(parse_args(["--max-duration", "fast"].map(String::from).to_vec()).is_err());
        assert!(parse_args(["--max-duration", "-2"].map(String::from).to_vec()).is_err());
        assert!(parse_args(["--max-duration", "1e9"].map(String::from).to_vec()).is_err());
        assert!(parse_args(["--max-duration", "inf"].map(String::from).to_vec()).is_err());
        assert!(parse_args(vec!["--manifest".to_string()]).is_err());
    }

    mod driver {
        use super::super::run_groups;
        use hound::{SampleFormat, WavSpec, WavWriter};
        use std::path::{Path, PathBuf};
        use stimprep::manifest::Group;
        use tempfile::TempDir;

        fn write_wav(dir: &Path, name: &str, frames: usize) -> PathBuf {
            let path = dir.join(name);
            let spec = WavSpec {
                channels: 1,
                sample_rate: 8_000,
                bits_per_sample: 32,
                sample_format: SampleFormat::Float,
            };
            let mut writer = WavWriter::create(&path, spec).unwrap();
            for _ in 0..frames {
                writer.write_sample(0.5f32).unwrap();
            }
            writer.finalize().unwrap();
            path
        }

        fn wav_shape(path: &Path) -> (u16, usize) {
            let reader = hound::WavReader::open(path).unwrap();
            let spec = reader.spec();
            (spec.channels, reader.duration() as usize)
        }

        fn two_groups(dir: &TempDir) -> (Vec<Group>, PathBuf) {
            let broken = Group {
                reference: dir.path().join("absent.wav"),
                stimuli: vec![write_wav(dir.path(), "orphan.wav", 100)],
            };
            let healthy_stimulus = write_wav(dir.path(), "stim2.wav", 300);
            let healthy = Group {
                reference: write_wav(dir.path(), "ref2.wav", 200),
                stimuli: vec![healthy_stimulus.clone()],
            };
            (vec![broken, healthy], healthy_stimulus)
        }

        #[test]
        fn broken_group_aborts_the_rest_by_default() {
            let dir = TempDir::new().unwrap();
            let (groups, later_stimulus) = two_groups(&dir);

            let err = run_groups(&groups, 1.0, false).unwrap_err();
            assert!(err.starts_with("Group 1 failed"), "{err}");
            // The second group was never reached: still mono at its
            // original length.
            assert_eq!(wav_shape(&later_stimulus), (1, 300));
        }

        #[test]
        fn keep_going_processes_later_groups_and_still_fails() {
            let dir = TempDir::new().unwrap();
            let (groups, later_stimulus) = two_groups(&dir);

            let err = run_groups(&groups, 1.0, true).unwrap_err();
            assert!(err.starts_with("1 of 2 group(s) failed"), "{err}");
            // The second group was rewritten: stereo, reconciled to its
            // longest clip.
            assert_eq!(wav_shape(&later_stimulus), (2, 300));
        }

        #[test]
        fn all_groups_succeeding_is_ok_in_both_modes() {
            let dir = TempDir::new().unwrap();
            let group = Group {
                reference: write_wav(dir.path(), "ref.wav", 200),
                stimuli: vec![write_wav(dir.path(), "stim.wav", 300)],
            };

            run_groups(std::slice::from_ref(&group), 1.0, false).unwrap();
            run_groups(std::slice::from_ref(&group), 1.0, true).unwrap();
        }
    }
}
