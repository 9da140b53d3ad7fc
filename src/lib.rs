//! Library exports for reuse in integration tests.
/// Interleaved audio clip model and length adjustment.
pub mod clip;
/// Symphonia-based audio decoding.
pub mod decode;
/// WAV encoding with atomic in-place replacement.
pub mod encode;
/// Logging setup for the tool.
pub mod logging;
/// TOML manifest of stimulus groups.
pub mod manifest;
/// Per-group length reconciliation.
pub mod reconcile;
