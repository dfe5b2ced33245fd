// Generator configuration, loaded from JSON.
//
// Everything the CLI can set has a config field with the same default, so a
// session can be pinned in a file and replayed. String-valued fields (root,
// mode, scale, time signature) are kept as text here and validated by
// `resolve()`, which runs the same parsers the CLI uses. Resolution happens
// before any generation work, so a bad config never produces partial output.

use crate::error::Result;
use crate::melody::MELODY_METER;
use crate::theory::{Mode, Note, ScaleKey};
use crate::time::{TickResolution, TimeSignature};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Raw, unvalidated settings as they appear in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Ticks per quarter note.
    pub ticks_per_quarter: u32,
    /// "N/D", applies to the chord track.
    pub time_signature: String,
    /// Key root: pitch name ("C4") or MIDI number ("60").
    pub root: String,
    /// "minor" or "major".
    pub mode: String,
    /// Melody scale; when absent the mode's pentatonic is used.
    pub scale: Option<String>,
    pub bpm: u32,
    pub bars: usize,
    pub output_dir: PathBuf,
    /// Fixed seed for reproducible output.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            ticks_per_quarter: TickResolution::STANDARD.ticks_per_quarter() as u32,
            time_signature: TimeSignature::COMMON.to_string(),
            root: "C4".to_string(),
            mode: "minor".to_string(),
            scale: None,
            bpm: 85,
            bars: 4,
            output_dir: PathBuf::from("output"),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: GeneratorConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Validate every field into typed settings.
    pub fn resolve(&self) -> Result<Settings> {
        let mode: Mode = self.mode.parse()?;
        let scale = match &self.scale {
            Some(s) => s.parse()?,
            None => mode.pentatonic(),
        };
        let resolution = TickResolution::new(self.ticks_per_quarter)?;
        let time_signature: TimeSignature = self.time_signature.parse()?;
        time_signature.span_ticks(self.bars, resolution)?;
        MELODY_METER.span_ticks(self.bars, resolution)?;
        Ok(Settings {
            resolution,
            time_signature,
            root: self.root.parse()?,
            mode,
            scale,
            bpm: self.bpm,
            bars: self.bars,
            output_dir: self.output_dir.clone(),
            seed: self.seed,
        })
    }
}

/// Validated settings, ready for the render pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub resolution: TickResolution,
    pub time_signature: TimeSignature,
    pub root: Note,
    pub mode: Mode,
    pub scale: ScaleKey,
    pub bpm: u32,
    pub bars: usize,
    pub output_dir: PathBuf,
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MusicError;

    #[test]
    fn test_default_config_resolves() {
        let settings = GeneratorConfig::default().resolve().unwrap();
        assert_eq!(settings.resolution, TickResolution::STANDARD);
        assert_eq!(settings.time_signature, TimeSignature::COMMON);
        assert_eq!(settings.root, Note::MIDDLE_C);
        assert_eq!(settings.mode, Mode::Minor);
        assert_eq!(settings.scale, ScaleKey::MinorPentatonic);
        assert_eq!(settings.bpm, 85);
        assert_eq!(settings.bars, 4);
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn test_default_config_serializes() {
        let config = GeneratorConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "root": "A3",
            "mode": "major",
            "time_signature": "6/8",
            "seed": 42
        }"#;
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.bpm, 85);
        let settings = config.resolve().unwrap();
        assert_eq!(settings.root.pitch(), 57);
        assert_eq!(settings.mode, Mode::Major);
        assert_eq!(settings.scale, ScaleKey::MajorPentatonic);
        assert_eq!(settings.time_signature, TimeSignature::new(6, 8).unwrap());
        assert_eq!(settings.seed, Some(42));
    }

    #[test]
    fn test_explicit_scale_overrides_mode_default() {
        let config = GeneratorConfig {
            scale: Some("natural_minor".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve().unwrap().scale, ScaleKey::NaturalMinor);
    }

    #[test]
    fn test_invalid_fields_fail_fast() {
        let bad_mode = GeneratorConfig {
            mode: "lydian".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_mode.resolve(), Err(MusicError::InvalidMode(_))));

        let bad_scale = GeneratorConfig {
            scale: Some("blues".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_scale.resolve(), Err(MusicError::InvalidScaleKey(_))));

        let bad_root = GeneratorConfig {
            root: "H2".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_root.resolve(), Err(MusicError::InvalidPitchClass(_))));

        let bad_res = GeneratorConfig {
            ticks_per_quarter: 100,
            ..Default::default()
        };
        assert!(matches!(bad_res.resolve(), Err(MusicError::InvalidTickResolution(100))));

        let bad_bars = GeneratorConfig {
            bars: usize::MAX / 2,
            ..Default::default()
        };
        assert!(matches!(bad_bars.resolve(), Err(MusicError::TooManyBars(_))));

        let bad_root = GeneratorConfig {
            root: "C999999999".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_root.resolve(), Err(MusicError::OutOfRangeNote(_))));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = serde_json::from_str::<GeneratorConfig>("{ \"bars\": \"four\" }").unwrap_err();
        let err: MusicError = err.into();
        assert!(matches!(err, MusicError::Config(_)));
    }
}
