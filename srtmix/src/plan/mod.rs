//! Transform plans
//!
//! A plan is the typed list of signal stages one matched clip goes through
//! before it is placed on the master timeline. Plans are plain data: built
//! fresh for each render, validated once, then executed by the render engine.
//!
//! **Stage order:**
//! 1. `SilenceTrim` (only when sound optimization is on)
//! 2. `Resample` (pitch shift; also changes duration)
//! 3. `TempoCorrect` (duration change at constant pitch)
//! 4. `DurationTrim` (only in truncate mode)
//! 5. `Place` (always present, always last)

use crate::audio::lanczos::pitch_factor;
use crate::audio::silence::{DEFAULT_MIN_SILENCE_SECONDS, DEFAULT_THRESHOLD_DB};
use crate::error::{Error, Result};
use crate::timeline::{MatchedPair, TimedEntry};
use serde::Serialize;
use srtmix_common::{DurationMode, RenderConfig};

/// One processing step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "camelCase")]
pub enum Stage {
    /// Remove leading/trailing silence
    SilenceTrim {
        threshold_db: f32,
        min_silence_seconds: f64,
    },
    /// Lanczos resampling; reads `pitch_factor` input samples per output sample
    Resample { pitch_factor: f64 },
    /// Tempo change at constant pitch; duration scales by `1 / rate`
    TempoCorrect { rate: f64 },
    /// Cut the clip to at most `seconds`
    DurationTrim { seconds: f64 },
    /// Position on the master timeline
    Place { offset_seconds: f64 },
}

impl Stage {
    /// Stage name for logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Stage::SilenceTrim { .. } => "silence-trim",
            Stage::Resample { .. } => "resample",
            Stage::TempoCorrect { .. } => "tempo-correct",
            Stage::DurationTrim { .. } => "duration-trim",
            Stage::Place { .. } => "place",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Stage::SilenceTrim { .. } => 0,
            Stage::Resample { .. } => 1,
            Stage::TempoCorrect { .. } => 2,
            Stage::DurationTrim { .. } => 3,
            Stage::Place { .. } => 4,
        }
    }

    fn validate(&self) -> Result<()> {
        let positive = |label: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidPlan(format!(
                    "{} must be positive and finite, got {}",
                    label, value
                )))
            }
        };

        match *self {
            Stage::SilenceTrim {
                threshold_db,
                min_silence_seconds,
            } => {
                if !threshold_db.is_finite() || threshold_db > 0.0 {
                    return Err(Error::InvalidPlan(format!(
                        "silence threshold must be a non-positive dB value, got {}",
                        threshold_db
                    )));
                }
                if !min_silence_seconds.is_finite() || min_silence_seconds < 0.0 {
                    return Err(Error::InvalidPlan(format!(
                        "minimum silence must be >= 0, got {}",
                        min_silence_seconds
                    )));
                }
                Ok(())
            }
            Stage::Resample { pitch_factor } => positive("pitch factor", pitch_factor),
            Stage::TempoCorrect { rate } => positive("tempo rate", rate),
            Stage::DurationTrim { seconds } => positive("trim duration", seconds),
            Stage::Place { offset_seconds } => {
                if offset_seconds.is_finite() && offset_seconds >= 0.0 {
                    Ok(())
                } else {
                    Err(Error::InvalidPlan(format!(
                        "placement offset must be >= 0, got {}",
                        offset_seconds
                    )))
                }
            }
        }
    }
}

/// Processing plan for one matched clip
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformPlan {
    pub source_id: u32,
    pub file_name: String,
    pub entry: TimedEntry,
    pub stages: Vec<Stage>,
}

impl TransformPlan {
    /// Build the plan for one matched pair under `config`
    pub fn build(pair: &MatchedPair, config: &RenderConfig) -> Self {
        let entry = &pair.entry;
        let span = entry.duration();
        let mut stages = Vec::with_capacity(5);

        if config.sound_optimization {
            stages.push(Stage::SilenceTrim {
                threshold_db: DEFAULT_THRESHOLD_DB,
                min_silence_seconds: DEFAULT_MIN_SILENCE_SECONDS,
            });
        }

        stages.push(Stage::Resample {
            pitch_factor: pitch_factor(config.pitch_shift_semitones),
        });
        stages.push(Stage::TempoCorrect {
            rate: config.playback_rate,
        });

        if config.duration_mode == DurationMode::Truncate && span > 0.0 {
            stages.push(Stage::DurationTrim { seconds: span });
        }

        stages.push(Stage::Place {
            offset_seconds: entry.start_time,
        });

        Self {
            source_id: pair.clip.id,
            file_name: pair.clip.file_name.clone(),
            entry: entry.clone(),
            stages,
        }
    }

    /// Check stage order, uniqueness and parameter ranges
    pub fn validate(&self) -> Result<()> {
        let mut last_rank: Option<u8> = None;
        for stage in &self.stages {
            stage.validate()?;
            let rank = stage.rank();
            if let Some(previous) = last_rank {
                if rank == previous {
                    return Err(Error::InvalidPlan(format!(
                        "duplicated {} stage",
                        stage.name()
                    )));
                }
                if rank < previous {
                    return Err(Error::InvalidPlan(format!(
                        "{} stage is out of order",
                        stage.name()
                    )));
                }
            }
            last_rank = Some(rank);
        }

        match self.stages.last() {
            Some(Stage::Place { .. }) => Ok(()),
            _ => Err(Error::InvalidPlan("plan has no place stage".to_string())),
        }
    }

    /// Placement offset in seconds (0 when the plan has no place stage)
    pub fn offset_seconds(&self) -> f64 {
        self.stages
            .iter()
            .find_map(|stage| match stage {
                Stage::Place { offset_seconds } => Some(*offset_seconds),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// Estimated length on the timeline: the span divided by the tempo rate.
    ///
    /// Ignores silence trimming and the pitch stage's own length change.
    pub fn scheduled_duration(&self) -> f64 {
        let rate = self
            .stages
            .iter()
            .find_map(|stage| match stage {
                Stage::TempoCorrect { rate } => Some(*rate),
                _ => None,
            })
            .unwrap_or(1.0);
        self.entry.duration() / rate
    }
}

/// Build one plan per matched pair, in timeline order
pub fn build_plans(matched: &[MatchedPair], config: &RenderConfig) -> Vec<TransformPlan> {
    matched
        .iter()
        .map(|pair| TransformPlan::build(pair, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clips::ClipSource;
    use std::sync::Arc;

    fn pair(id: u32, start: f64, end: f64) -> MatchedPair {
        MatchedPair {
            entry: TimedEntry {
                id,
                start_time: start,
                end_time: end,
                text: "hello".to_string(),
            },
            clip: Arc::new(ClipSource::new(id, format!("{}.mp3", id), Vec::<u8>::new())),
        }
    }

    fn config(semitones: i32, rate: f64, mode: DurationMode, optimize: bool) -> RenderConfig {
        RenderConfig {
            pitch_shift_semitones: semitones,
            playback_rate: rate,
            duration_mode: mode,
            sound_optimization: optimize,
        }
    }

    #[test]
    fn test_full_stage_order() {
        let plan = TransformPlan::build(
            &pair(4, 1.5, 3.5),
            &config(2, 1.2, DurationMode::Truncate, true),
        );

        let names: Vec<_> = plan.stages.iter().map(Stage::name).collect();
        assert_eq!(
            names,
            vec!["silence-trim", "resample", "tempo-correct", "duration-trim", "place"]
        );
        assert_eq!(plan.source_id, 4);
        assert_eq!(plan.file_name, "4.mp3");
        assert_eq!(plan.offset_seconds(), 1.5);
        assert!(plan.validate().is_ok());

        match plan.stages[1] {
            Stage::Resample { pitch_factor } => {
                assert!((pitch_factor - 2f64.powf(2.0 / 12.0)).abs() < 1e-12)
            }
            other => panic!("unexpected stage {:?}", other),
        }
        assert_eq!(plan.stages[3], Stage::DurationTrim { seconds: 2.0 });
    }

    #[test]
    fn test_keep_mode_without_optimization() {
        let plan = TransformPlan::build(
            &pair(1, 0.0, 2.0),
            &config(0, 1.0, DurationMode::Keep, false),
        );
        let names: Vec<_> = plan.stages.iter().map(Stage::name).collect();
        assert_eq!(names, vec!["resample", "tempo-correct", "place"]);
        assert_eq!(plan.stages[0], Stage::Resample { pitch_factor: 1.0 });
    }

    #[test]
    fn test_scheduled_duration() {
        let plan = TransformPlan::build(
            &pair(1, 0.0, 4.0),
            &config(0, 2.0, DurationMode::Keep, true),
        );
        assert_eq!(plan.scheduled_duration(), 2.0);
    }

    #[test]
    fn test_build_plans_keeps_order() {
        let pairs = vec![pair(3, 5.0, 6.0), pair(1, 0.0, 1.0)];
        let plans = build_plans(&pairs, &RenderConfig::default());
        let ids: Vec<u32> = plans.iter().map(|p| p.source_id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_validate_rejects_bad_plans() {
        let base = TransformPlan::build(
            &pair(1, 0.0, 1.0),
            &config(0, 1.0, DurationMode::Keep, false),
        );

        let mut missing_place = base.clone();
        missing_place.stages.pop();
        assert!(matches!(missing_place.validate(), Err(Error::InvalidPlan(_))));

        let mut out_of_order = base.clone();
        out_of_order.stages.swap(0, 1);
        assert!(out_of_order.validate().is_err());

        let mut duplicated = base.clone();
        duplicated.stages.insert(0, Stage::Resample { pitch_factor: 1.0 });
        assert!(duplicated.validate().is_err());

        let mut bad_factor = base.clone();
        bad_factor.stages[0] = Stage::Resample { pitch_factor: f64::NAN };
        assert!(bad_factor.validate().is_err());

        let mut zero_rate = base.clone();
        zero_rate.stages[1] = Stage::TempoCorrect { rate: 0.0 };
        assert!(zero_rate.validate().is_err());

        let mut negative_offset = base;
        negative_offset.stages[2] = Stage::Place { offset_seconds: -1.0 };
        assert!(negative_offset.validate().is_err());
    }
}
