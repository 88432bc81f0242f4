//! Render pipeline
//!
//! One render is one sequential pass:
//! 1. Parse the timeline and match clips (input errors stop here)
//! 2. Start the encoder worker
//! 3. Decode every matched clip once
//! 4. Build and validate transform plans
//! 5. Process each clip, in timeline order
//! 6. Place and mix into the master buffer
//! 7. Encode the master buffer
//!
//! Per-clip failures are recorded in the report and the render carries on.
//! Every other failure aborts the render and is returned together with the
//! partial report.

use super::mixdown::{mixdown, offset_frames, PlacedClip};
use super::{RenderFailure, RenderOutput, RenderRequest};
use crate::audio::lanczos::LanczosResampler;
use crate::audio::silence::SilenceTrimmer;
use crate::audio::tempo::TempoStretcher;
use crate::audio::types::{AudioClip, MASTER_SAMPLE_RATE};
use crate::clips::{ClipLibrary, ClipSource};
use crate::encoder::{EncodeRequest, EncoderFactory, EncoderSession};
use crate::error::{Error, Result};
use crate::plan::{build_plans, Stage, TransformPlan};
use crate::progress::{self, ProgressTracker};
use crate::report::{MergedTrackInfo, ProcessReport};
use crate::timeline::{match_clips, parse_srt, MatchedPair};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Block size used when streaming a channel through the Lanczos resampler
const RESAMPLE_BLOCK: usize = 8192;

/// Run a whole render on the current thread.
///
/// The report is returned exactly once: inside [`RenderOutput`] on success,
/// inside [`RenderFailure`] (with the fatal message appended to `errors`)
/// otherwise.
pub fn run_render<F: EncoderFactory>(
    request: RenderRequest,
    factory: F,
    tracker: &mut ProgressTracker,
    cancel: Option<&CancellationToken>,
) -> std::result::Result<RenderOutput, RenderFailure> {
    let mut report = ProcessReport::new();

    match render_inner(request, factory, tracker, cancel, &mut report) {
        Ok(bytes) => {
            tracker.update("Finished", progress::FINISHED_PERCENT);
            tracker.completed(bytes.len(), report.merged_tracks.len());
            info!(
                render_id = %tracker.render_id(),
                output_bytes = bytes.len(),
                "{}",
                report.summary()
            );
            Ok(RenderOutput { bytes, report })
        }
        Err(e) => {
            let message = e.to_string();
            error!(render_id = %tracker.render_id(), "Render failed: {}", message);
            report.errors.push(message.clone());
            tracker.failed(&message);
            Err(RenderFailure { error: e, report })
        }
    }
}

fn render_inner<F: EncoderFactory>(
    request: RenderRequest,
    factory: F,
    tracker: &mut ProgressTracker,
    cancel: Option<&CancellationToken>,
    report: &mut ProcessReport,
) -> Result<Vec<u8>> {
    let RenderRequest {
        timeline,
        clips,
        config,
    } = request;

    config.validate()?;

    let timeline = parse_srt(&timeline)?;
    tracker.started(timeline.len(), clips.len());

    let matches = match_clips(&timeline.entries, &clips);
    report.missing_files = matches.missing.clone();
    for entry in &report.missing_files {
        warn!(clip_id = entry.id, "No clip for timeline entry");
    }
    let matches = matches.require_matches()?;
    tracker.update("Matching clips to timeline", progress::MATCHING_PERCENT);

    check_cancelled(cancel)?;
    let mut session = EncoderSession::start(factory, cancel.cloned())?;
    tracker.update("Encoder loaded", progress::ENCODER_LOADED_PERCENT);

    load_clips(&matches.matched, cancel)?;
    tracker.update("Audio clips loaded", progress::CLIPS_LOADED_PERCENT);

    let plans = build_plans(&matches.matched, &config);
    tracker.update("Transform plans built", progress::PLANS_BUILT_PERCENT);

    let master = render_plans(&plans, &clips, tracker, cancel, report)?;
    report.rendered_duration = master.duration_seconds();
    tracker.update("Mixdown complete", progress::MIXDOWN_PERCENT);

    let request = EncodeRequest {
        channels: master.channels,
        sample_rate: master.sample_rate,
    };
    let bytes = session.encode(request, |p| {
        tracker.update("Encoding MP3", progress::encoding_percent(p));
    })?;
    drop(session);
    tracker.update("Encoding complete", progress::COMPLETE_PERCENT);

    Ok(bytes)
}

/// Decode each distinct matched clip, caching the audio on its source.
///
/// Clips that fail to decode are left for [`render_plans`] to report against
/// each entry using them. Returns the number of clips decoded.
pub fn load_clips(matched: &[MatchedPair], cancel: Option<&CancellationToken>) -> Result<usize> {
    let mut seen = HashSet::new();
    let mut loaded = 0;

    for pair in matched {
        if !seen.insert(pair.clip.id) {
            continue;
        }
        check_cancelled(cancel)?;
        match pair.clip.decoded() {
            Ok(_) => loaded += 1,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => debug!(clip_id = pair.clip.id, "Clip did not decode: {}", e),
        }
    }

    info!("Loaded {} of {} audio clips", loaded, seen.len());
    Ok(loaded)
}

/// Process every plan and mix the results.
///
/// Successful clips are recorded in `report.merged_tracks`, failed ones in
/// `report.errors`.
pub fn render_plans(
    plans: &[TransformPlan],
    clips: &ClipLibrary,
    tracker: &mut ProgressTracker,
    cancel: Option<&CancellationToken>,
    report: &mut ProcessReport,
) -> Result<AudioClip> {
    let mut placed = Vec::with_capacity(plans.len());
    let mut failed = 0;

    for (index, plan) in plans.iter().enumerate() {
        check_cancelled(cancel)?;

        let result = clips
            .get(&plan.source_id)
            .ok_or_else(|| Error::InvalidPlan(format!("no clip with id {}", plan.source_id)))
            .and_then(|clip| process_clip(plan, clip));

        match result {
            Ok(audio) => {
                let offset_seconds = plan.offset_seconds();
                debug!(
                    clip_id = plan.source_id,
                    file_name = %plan.file_name,
                    offset_seconds,
                    frames = audio.frames(),
                    "Clip processed"
                );
                report.add_merged(MergedTrackInfo {
                    source_id: plan.source_id,
                    file_name: plan.file_name.clone(),
                    start_time: plan.entry.start_time,
                    original_duration: plan.entry.duration(),
                    scheduled_duration: plan.scheduled_duration(),
                });
                placed.push(PlacedClip {
                    source_id: plan.source_id,
                    offset_frames: offset_frames(offset_seconds, audio.sample_rate),
                    audio,
                });
            }
            Err(e) if !e.is_fatal() => {
                failed += 1;
                warn!(
                    clip_id = plan.source_id,
                    file_name = %plan.file_name,
                    "Clip failed: {}",
                    e
                );
                report.add_clip_error(&plan.file_name, &e);
                tracker.clip_failed(plan.source_id, &e.to_string());
            }
            Err(e) => return Err(e),
        }

        tracker.update(
            &format!("Processed {}", plan.file_name),
            progress::clip_percent(index, plans.len()),
        );
    }

    if failed > 0 && failed == plans.len() {
        return Err(Error::AllClipsFailed { failed });
    }

    mixdown(&placed, MASTER_SAMPLE_RATE)
}

/// Decode a clip and run the plan's stages on it
pub fn process_clip(plan: &TransformPlan, clip: &ClipSource) -> Result<AudioClip> {
    plan.validate()?;

    let mut audio = clip.decoded()?.clone();
    for stage in &plan.stages {
        audio = apply_stage(stage, audio)?;
    }
    Ok(audio)
}

/// Apply one stage; `Place` leaves the audio unchanged
pub fn apply_stage(stage: &Stage, mut audio: AudioClip) -> Result<AudioClip> {
    match *stage {
        Stage::SilenceTrim {
            threshold_db,
            min_silence_seconds,
        } => {
            SilenceTrimmer::new(threshold_db, min_silence_seconds)?.trim(&mut audio);
            Ok(audio)
        }
        Stage::Resample { pitch_factor } => {
            let mut channels = Vec::with_capacity(audio.channel_count());
            for samples in &audio.channels {
                let mut resampler = LanczosResampler::new(pitch_factor)?;
                let mut output = Vec::with_capacity((samples.len() as f64 / pitch_factor).ceil() as usize);
                for block in samples.chunks(RESAMPLE_BLOCK) {
                    output.extend(resampler.process(block));
                }
                output.extend(resampler.finish());
                channels.push(output);
            }
            Ok(AudioClip::new(channels, audio.sample_rate))
        }
        Stage::TempoCorrect { rate } => Ok(TempoStretcher::new(rate)?.process(&audio)),
        Stage::DurationTrim { seconds } => {
            let frames = (seconds * audio.sample_rate as f64).round() as usize;
            audio.truncate(frames);
            Ok(audio)
        }
        Stage::Place { .. } => Ok(audio),
    }
}

fn check_cancelled(cancel: Option<&CancellationToken>) -> Result<()> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        return Err(Error::Cancelled);
    }
    Ok(())
}
