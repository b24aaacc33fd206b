use std::time::Instant;

use crate::classification::domain::face_classifier::FaceClassifier;
use crate::detection::domain::face_detector::FaceDetector;
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::scenes::domain::scene::Scene;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::tagging::domain::face_tag::FaceTag;
use crate::tagging::domain::sampling_plan::SamplingPlan;
use crate::video::domain::video_reader::VideoReader;

use super::pipeline_logger::PipelineLogger;

/// Progress callback: `(sampled_frames_done, sampled_frames_total)`.
/// Returning `false` cancels the run.
pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Tags every face found in each scene's sampled frames with an actor label.
///
/// Expects an opened reader. Scenes are processed in the order given and
/// each scene seeks independently, so overlapping or unordered scenes are
/// tagged exactly as authored. Per-face and per-frame failures are logged
/// and skipped; a decode failure ends the current scene.
pub struct TagFacesUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
    classifier: Box<dyn FaceClassifier>,
    logger: Box<dyn PipelineLogger>,
    sample_fps: f64,
    on_progress: Option<ProgressFn>,
}

impl TagFacesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
        classifier: Box<dyn FaceClassifier>,
        logger: Box<dyn PipelineLogger>,
        sample_fps: f64,
        on_progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            reader,
            detector,
            embedder,
            classifier,
            logger,
            sample_fps,
            on_progress,
        }
    }

    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
        scenes: &[Scene],
    ) -> Result<Vec<FaceTag>, Box<dyn std::error::Error>> {
        let Self {
            reader,
            detector,
            embedder,
            classifier,
            logger,
            sample_fps,
            on_progress,
        } = self;

        let plans: Vec<SamplingPlan> = scenes
            .iter()
            .map(|s| SamplingPlan::for_scene(s, metadata.fps, *sample_fps))
            .collect();
        let total: usize = plans.iter().map(SamplingPlan::len).sum();
        logger.info(&format!(
            "Tagging {} scenes ({total} sampled frames at {sample_fps} fps)",
            scenes.len()
        ));

        let mut stages = FaceStages {
            detector: &mut **detector,
            embedder: &mut **embedder,
            classifier: &**classifier,
            logger: &mut **logger,
        };
        let mut tags = Vec::new();
        let mut done = 0usize;
        let mut cancelled = false;

        'scenes: for (scene, plan) in scenes.iter().zip(&plans) {
            log::debug!(
                "Scene {} from {} to {} sec: frames {}..{} step {}",
                scene.label(),
                scene.start,
                scene.end,
                plan.start_frame(),
                plan.end_frame(),
                plan.step()
            );
            if plan.is_empty() {
                continue;
            }

            if let Err(e) = reader.seek(plan.start_frame()) {
                stages.logger.warn(&format!(
                    "Cannot seek to scene {} (frame {}): {e}",
                    scene.label(),
                    plan.start_frame()
                ));
                continue;
            }

            let mut due = plan.frames().peekable();
            for frame in reader.frames() {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(e) => {
                        stages
                            .logger
                            .warn(&format!("Decode error in scene {}: {e}", scene.label()));
                        break;
                    }
                };
                if frame.index() >= plan.end_frame() {
                    break;
                }
                if due.peek().map_or(true, |&next| frame.index() < next) {
                    continue;
                }

                // A gap in decoded indices (dropped or variable-rate frames)
                // may cover several planned samples; this frame stands in
                // for all of them.
                let mut covered = 0;
                while due.next_if(|&next| next <= frame.index()).is_some() {
                    covered += 1;
                }

                tags.extend(stages.tag_frame(scene, &frame));

                done += covered;
                stages.logger.progress(done, total);
                if let Some(callback) = on_progress.as_ref() {
                    if !callback(done, total) {
                        cancelled = true;
                        break 'scenes;
                    }
                }
            }

            let missed = due.count();
            if missed > 0 {
                stages.logger.warn(&format!(
                    "Scene {}: {missed} sampled frames were not decoded",
                    scene.label()
                ));
                done += missed;
                stages.logger.progress(done, total);
            }
        }

        reader.close();
        if cancelled {
            return Err("Cancelled".into());
        }
        logger.info(&format!("Found {} tagged faces", tags.len()));
        logger.summary();
        Ok(tags)
    }
}

/// The per-frame detect, embed and classify chain.
struct FaceStages<'a> {
    detector: &'a mut dyn FaceDetector,
    embedder: &'a mut dyn FaceEmbedder,
    classifier: &'a dyn FaceClassifier,
    logger: &'a mut dyn PipelineLogger,
}

impl FaceStages<'_> {
    fn tag_frame(&mut self, scene: &Scene, frame: &Frame) -> Vec<FaceTag> {
        let index = frame.index();

        let started = Instant::now();
        let faces = match self.detector.detect(frame) {
            Ok(faces) => faces,
            Err(e) => {
                self.logger
                    .warn(&format!("Detection error at frame {index}: {e}"));
                return Vec::new();
            }
        };
        self.logger.timing("detect", elapsed_ms(started));
        self.logger.metric("faces_per_frame", faces.len() as f64);

        let mut tags = Vec::with_capacity(faces.len());
        for face in &faces {
            let started = Instant::now();
            let embedding = match self.embedder.embed(frame, face) {
                Ok(embedding) => embedding,
                Err(e) => {
                    self.logger
                        .warn(&format!("Embedding error at frame {index}: {e}"));
                    continue;
                }
            };
            self.logger.timing("embed", elapsed_ms(started));

            let started = Instant::now();
            match self.classifier.predict(&embedding) {
                Ok(actor) => {
                    log::debug!("Scene {} Frame {index}: {actor}", scene.label());
                    tags.push(FaceTag::new(scene, index, actor));
                }
                Err(e) => self
                    .logger
                    .warn(&format!("Predict error at frame {index}: {e}")),
            }
            self.logger.timing("classify", elapsed_ms(started));
        }
        tags
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
