use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use walkdir::WalkDir;

use crate::classification::infrastructure::knn_classifier::{KnnClassifier, LabeledEmbedding};
use crate::detection::domain::face_detector::FaceDetector;
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::shared::constants::ACTOR_IMAGE_EXTENSIONS;
use crate::video::infrastructure::image_loader::load_frame;

use super::pipeline_logger::PipelineLogger;

/// Progress callback: `(images_done, images_total)`.
/// Returning `false` cancels training.
pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Builds an actor classifier from a directory of labeled face photos.
///
/// Layout: `<actors_dir>/<actor name>/<photo>.jpg`. Each photo contributes
/// the embedding of its most confident face; photos that fail to load or
/// contain no face are logged and skipped.
pub struct TrainClassifierUseCase {
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<ProgressFn>,
}

impl TrainClassifierUseCase {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            detector,
            embedder,
            logger,
            on_progress,
        }
    }

    pub fn execute(
        &mut self,
        actors_dir: &Path,
        n_neighbors: usize,
    ) -> Result<KnnClassifier, Box<dyn std::error::Error>> {
        if !actors_dir.is_dir() {
            return Err(format!("Actors directory not found: {}", actors_dir.display()).into());
        }

        let images = collect_actor_images(actors_dir)?;
        let total = images.len();
        self.logger.info(&format!(
            "Found {total} images in {}",
            actors_dir.display()
        ));

        let mut samples = Vec::new();
        for (i, (label, path)) in images.iter().enumerate() {
            if let Some(sample) = self.embed_image(label, path) {
                samples.push(sample);
            }

            self.logger.progress(i + 1, total);
            if let Some(ref callback) = self.on_progress {
                if !callback(i + 1, total) {
                    return Err("Cancelled".into());
                }
            }
        }

        if samples.is_empty() {
            return Err("No face encodings found. Check your actor images.".into());
        }

        let actors: BTreeSet<&str> = samples.iter().map(|s| s.label.as_str()).collect();
        self.logger.info(&format!(
            "Training on {} face samples from {} actors",
            samples.len(),
            actors.len()
        ));

        let classifier = KnnClassifier::fit(samples, n_neighbors)?;
        self.logger.summary();
        Ok(classifier)
    }

    fn embed_image(&mut self, label: &str, path: &Path) -> Option<LabeledEmbedding> {
        let frame = match load_frame(path) {
            Ok(frame) => frame,
            Err(e) => {
                self.logger
                    .warn(&format!("Cannot read {}: {e}", path.display()));
                return None;
            }
        };

        let started = Instant::now();
        let faces = match self.detector.detect(&frame) {
            Ok(faces) => faces,
            Err(e) => {
                self.logger
                    .warn(&format!("Detection error in {}: {e}", path.display()));
                return None;
            }
        };
        self.logger
            .timing("detect", started.elapsed().as_secs_f64() * 1000.0);

        let Some(face) = faces.first() else {
            self.logger
                .warn(&format!("No face found in {}", path.display()));
            return None;
        };

        let started = Instant::now();
        match self.embedder.embed(&frame, face) {
            Ok(embedding) => {
                self.logger
                    .timing("embed", started.elapsed().as_secs_f64() * 1000.0);
                Some(LabeledEmbedding::new(label, embedding))
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Embedding error in {}: {e}", path.display()));
                None
            }
        }
    }
}

/// Actor photos as `(actor name, path)`, one directory level deep, sorted
/// by path. Files directly in `actors_dir` are ignored.
pub fn collect_actor_images(actors_dir: &Path) -> Result<Vec<(String, PathBuf)>, walkdir::Error> {
    let mut images = Vec::new();
    for entry in WalkDir::new(actors_dir)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_actor_image(entry.path()) {
            continue;
        }
        let Some(label) = entry
            .path()
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
        else {
            continue;
        };
        images.push((label, entry.into_path()));
    }
    Ok(images)
}

fn is_actor_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            ACTOR_IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}
