use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use cinescope_core::classification::domain::face_classifier::FaceClassifier;
use cinescope_core::classification::infrastructure::knn_classifier::KnnClassifier;
use cinescope_core::detection::domain::face_detector::FaceDetector;
use cinescope_core::detection::infrastructure::model_resolver::{
    self, ModelFile, FACE_DETECTOR_MODEL, FACE_EMBEDDER_MODEL,
};
use cinescope_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use cinescope_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use cinescope_core::pipeline::tag_faces_use_case::TagFacesUseCase;
use cinescope_core::pipeline::train_classifier_use_case::TrainClassifierUseCase;
use cinescope_core::recognition::domain::face_embedder::FaceEmbedder;
use cinescope_core::recognition::infrastructure::arcface_embedder::ArcFaceEmbedder;
use cinescope_core::scenes::infrastructure::scene_file;
use cinescope_core::shared::constants::{
    DEFAULT_CONVERT_SCENES_PATH, DEFAULT_DETECTION_CONFIDENCE, DEFAULT_NEIGHBORS,
    DEFAULT_SAMPLE_FPS, DEFAULT_TAGS_OUTPUT_PATH, DEFAULT_TAG_SCENES_PATH,
    EMBEDDING_MODEL_VERSION,
};
use cinescope_core::tagging::infrastructure::tags_file;
use cinescope_core::video::domain::video_reader::VideoReader;
use cinescope_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Movie scene tools: scene-list conversion, actor classifier training and
/// per-scene face tagging.
#[derive(Parser)]
#[command(name = "cinescope")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite a scene map keyed by scene index as a sorted JSON array.
    ConvertScenes {
        /// Scene file to convert.
        #[arg(long, default_value = DEFAULT_CONVERT_SCENES_PATH)]
        input: PathBuf,

        /// Output file (defaults to overwriting the input).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Train the actor classifier from a directory of labeled photos.
    Train {
        /// Directory with one sub-directory of photos per actor.
        #[arg(long)]
        actors_dir: PathBuf,

        /// Where to write the trained classifier.
        #[arg(long)]
        out: PathBuf,

        /// Neighbors consulted per prediction.
        #[arg(long, default_value_t = DEFAULT_NEIGHBORS)]
        n_neighbors: usize,

        #[command(flatten)]
        models: ModelArgs,
    },

    /// Tag the faces in each scene of a video with actor names.
    Tag {
        /// Input video file.
        #[arg(long)]
        video: PathBuf,

        /// Trained classifier file.
        #[arg(long)]
        classifier: PathBuf,

        /// Scene list.
        #[arg(long, default_value = DEFAULT_TAG_SCENES_PATH)]
        scenes: PathBuf,

        /// Frames analyzed per second of video.
        #[arg(long, default_value_t = DEFAULT_SAMPLE_FPS)]
        fps: f64,

        /// Output file for the tag records.
        #[arg(long, default_value = DEFAULT_TAGS_OUTPUT_PATH)]
        out: PathBuf,

        #[command(flatten)]
        models: ModelArgs,
    },
}

#[derive(clap::Args)]
struct ModelArgs {
    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_DETECTION_CONFIDENCE)]
    confidence: f64,

    /// Directory checked for model files before the download cache.
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli.command)?;

    match cli.command {
        Command::ConvertScenes { input, output } => {
            let output = output.unwrap_or_else(|| input.clone());
            run_convert(&input, &output)
        }
        Command::Train {
            actors_dir,
            out,
            n_neighbors,
            models,
        } => run_train(&actors_dir, &out, n_neighbors, &models),
        Command::Tag {
            video,
            classifier,
            scenes,
            fps,
            out,
            models,
        } => run_tag(&video, &classifier, &scenes, fps, &out, &models),
    }
}

fn run_convert(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let count = scene_file::convert(input, output)?;
    log::info!("Converted {count} scenes to {}", output.display());
    Ok(())
}

fn run_train(
    actors_dir: &Path,
    out: &Path,
    n_neighbors: usize,
    models: &ModelArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let detector = build_detector(models)?;
    let embedder = build_embedder(models)?;

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rEncoding image {current}/{total}");
        true
    });

    let mut use_case = TrainClassifierUseCase::new(
        detector,
        embedder,
        Box::new(StdoutPipelineLogger::new("images", 10)),
        Some(progress),
    );
    let classifier = use_case.execute(actors_dir, n_neighbors)?;
    eprintln!();

    classifier.save(out)?;
    log::info!(
        "Classifier saved to {} ({} actors)",
        out.display(),
        classifier.labels().len()
    );
    Ok(())
}

fn run_tag(
    video: &Path,
    classifier_path: &Path,
    scenes_path: &Path,
    sample_fps: f64,
    out: &Path,
    models: &ModelArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let timeline = scene_file::load(scenes_path)?;
    log::info!(
        "Loaded {} scenes from {}",
        timeline.len(),
        scenes_path.display()
    );

    let classifier = KnnClassifier::load(classifier_path)?;
    log::info!(
        "Loaded classifier with {} samples of {} actors",
        classifier.sample_count(),
        classifier.labels().len()
    );
    if !classifier.matches_current_embedder() {
        log::warn!(
            "Classifier was trained on {} embeddings, this build uses {}; retrain it with `cinescope train`",
            classifier.embedding_model(),
            EMBEDDING_MODEL_VERSION
        );
    }

    let detector = build_detector(models)?;
    let embedder = build_embedder(models)?;

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(video)?;
    log::info!(
        "Video: {}x{} @ {:.2} fps, {} frames",
        metadata.width,
        metadata.height,
        metadata.fps,
        metadata.total_frames
    );

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rAnalyzing frame {current}/{total}");
        true
    });

    let mut use_case = TagFacesUseCase::new(
        reader,
        detector,
        embedder,
        Box::new(classifier),
        Box::new(StdoutPipelineLogger::new("frames", 10)),
        sample_fps,
        Some(progress),
    );
    let tags = use_case.execute(&metadata, timeline.scenes())?;
    eprintln!();

    tags_file::write(out, &tags)?;
    log::info!("Saved {} records to {}", tags.len(), out.display());
    Ok(())
}

fn build_detector(models: &ModelArgs) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let model_path = resolve_model(FACE_DETECTOR_MODEL, models)?;
    Ok(Box::new(OnnxYoloDetector::new(
        &model_path,
        models.confidence,
    )?))
}

fn build_embedder(models: &ModelArgs) -> Result<Box<dyn FaceEmbedder>, Box<dyn std::error::Error>> {
    let model_path = resolve_model(FACE_EMBEDDER_MODEL, models)?;
    Ok(Box::new(ArcFaceEmbedder::new(&model_path)?))
}

fn resolve_model(
    model: ModelFile,
    models: &ModelArgs,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", model.name);
    let name = model.name;
    let path = model_resolver::resolve(
        model,
        models.models_dir.as_deref(),
        Some(Box::new(move |downloaded, total| {
            download_progress(name, downloaded, total)
        })),
    )?;
    log::debug!("Using {}", path.display());
    Ok(path)
}

fn validate(command: &Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::ConvertScenes { input, .. } => require_file(input, "Scene file"),
        Command::Train {
            actors_dir,
            n_neighbors,
            models,
            ..
        } => {
            if !actors_dir.is_dir() {
                return Err(
                    format!("Actors directory not found: {}", actors_dir.display()).into(),
                );
            }
            if *n_neighbors == 0 {
                return Err("Neighbor count must be at least 1".into());
            }
            validate_models(models)
        }
        Command::Tag {
            video,
            classifier,
            scenes,
            fps,
            models,
            ..
        } => {
            require_file(video, "Video file")?;
            require_file(classifier, "Classifier file")?;
            require_file(scenes, "Scene file")?;
            if !(*fps > 0.0 && fps.is_finite()) {
                return Err(format!("Sampling rate must be positive, got {fps}").into());
            }
            validate_models(models)
        }
    }
}

fn validate_models(models: &ModelArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&models.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            models.confidence
        )
        .into());
    }
    if let Some(dir) = &models.models_dir {
        if !dir.is_dir() {
            return Err(format!("Models directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn require_file(path: &Path, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(format!("{what} not found: {}", path.display()).into());
    }
    Ok(())
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinescope_core::scenes::infrastructure::scene_file::read_value;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["cinescope"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_convert_defaults() {
        match parse(&["convert-scenes"]) {
            Command::ConvertScenes { input, output } => {
                assert_eq!(input, PathBuf::from("data/scenes.json"));
                assert!(output.is_none());
            }
            _ => panic!("expected convert-scenes"),
        }
    }

    #[test]
    fn test_tag_defaults() {
        match parse(&["tag", "--video", "m.mp4", "--classifier", "c.json"]) {
            Command::Tag {
                scenes,
                fps,
                out,
                models,
                ..
            } => {
                assert_eq!(scenes, PathBuf::from("data/scenes_wrapped_fixed.json"));
                assert_eq!(fps, 1.0);
                assert_eq!(out, PathBuf::from("all_scenes_results.json"));
                assert_eq!(models.confidence, 0.5);
                assert!(models.models_dir.is_none());
            }
            _ => panic!("expected tag"),
        }
    }

    #[test]
    fn test_train_requires_out() {
        assert!(Cli::try_parse_from(["cinescope", "train", "--actors-dir", "a"]).is_err());
    }

    #[test]
    fn test_validate_missing_scene_file() {
        let err = validate(&parse(&["convert-scenes", "--input", "/nonexistent.json"]))
            .unwrap_err();
        assert!(err.to_string().starts_with("Scene file not found"));
    }

    #[test]
    fn test_validate_train_ranges() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_str().unwrap();

        let ok = parse(&["train", "--actors-dir", dir, "--out", "c.json"]);
        assert!(validate(&ok).is_ok());

        let zero = parse(&["train", "--actors-dir", dir, "--out", "c.json", "--n-neighbors", "0"]);
        assert!(validate(&zero).is_err());

        let conf = parse(&["train", "--actors-dir", dir, "--out", "c.json", "--confidence", "1.5"]);
        assert!(validate(&conf).is_err());
    }

    #[test]
    fn test_validate_tag_fps() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, b"").unwrap();
        let f = file.to_str().unwrap();

        let base = ["tag", "--video", f, "--classifier", f, "--scenes", f];
        assert!(validate(&parse(&base)).is_ok());

        let mut zero = base.to_vec();
        zero.extend_from_slice(&["--fps", "0"]);
        assert!(validate(&parse(&zero)).is_err());
    }

    #[test]
    fn test_convert_runs_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("scenes.json");
        fs::write(
            &input,
            r#"{"2": {"start": 5, "end": 9}, "1": {"start": 0, "end": 5}}"#,
        )
        .unwrap();

        run_convert(&input, &input).unwrap();

        assert!(read_value(&input).unwrap().is_array());
        let starts: Vec<f64> = scene_file::load(&input)
            .unwrap()
            .scenes()
            .iter()
            .map(|s| s.start)
            .collect();
        assert_eq!(starts, vec![0.0, 5.0]);
    }
}
