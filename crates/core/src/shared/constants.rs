pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Recorded in classifier files so embeddings from different models never mix.
pub const EMBEDDING_MODEL_VERSION: &str = "w600k_r50";

/// Application directory name under the platform cache/config roots.
pub const APP_DIR_NAME: &str = "Cinescope";

/// Actor images picked up by the trainer.
pub const ACTOR_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.5;
pub const DEFAULT_NEIGHBORS: usize = 3;
pub const DEFAULT_SAMPLE_FPS: f64 = 1.0;

pub const DEFAULT_CONVERT_SCENES_PATH: &str = "data/scenes.json";
pub const DEFAULT_TAG_SCENES_PATH: &str = "data/scenes_wrapped_fixed.json";
pub const DEFAULT_TAGS_OUTPUT_PATH: &str = "all_scenes_results.json";

/// Label used when a scene has no `number`.
pub const UNKNOWN_SCENE_LABEL: &str = "?";
