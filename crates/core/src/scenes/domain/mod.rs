pub mod scene;
pub mod scene_timeline;
