use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Absolute frame index shown at `seconds`, truncated toward zero.
    pub fn frame_at(&self, seconds: f64) -> usize {
        if self.fps <= 0.0 || seconds <= 0.0 {
            return 0;
        }
        (seconds * self.fps) as usize
    }

    /// Timestamp of a frame in seconds.
    pub fn seconds_at(&self, frame_index: usize) -> f64 {
        if self.fps <= 0.0 {
            return 0.0;
        }
        frame_index as f64 / self.fps
    }

    pub fn duration_secs(&self) -> f64 {
        self.seconds_at(self.total_frames)
    }
}
