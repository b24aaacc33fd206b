use std::iter::StepBy;
use std::ops::Range;

use crate::scenes::domain::scene::Scene;

/// Which frames of a scene get analyzed.
///
/// `start_frame = floor(start * fps)`, `end_frame = floor(end * fps)` and
/// `step = max(floor(fps / sample_fps), 1)`. Sampled frames are
/// `start_frame + k * step`, strictly below `end_frame`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingPlan {
    start_frame: usize,
    end_frame: usize,
    step: usize,
}

impl SamplingPlan {
    pub fn new(start_secs: f64, end_secs: f64, video_fps: f64, sample_fps: f64) -> Self {
        let to_frame = |secs: f64| {
            if video_fps > 0.0 && secs > 0.0 {
                (secs * video_fps) as usize
            } else {
                0
            }
        };
        let step = if sample_fps > 0.0 && video_fps > 0.0 {
            ((video_fps / sample_fps) as usize).max(1)
        } else {
            1
        };
        Self {
            start_frame: to_frame(start_secs),
            end_frame: to_frame(end_secs),
            step,
        }
    }

    pub fn for_scene(scene: &Scene, video_fps: f64, sample_fps: f64) -> Self {
        Self::new(scene.start, scene.end, video_fps, sample_fps)
    }

    pub fn start_frame(&self) -> usize {
        self.start_frame
    }

    pub fn end_frame(&self) -> usize {
        self.end_frame
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn is_empty(&self) -> bool {
        self.end_frame <= self.start_frame
    }

    /// Number of sampled frames.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.end_frame - self.start_frame).div_ceil(self.step)
    }

    pub fn frames(&self) -> StepBy<Range<usize>> {
        (self.start_frame..self.end_frame.max(self.start_frame)).step_by(self.step)
    }
}
