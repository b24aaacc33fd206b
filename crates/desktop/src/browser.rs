use cinescope_core::scenes::domain::scene::Scene;
use cinescope_core::scenes::domain::scene_timeline::SceneTimeline;

/// Slider granularity in seconds.
pub const TIME_STEP: f64 = 0.25;

/// The playhead over a scene list: current time plus scene navigation.
#[derive(Debug, Default)]
pub struct SceneBrowser {
    timeline: SceneTimeline,
    current_time: f64,
}

impl SceneBrowser {
    pub fn new(timeline: SceneTimeline) -> Self {
        Self {
            timeline,
            current_time: 0.0,
        }
    }

    pub fn scenes(&self) -> &[Scene] {
        self.timeline.scenes()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn max_time(&self) -> f64 {
        self.timeline.max_time()
    }

    /// Moves the playhead, clamped to `[0, max_time]`.
    pub fn seek(&mut self, t: f64) {
        self.current_time = if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, self.max_time())
        };
    }

    /// Jumps to the start of the closest scene beginning before the
    /// playhead. Returns whether the playhead moved.
    pub fn previous_scene(&mut self) -> bool {
        match self.timeline.previous_start(self.current_time) {
            Some(start) => {
                self.seek(start);
                true
            }
            None => false,
        }
    }

    /// Jumps to the start of the first scene beginning after the playhead.
    pub fn next_scene(&mut self) -> bool {
        match self.timeline.next_start(self.current_time) {
            Some(start) => {
                self.seek(start);
                true
            }
            None => false,
        }
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.timeline.scene_at(self.current_time)
    }

    /// 0-based index of the current scene in the strip.
    pub fn active_index(&self) -> Option<usize> {
        self.timeline
            .position_at(self.current_time)
            .map(|position| position - 1)
    }
}
