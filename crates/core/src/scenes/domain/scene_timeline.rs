use std::fmt;

use super::scene::Scene;

/// Problems found in a scene list. They are reported, never fatal.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneWarning {
    /// `start > end` for the scene at this 1-based position.
    InvertedInterval { position: usize, label: String },
    /// Scene starts before the previous one ends.
    Overlap { position: usize, label: String },
    /// Scene starts before the previous one starts.
    OutOfOrder { position: usize, label: String },
}

impl fmt::Display for SceneWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneWarning::InvertedInterval { position, label } => {
                write!(f, "scene {label} (#{position}) ends before it starts")
            }
            SceneWarning::Overlap { position, label } => {
                write!(f, "scene {label} (#{position}) overlaps the previous scene")
            }
            SceneWarning::OutOfOrder { position, label } => {
                write!(f, "scene {label} (#{position}) starts before the previous scene")
            }
        }
    }
}

/// Scenes in file order plus the time-based lookups the viewer needs.
///
/// File order is authoritative: lookups never re-sort, so a list that is
/// out of order behaves exactly as authored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneTimeline {
    scenes: Vec<Scene>,
}

impl SceneTimeline {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene playing at `t`: the first one containing it, else the last scene.
    pub fn scene_at(&self, t: f64) -> Option<&Scene> {
        self.scenes
            .iter()
            .find(|s| s.contains(t))
            .or_else(|| self.scenes.last())
    }

    /// 1-based position of the scene playing at `t`.
    pub fn position_at(&self, t: f64) -> Option<usize> {
        if self.scenes.is_empty() {
            return None;
        }
        let idx = self
            .scenes
            .iter()
            .position(|s| s.contains(t))
            .unwrap_or(self.scenes.len() - 1);
        Some(idx + 1)
    }

    /// Start of the last scene (in file order) that begins before `t`.
    ///
    /// From the middle of a scene this is that scene's own start, so
    /// pressing "previous" twice walks back one scene at a time.
    pub fn previous_start(&self, t: f64) -> Option<f64> {
        self.scenes
            .iter()
            .filter(|s| s.start < t)
            .last()
            .map(|s| s.start)
    }

    /// Start of the first scene (in file order) that begins after `t`.
    pub fn next_start(&self, t: f64) -> Option<f64> {
        self.scenes.iter().find(|s| s.start > t).map(|s| s.start)
    }

    /// End of the last scene; the upper bound of the time slider.
    pub fn max_time(&self) -> f64 {
        self.scenes.last().map(|s| s.end.max(0.0)).unwrap_or(0.0)
    }

    pub fn validate(&self) -> Vec<SceneWarning> {
        let mut warnings = Vec::new();
        for (i, scene) in self.scenes.iter().enumerate() {
            let position = i + 1;
            if scene.start > scene.end {
                warnings.push(SceneWarning::InvertedInterval {
                    position,
                    label: scene.label(),
                });
            }
            let Some(prev) = i.checked_sub(1).map(|p| &self.scenes[p]) else {
                continue;
            };
            if scene.start < prev.start {
                warnings.push(SceneWarning::OutOfOrder {
                    position,
                    label: scene.label(),
                });
            } else if scene.start < prev.end {
                warnings.push(SceneWarning::Overlap {
                    position,
                    label: scene.label(),
                });
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::domain::scene::SceneNumber;
    use rstest::rstest;

    fn scene(number: i64, start: f64, end: f64) -> Scene {
        Scene {
            number: Some(SceneNumber::Index(number)),
            start,
            end,
            ..Scene::default()
        }
    }

    fn timeline() -> SceneTimeline {
        SceneTimeline::new(vec![
            scene(1, 0.0, 10.0),
            scene(2, 10.0, 25.0),
            scene(3, 25.0, 40.0),
        ])
    }

    fn number_at(t: &SceneTimeline, time: f64) -> Option<SceneNumber> {
        t.scene_at(time).and_then(|s| s.number.clone())
    }

    #[rstest]
    #[case(0.0, 1)]
    #[case(9.75, 1)]
    #[case(10.0, 2)]
    #[case(39.9, 3)]
    fn test_scene_at_finds_containing_scene(#[case] time: f64, #[case] expected: i64) {
        assert_eq!(number_at(&timeline(), time), Some(SceneNumber::Index(expected)));
    }

    #[test]
    fn test_scene_at_past_the_end_falls_back_to_last() {
        assert_eq!(number_at(&timeline(), 40.0), Some(SceneNumber::Index(3)));
        assert_eq!(number_at(&timeline(), 500.0), Some(SceneNumber::Index(3)));
    }

    #[test]
    fn test_scene_at_in_gap_falls_back_to_last() {
        let t = SceneTimeline::new(vec![scene(1, 0.0, 5.0), scene(2, 10.0, 20.0)]);
        assert_eq!(number_at(&t, 7.0), Some(SceneNumber::Index(2)));
    }

    #[test]
    fn test_scene_at_prefers_first_of_overlapping() {
        let t = SceneTimeline::new(vec![scene(1, 0.0, 15.0), scene(2, 10.0, 20.0)]);
        assert_eq!(number_at(&t, 12.0), Some(SceneNumber::Index(1)));
    }

    #[test]
    fn test_empty_timeline() {
        let t = SceneTimeline::default();
        assert!(t.scene_at(3.0).is_none());
        assert!(t.position_at(3.0).is_none());
        assert!(t.previous_start(3.0).is_none());
        assert!(t.next_start(3.0).is_none());
        assert_eq!(t.max_time(), 0.0);
        assert!(t.validate().is_empty());
    }

    #[test]
    fn test_position_at() {
        assert_eq!(timeline().position_at(12.0), Some(2));
        assert_eq!(timeline().position_at(99.0), Some(3));
    }

    #[rstest]
    #[case::mid_scene(15.0, Some(10.0))]
    #[case::at_scene_start(10.0, Some(0.0))]
    #[case::at_zero(0.0, None)]
    #[case::past_end(45.0, Some(25.0))]
    fn test_previous_start(#[case] time: f64, #[case] expected: Option<f64>) {
        assert_eq!(timeline().previous_start(time), expected);
    }

    #[rstest]
    #[case::mid_scene(15.0, Some(25.0))]
    #[case::at_scene_start(10.0, Some(25.0))]
    #[case::at_zero(0.0, Some(10.0))]
    #[case::last_scene(30.0, None)]
    fn test_next_start(#[case] time: f64, #[case] expected: Option<f64>) {
        assert_eq!(timeline().next_start(time), expected);
    }

    #[test]
    fn test_max_time_uses_last_scene_in_file_order() {
        let t = SceneTimeline::new(vec![scene(2, 10.0, 50.0), scene(1, 0.0, 10.0)]);
        assert_eq!(t.max_time(), 10.0);
    }

    #[test]
    fn test_validate_clean_timeline() {
        assert!(timeline().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let t = SceneTimeline::new(vec![
            scene(1, 0.0, 10.0),
            scene(2, 8.0, 20.0),
            scene(3, 30.0, 25.0),
            scene(4, 5.0, 6.0),
        ]);
        let warnings = t.validate();
        assert_eq!(
            warnings,
            vec![
                SceneWarning::Overlap {
                    position: 2,
                    label: "2".into()
                },
                SceneWarning::InvertedInterval {
                    position: 3,
                    label: "3".into()
                },
                SceneWarning::OutOfOrder {
                    position: 4,
                    label: "4".into()
                },
            ]
        );
        assert!(warnings[1].to_string().contains("ends before it starts"));
    }
}
