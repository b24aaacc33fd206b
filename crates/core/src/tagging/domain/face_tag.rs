use serde::{Deserialize, Serialize};

use crate::scenes::domain::scene::{Scene, SceneNumber};
use crate::shared::constants::UNKNOWN_SCENE_LABEL;

/// One recognized face: which scene, which absolute frame, which actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceTag {
    pub scene: SceneNumber,
    pub frame: usize,
    pub actor: String,
}

impl FaceTag {
    /// Tags a face seen in `scene`; scenes without a number are tagged `"?"`.
    pub fn new(scene: &Scene, frame: usize, actor: impl Into<String>) -> Self {
        Self {
            scene: scene
                .number
                .clone()
                .unwrap_or_else(|| SceneNumber::Label(UNKNOWN_SCENE_LABEL.to_string())),
            frame,
            actor: actor.into(),
        }
    }
}
