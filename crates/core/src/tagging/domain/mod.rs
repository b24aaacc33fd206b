pub mod face_tag;
pub mod sampling_plan;
