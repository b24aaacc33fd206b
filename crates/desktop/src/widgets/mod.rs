pub mod actor_card;
pub mod scene_card;
