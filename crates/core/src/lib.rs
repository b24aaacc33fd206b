pub mod classification;
pub mod detection;
pub mod pipeline;
pub mod recognition;
pub mod scenes;
pub mod shared;
pub mod tagging;
pub mod video;
