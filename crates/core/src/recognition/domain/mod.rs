pub mod embedding;
pub mod face_embedder;
