use crate::recognition::domain::embedding::Embedding;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Domain interface for turning a detected face into an identity vector.
pub trait FaceEmbedder: Send {
    fn embed(
        &mut self,
        frame: &Frame,
        face: &FaceBox,
    ) -> Result<Embedding, Box<dyn std::error::Error>>;
}
