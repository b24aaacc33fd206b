use crate::recognition::domain::embedding::Embedding;

/// Maps a face embedding to an actor label.
pub trait FaceClassifier: Send {
    fn predict(&self, embedding: &Embedding) -> Result<String, Box<dyn std::error::Error>>;

    /// Every label the classifier can return, sorted.
    fn labels(&self) -> Vec<String>;
}
