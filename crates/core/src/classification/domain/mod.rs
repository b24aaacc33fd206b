pub mod face_classifier;
