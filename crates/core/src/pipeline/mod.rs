pub mod pipeline_logger;
pub mod tag_faces_use_case;
pub mod train_classifier_use_case;
