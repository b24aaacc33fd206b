pub mod knn_classifier;
