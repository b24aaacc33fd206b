pub mod scene_file;
