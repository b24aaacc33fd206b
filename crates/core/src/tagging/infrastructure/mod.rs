pub mod tags_file;
