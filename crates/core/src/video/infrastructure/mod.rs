pub mod ffmpeg_reader;
pub mod image_loader;
