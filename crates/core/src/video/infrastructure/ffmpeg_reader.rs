use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Microseconds per second; the unit of container-level seek timestamps.
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Converts each decoded frame to RGB24 and wraps it in a [`Frame`] whose
/// index is derived from the presentation timestamp, so indices stay
/// absolute after [`seek`](VideoReader::seek).
pub struct FfmpegReader {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    video_stream_index: usize,
    metadata: Option<VideoMetadata>,
    seek_target: usize,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            video_stream_index: 0,
            metadata: None,
            seek_target: 0,
        }
    }

    fn fps(&self) -> f64 {
        self.metadata.as_ref().map(|m| m.fps).unwrap_or(0.0)
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes the frame shown at `seconds` into the video at `path`.
///
/// Used for one-off previews; opens and closes the file on every call.
pub fn read_frame_at(path: &Path, seconds: f64) -> Result<Frame, Box<dyn std::error::Error>> {
    let mut reader = FfmpegReader::new();
    let metadata = reader.open(path)?;
    reader.seek(metadata.frame_at(seconds))?;
    let frame = reader
        .frames()
        .next()
        .ok_or_else(|| format!("No frame at {seconds:.2}s in {}", path.display()))?;
    let frame = frame?;
    reader.close();
    Ok(frame)
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        self.video_stream_index = video_stream_index;
        self.metadata = Some(metadata.clone());
        self.input_ctx = Some(ictx);
        self.seek_target = 0;

        Ok(metadata)
    }

    fn seek(&mut self, frame_index: usize) -> Result<(), Box<dyn std::error::Error>> {
        let fps = self.fps();
        let ictx = self.input_ctx.as_mut().ok_or("FfmpegReader: not opened")?;
        let ts = if fps > 0.0 {
            (frame_index as f64 / fps * AV_TIME_BASE) as i64
        } else {
            0
        };
        // Lands on the closest keyframe at or before `ts`; the frame
        // iterator drops whatever precedes the target.
        ictx.seek(ts, ..ts)?;
        self.seek_target = frame_index;
        Ok(())
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let fps = self.fps();
        let skip_until = self.seek_target;
        let video_stream_index = self.video_stream_index;
        let Some(ictx) = self.input_ctx.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        let setup = match DecodeSetup::new(ictx, video_stream_index) {
            Ok(setup) => setup,
            Err(e) => return Box::new(std::iter::once(Err(e))),
        };

        Box::new(FfmpegFrameIter {
            ictx,
            setup,
            video_stream_index,
            fps,
            skip_until,
            next_index: skip_until,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        self.input_ctx = None;
        self.metadata = None;
        self.seek_target = 0;
    }
}

/// Decoder, scaler and timing parameters for one pass over the stream.
struct DecodeSetup {
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    time_base: f64,
    start_time: i64,
}

impl DecodeSetup {
    fn new(
        ictx: &ffmpeg_next::format::context::Input,
        video_stream_index: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = ictx
            .stream(video_stream_index)
            .ok_or("No video stream found")?;
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        // AV_NOPTS_VALUE when the container does not record a start time.
        let start_time = match stream.start_time() {
            i64::MIN => 0,
            t => t,
        };

        Ok(Self {
            decoder,
            scaler,
            width,
            height,
            time_base: f64::from(stream.time_base()),
            start_time,
        })
    }
}

/// Lazy iterator that decodes video frames one at a time, avoiding the need
/// to buffer the entire video in memory.
struct FfmpegFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    setup: DecodeSetup,
    video_stream_index: usize,
    fps: f64,
    skip_until: usize,
    next_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    fn frame_index_of(&self, decoded: &ffmpeg_next::util::frame::video::Video) -> usize {
        match decoded.timestamp().or(decoded.pts()) {
            Some(ts) if self.fps > 0.0 => {
                let seconds = (ts - self.setup.start_time) as f64 * self.setup.time_base;
                (seconds * self.fps).round().max(0.0) as usize
            }
            _ => self.next_index,
        }
    }

    fn try_receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while self.setup.decoder.receive_frame(&mut decoded).is_ok() {
            let index = self.frame_index_of(&decoded);
            self.next_index = index + 1;
            if index < self.skip_until {
                continue;
            }

            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
            if let Err(e) = self.setup.scaler.run(&decoded, &mut rgb_frame) {
                return Some(Err(Box::new(e)));
            }

            let (width, height) = (self.setup.width, self.setup.height);
            let pixels = extract_rgb_pixels(&rgb_frame, width, height);
            return Some(Ok(Frame::new(pixels, width, height, 3, index)));
        }
        None
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.setup.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if self.setup.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: f64) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();

        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps as i32));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps as i32, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);

        octx.write_header().unwrap();

        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .unwrap();

        for i in 0..num_frames {
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
            );
            let stride = rgb_frame.stride(0);
            let data = rgb_frame.data_mut(0);
            let value = ((i * 8) % 256) as u8;
            for row in 0..height as usize {
                for col in 0..width as usize {
                    let offset = row * stride + col * 3;
                    data[offset] = value;
                    data[offset + 1] = value;
                    data[offset + 2] = value;
                }
            }

            let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
            yuv_frame.set_pts(Some(i as i64));

            encoder.send_frame(&yuv_frame).unwrap();

            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps as i32), ost_time_base);
                encoded.write_interleaved(&mut octx).unwrap();
            }
        }

        encoder.send_eof().unwrap();
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps as i32), ost_time_base);
            encoded.write_interleaved(&mut octx).unwrap();
        }

        octx.write_trailer().unwrap();
    }

    fn test_video_path(dir: &Path) -> PathBuf {
        dir.join("test.mp4")
    }

    /// 30 frames at 10 fps; frame `i` is filled with gray level `i * 8`.
    fn ramp_video(dir: &Path) -> PathBuf {
        let path = test_video_path(dir);
        create_test_video(&path, 30, 160, 120, 10.0);
        path
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 5, 160, 120, 30.0);

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!(meta.width, 160);
        assert_eq!(meta.height, 120);
        assert!(meta.fps > 0.0);
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_open_nonexistent_raises() {
        let mut reader = FfmpegReader::new();
        assert!(reader.open(Path::new("/nonexistent/movie.mp4")).is_err());
    }

    #[test]
    fn test_frames_yields_correct_count_with_sequential_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 5, 160, 120, 30.0);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();

        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.channels(), 3);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
        }
    }

    #[test]
    fn test_seek_starts_at_target_with_absolute_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = ramp_video(dir.path());

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        reader.seek(15).unwrap();

        let indices: Vec<usize> = reader.frames().map(|f| f.unwrap().index()).collect();
        assert_eq!(indices, (15..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_seek_backwards_after_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = ramp_video(dir.path());

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        reader.seek(20).unwrap();
        assert_eq!(reader.frames().next().unwrap().unwrap().index(), 20);

        reader.seek(3).unwrap();
        assert_eq!(reader.frames().next().unwrap().unwrap().index(), 3);
    }

    #[test]
    fn test_seek_past_end_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = ramp_video(dir.path());

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        reader.seek(500).unwrap();
        assert_eq!(reader.frames().count(), 0);
    }

    #[test]
    fn test_seek_without_open_is_error() {
        let mut reader = FfmpegReader::new();
        assert!(reader.seek(10).is_err());
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut reader = FfmpegReader::new();
        let result = reader.frames().next().unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_read_frame_at_decodes_requested_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = ramp_video(dir.path());

        let frame = read_frame_at(&path, 1.25).unwrap();
        assert_eq!(frame.index(), 12);
        assert_eq!((frame.width(), frame.height()), (160, 120));
    }

    #[test]
    fn test_read_frame_at_missing_file_is_error() {
        assert!(read_frame_at(Path::new("/nonexistent/movie.mp4"), 1.0).is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 1, 160, 120, 30.0);

        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        reader.close();
        reader.close();
    }
}
