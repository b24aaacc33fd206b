use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use cinescope_core::video::infrastructure::ffmpeg_reader::read_frame_at;

/// A decoded still ready for `image::Handle::from_rgba`.
#[derive(Debug, Clone)]
pub struct FramePreview {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

struct FrameRequest {
    generation: u64,
    video: PathBuf,
    seconds: f64,
}

struct FrameReply {
    generation: u64,
    result: Result<FramePreview, String>,
}

type DecodeFn = dyn Fn(&Path, f64) -> Result<FramePreview, String> + Send;

/// Background decoder for the preview pane.
///
/// Requests are stamped with an increasing generation. The worker skips
/// requests superseded while it was busy, and [`poll`](Self::poll) drops
/// replies for anything but the latest generation.
pub struct FrameWorker {
    requests: Sender<FrameRequest>,
    replies: Receiver<FrameReply>,
    generation: u64,
    pending: bool,
}

impl FrameWorker {
    pub fn spawn() -> Self {
        Self::spawn_with(Box::new(decode_with_ffmpeg))
    }

    fn spawn_with(decode: Box<DecodeFn>) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<FrameRequest>();
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded::<FrameReply>();

        thread::spawn(move || {
            while let Ok(mut request) = request_rx.recv() {
                while let Ok(newer) = request_rx.try_recv() {
                    request = newer;
                }
                let result = decode(&request.video, request.seconds);
                if let Err(e) = &result {
                    log::warn!(
                        "Preview at {:.2}s of {} failed: {e}",
                        request.seconds,
                        request.video.display()
                    );
                }
                let reply = FrameReply {
                    generation: request.generation,
                    result,
                };
                if reply_tx.send(reply).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: request_tx,
            replies: reply_rx,
            generation: 0,
            pending: false,
        }
    }

    /// Queues a decode of the frame at `seconds`, superseding earlier ones.
    pub fn request(&mut self, video: &Path, seconds: f64) {
        self.generation += 1;
        let request = FrameRequest {
            generation: self.generation,
            video: video.to_path_buf(),
            seconds,
        };
        self.pending = self.requests.send(request).is_ok();
    }

    /// Whether a reply for the latest request is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Takes the reply for the latest request, if it has arrived.
    pub fn poll(&mut self) -> Option<Result<FramePreview, String>> {
        let mut latest = None;
        for reply in self.replies.try_iter() {
            if reply.generation == self.generation {
                latest = Some(reply.result);
            }
        }
        if latest.is_some() {
            self.pending = false;
        }
        latest
    }
}

fn decode_with_ffmpeg(video: &Path, seconds: f64) -> Result<FramePreview, String> {
    let frame = read_frame_at(video, seconds).map_err(|e| e.to_string())?;
    Ok(FramePreview {
        width: frame.width(),
        height: frame.height(),
        rgba: frame.to_rgba(),
    })
}
