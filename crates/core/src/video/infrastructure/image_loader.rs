use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes a still image (actor photo, thumbnail) into an RGB [`Frame`].
///
/// Any format the `image` crate understands is accepted; alpha is dropped.
pub fn load_frame(path: &Path) -> Result<Frame, image::ImageError> {
    let rgb = image::open(path)?.to_rgb8();
    Ok(Frame::from_rgb_image(rgb, 0))
}
