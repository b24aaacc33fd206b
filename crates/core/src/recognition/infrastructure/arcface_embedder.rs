/// ArcFace face embedder using ONNX Runtime.
///
/// Crops a square around each detected face, resizes it to the model's
/// 112x112 input and returns the L2-normalized 512-d identity vector.
use std::path::Path;

use crate::detection::infrastructure::execution_provider::load_session;
use crate::recognition::domain::embedding::Embedding;
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

pub const EMBEDDING_DIM: usize = 512;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEmbedder {
    session: ort::session::Session,
}

impl ArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
        })
    }
}

impl FaceEmbedder for ArcFaceEmbedder {
    fn embed(
        &mut self,
        frame: &Frame,
        face: &FaceBox,
    ) -> Result<Embedding, Box<dyn std::error::Error>> {
        let crop = square_crop(frame, face);
        if crop.is_empty() {
            return Err(format!(
                "Face box ({:.0}, {:.0}, {:.0}, {:.0}) lies outside the frame",
                face.x1, face.y1, face.x2, face.y2
            )
            .into());
        }

        let tensor = preprocess(crop.data(), crop.width(), crop.height());
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let values = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        if values.len() != EMBEDDING_DIM {
            return Err(format!(
                "Embedding model returned {} values, expected {EMBEDDING_DIM}",
                values.len()
            )
            .into());
        }
        Ok(Embedding::normalized(values.to_vec()))
    }
}

/// Square crop centered on the face, side = the box's longer edge.
///
/// The square is clamped to the frame, so faces at the border yield a
/// rectangle that the resize step stretches back to square.
fn square_crop(frame: &Frame, face: &FaceBox) -> Frame {
    let (cx, cy) = face.center();
    let half = face.width().max(face.height()) / 2.0;
    let square = FaceBox::new(cx - half, cy - half, cx + half, cy + half, face.confidence);
    let (x1, y1, x2, y2) = square.pixel_bounds(frame.width(), frame.height());
    frame.crop(x1, y1, x2, y2)
}

/// Resize crop to 112x112 (nearest neighbor), normalize, NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 0]);
            }
        }
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_square_crop_uses_longer_edge() {
        let frame = gradient_frame(200, 200);
        let face = FaceBox::new(80.0, 60.0, 120.0, 140.0, 0.9);
        let crop = square_crop(&frame, &face);
        assert_eq!((crop.width(), crop.height()), (80, 80));
        // left edge of the square is x = 100 - 40
        assert_eq!(crop.data()[0], 60);
    }

    #[test]
    fn test_square_crop_clamped_at_border() {
        let frame = gradient_frame(100, 100);
        let face = FaceBox::new(0.0, 0.0, 20.0, 40.0, 0.9);
        let crop = square_crop(&frame, &face);
        assert_eq!((crop.width(), crop.height()), (30, 40));
    }

    #[test]
    fn test_square_crop_outside_frame_is_empty() {
        let frame = gradient_frame(50, 50);
        let face = FaceBox::new(100.0, 100.0, 140.0, 140.0, 0.9);
        assert!(square_crop(&frame, &face).is_empty());
    }

    #[test]
    fn test_preprocess_shape() {
        let data = vec![128u8; 50 * 50 * 3];
        let tensor = preprocess(&data, 50, 50);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_normalization() {
        let data = vec![127u8; 10 * 10 * 3];
        let tensor = preprocess(&data, 10, 10);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], (127.0 - 127.5) / 127.5, epsilon = 1e-6);

        let data = vec![255u8; 10 * 10 * 3];
        let tensor = preprocess(&data, 10, 10);
        assert_relative_eq!(tensor[[0, 2, 111, 111]], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_preprocess_channel_order_is_rgb() {
        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend_from_slice(&[255u8, 0, 0]);
        }
        let tensor = preprocess(&data, 2, 2);
        assert_relative_eq!(tensor[[0, 0, 5, 5]], 1.0, epsilon = 1e-6);
        assert_relative_eq!(tensor[[0, 1, 5, 5]], -1.0, epsilon = 1e-6);
    }
}
