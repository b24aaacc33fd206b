/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference and NMS post-processing.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

use super::execution_provider::load_session;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// YOLO face detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                // [N, C, H, W]; square input, so H is enough
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }

        let (input_tensor, transform) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let candidates = parse_predictions(data, tensor.shape(), &transform, self.confidence)?;
        let mut faces = nms(candidates, NMS_IOU_THRESH);
        for face in faces.iter_mut() {
            *face = face.clamp(frame.width(), frame.height());
        }
        faces.retain(|f| f.area() > 0.0);
        Ok(faces)
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Maps letterboxed model coordinates back to frame coordinates.
#[derive(Clone, Copy, Debug)]
struct LetterboxTransform {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl LetterboxTransform {
    fn to_frame(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size` (NCHW, 0..1).
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, LetterboxTransform) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, the YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        LetterboxTransform {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

/// Decodes raw YOLO output into face boxes in frame coordinates.
///
/// Output shape is `[1, features, detections]` (transposed, the usual
/// export) or `[1, detections, features]`. Each detection row is
/// `[cx, cy, w, h, conf, ...]`; pose models append keypoint triples after
/// `conf`, which are not used.
fn parse_predictions(
    data: &[f32],
    shape: &[usize],
    transform: &LetterboxTransform,
    confidence: f64,
) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 || data.len() < num_dets * num_feats {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }

    let value = |det: usize, feat: usize| -> f64 {
        let i = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data[i] as f64
    };

    let mut faces = Vec::new();
    for det in 0..num_dets {
        let conf = value(det, 4);
        if conf < confidence {
            continue;
        }

        let (cx, cy, w, h) = (value(det, 0), value(det, 1), value(det, 2), value(det, 3));
        let (x1, y1) = transform.to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = transform.to_frame(cx + w / 2.0, cy + h / 2.0);

        faces.push(FaceBox::new(x1, y1, x2, y2, conf));
    }
    Ok(faces)
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(mut faces: Vec<FaceBox>, iou_thresh: f64) -> Vec<FaceBox> {
    faces.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<FaceBox> = Vec::with_capacity(faces.len());
    for face in faces {
        if keep.iter().all(|k| k.iou(&face) <= iou_thresh) {
            keep.push(face);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn identity() -> LetterboxTransform {
        LetterboxTransform {
            scale: 1.0,
            pad_x: 0,
            pad_y: 0,
        }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → scale 3.2, image 640x320, 160 px padding top and bottom
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, t) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(t.scale, 3.2, epsilon = 0.01);
        assert_eq!((t.pad_x, t.pad_y), (0, 160));
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, t) = letterbox(&frame, 640);

        let inside = tensor[[0, 0, t.pad_y as usize + 1, 1]];
        assert_relative_eq!(inside, 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
    }

    #[test]
    fn test_letterbox_maps_back_to_frame() {
        let frame = Frame::new(vec![0u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (_, t) = letterbox(&frame, 640);
        let (x, y) = t.to_frame(320.0, 320.0);
        assert_relative_eq!(x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(y, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_parse_predictions_row_major() {
        // six detections of five features; only two rows are non-zero
        let mut data = vec![0.0f32; 6 * 5];
        data[..5].copy_from_slice(&[50.0, 50.0, 20.0, 40.0, 0.9]);
        data[5..10].copy_from_slice(&[10.0, 10.0, 4.0, 4.0, 0.1]);
        let faces = parse_predictions(&data, &[1, 6, 5], &identity(), 0.5).unwrap();
        assert_eq!(faces.len(), 1);
        let f = &faces[0];
        assert_eq!((f.x1, f.y1, f.x2, f.y2), (40.0, 30.0, 60.0, 70.0));
        assert_relative_eq!(f.confidence, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_parse_predictions_transposed_skips_keypoints() {
        // feature-major layout needs more detections than features
        let num_dets = 21;
        let num_feats = 20;
        let mut data = vec![0.0f32; num_feats * num_dets];
        let first = [
            100.0, 80.0, 40.0, 40.0, 0.8, // box
            90.0, 70.0, 0.9, // left eye
            110.0, 70.0, 0.9, // right eye
            100.0, 80.0, 0.2, // nose, not visible
            92.0, 90.0, 0.9, // left mouth
            108.0, 90.0, 0.9, // right mouth
        ];
        for (feat, v) in first.iter().enumerate() {
            data[feat * num_dets] = *v;
        }

        let faces = parse_predictions(
            &data,
            &[1, num_feats, num_dets],
            &identity(),
            0.5,
        )
        .unwrap();
        assert_eq!(faces.len(), 1);
        let f = &faces[0];
        assert_eq!((f.x1, f.y1, f.x2, f.y2), (80.0, 60.0, 120.0, 100.0));
        assert_relative_eq!(f.confidence, 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_parse_predictions_rejects_bad_shape() {
        assert!(parse_predictions(&[0.0; 4], &[1, 4], &identity(), 0.5).is_err());
        assert!(parse_predictions(&[0.0; 3], &[1, 3, 1], &identity(), 0.5).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let faces = vec![
            FaceBox::new(5.0, 5.0, 105.0, 105.0, 0.8),
            FaceBox::new(0.0, 0.0, 100.0, 100.0, 0.9),
        ];
        let kept = nms(faces, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping_in_confidence_order() {
        let faces = vec![
            FaceBox::new(0.0, 0.0, 50.0, 50.0, 0.6),
            FaceBox::new(200.0, 200.0, 250.0, 250.0, 0.8),
        ];
        let kept = nms(faces, 0.3);
        assert_eq!(kept.len(), 2);
        assert_relative_eq!(kept[0].confidence, 0.8);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(Vec::new(), 0.3).is_empty());
    }
}
