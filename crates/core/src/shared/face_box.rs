/// Axis-aligned face bounding box in frame pixel coordinates.
///
/// Coordinates are `[x1, y1)`–`[x2, y2)` as floats straight from the
/// detector; callers that index pixels go through [`FaceBox::pixel_bounds`].
#[derive(Clone, Debug, PartialEq)]
pub struct FaceBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
}

impl FaceBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
        }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Returns a copy limited to a `width` x `height` frame.
    pub fn clamp(&self, width: u32, height: u32) -> FaceBox {
        let w = width as f64;
        let h = height as f64;
        FaceBox {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
            confidence: self.confidence,
        }
    }

    /// Integer pixel rectangle `(x1, y1, x2, y2)` covering the box, clamped.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let c = self.clamp(width, height);
        (
            c.x1.floor() as u32,
            c.y1.floor() as u32,
            c.x2.ceil() as u32,
            c.y2.ceil() as u32,
        )
    }
}
