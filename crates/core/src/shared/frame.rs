use ndarray::ArrayView3;

/// A single decoded picture: contiguous RGB bytes in row-major order.
///
/// `index` is the absolute frame number within the source video (0 for
/// still images), so records produced from a frame can point back into the
/// original timeline even after a seek.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Wraps a decoded RGB image without copying its pixels.
    pub fn from_rgb_image(image: image::RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `[x1, x2) x [y1, y2)` into a new frame.
    ///
    /// Bounds are clamped to the frame; an inverted or empty rectangle
    /// yields a zero-sized frame.
    pub fn crop(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> Frame {
        let x2 = x2.min(self.width);
        let y2 = y2.min(self.height);
        let x1 = x1.min(x2);
        let y1 = y1.min(y2);

        let channels = self.channels as usize;
        let row_len = (x2 - x1) as usize * channels;
        let mut data = Vec::with_capacity(row_len * (y2 - y1) as usize);
        for row in y1..y2 {
            let start = (row as usize * self.width as usize + x1 as usize) * channels;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Frame::new(data, x2 - x1, y2 - y1, self.channels, self.index)
    }

    /// Expands RGB pixels to RGBA with an opaque alpha channel.
    pub fn to_rgba(&self) -> Vec<u8> {
        if self.channels == 4 {
            return self.data.clone();
        }
        let mut rgba = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for px in self.data.chunks_exact(self.channels as usize) {
            rgba.extend_from_slice(&px[..3]);
            rgba.push(u8::MAX);
        }
        rgba
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
