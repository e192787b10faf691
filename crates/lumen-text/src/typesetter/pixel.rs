use crate::model::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// One alpha byte per pixel.
    A8,
    /// Premultiplied RGBA, one byte per channel.
    #[default]
    Rgba8888,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::A8 => 1,
            PixelFormat::Rgba8888 => 4,
        }
    }
}

/// A rendered image; starts fully transparent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelData {
    width: u32,
    height: u32,
    format: PixelFormat,
    buffer: Vec<u8>,
}

impl PixelData {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let size = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            buffer: vec![0; size],
        }
    }

    pub fn empty(format: PixelFormat) -> Self {
        Self::new(0, 0, format)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn same_shape(&self, other: &PixelData) -> bool {
        self.width == other.width && self.height == other.height && self.format == other.format
    }

    /// Channels of the pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        let range = self.pixel_range(x, y)?;
        self.buffer.get(range)
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> Option<&mut [u8]> {
        let range = self.pixel_range(x, y)?;
        self.buffer.get_mut(range)
    }

    /// Alpha of the pixel at `(x, y)`, 0 outside the image.
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        let alpha_index = self.format.bytes_per_pixel() - 1;
        self.pixel(x, y).map_or(0, |pixel| pixel[alpha_index])
    }

    /// Mutable pixels of one row, `[x_min, x_max)` clipped to the image.
    pub(crate) fn row_mut(&mut self, y: u32, x_min: u32, x_max: u32) -> &mut [u8] {
        if y >= self.height {
            return &mut [];
        }
        let bpp = self.format.bytes_per_pixel();
        let x_max = x_max.min(self.width);
        let x_min = x_min.min(x_max);
        let row = y as usize * self.width as usize;
        &mut self.buffer[(row + x_min as usize) * bpp..(row + x_max as usize) * bpp]
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Fill `[x_min, x_max) x [y_min, y_max)` with `pixel`, clipped to the image.
    pub(crate) fn fill_rect(&mut self, x_min: u32, x_max: u32, y_min: u32, y_max: u32, pixel: &[u8]) {
        for y in y_min..y_max.min(self.height) {
            for target in self.row_mut(y, x_min, x_max).chunks_exact_mut(pixel.len()) {
                target.copy_from_slice(pixel);
            }
        }
    }

    fn pixel_range(&self, x: u32, y: u32) -> Option<core::ops::Range<usize>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = (y as usize * self.width as usize + x as usize) * bpp;
        Some(start..start + bpp)
    }
}

/// Channel value of a unit float, truncated like a cast.
pub(crate) fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// `color` as straight RGBA bytes.
pub(crate) fn rgba(color: Color) -> [u8; 4] {
    [channel(color.r), channel(color.g), channel(color.b), channel(color.a)]
}

/// `color` as premultiplied RGBA bytes.
pub(crate) fn premultiplied(color: Color) -> [u8; 4] {
    let alpha = channel(color.a);
    let scale = |value: f32| (value.clamp(0.0, 1.0) * f32::from(alpha)) as u8;
    [scale(color.r), scale(color.g), scale(color.b), alpha]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffers_are_transparent() {
        let pixels = PixelData::new(3, 2, PixelFormat::Rgba8888);
        assert_eq!(pixels.as_bytes().len(), 24);
        assert!(pixels.as_bytes().iter().all(|&byte| byte == 0));
        assert_eq!(pixels.pixel(3, 0), None);
    }

    #[test]
    fn fill_rect_clips_to_the_image() {
        let mut pixels = PixelData::new(4, 4, PixelFormat::A8);
        pixels.fill_rect(2, 10, 3, 10, &[200]);
        assert_eq!(pixels.alpha(2, 3), 200);
        assert_eq!(pixels.alpha(3, 3), 200);
        assert_eq!(pixels.alpha(1, 3), 0);
        assert_eq!(pixels.alpha(2, 2), 0);
    }

    #[test]
    fn premultiplied_scales_by_alpha() {
        let half_red = Color::new(1.0, 0.0, 0.0, 0.5);
        assert_eq!(premultiplied(half_red), [127, 0, 0, 127]);
        assert_eq!(rgba(half_red), [255, 0, 0, 127]);
    }
}
