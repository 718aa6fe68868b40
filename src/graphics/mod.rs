pub mod blend;
pub mod draw;

use thiserror::Error;

use crate::sim::Rgb;
use blend::Argb;

/// Receives the draw commands for one frame.
pub trait Canvas {
    fn size(&self) -> (u32, u32);

    fn draw_background(&mut self, color: Rgb);

    fn draw_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: u8);

    /// Soft edges for the circles that follow. Optional.
    fn set_blur(&mut self, _enabled: bool) {}
}

/// Hands out one canvas per frame and takes it back on commit.
///
/// `commit` always takes ownership of the canvas, whether or not the frame
/// made it to the screen, so no exit path can hold on to it.
pub trait Surface {
    type Canvas: Canvas;

    /// `None` while there is nothing to draw on; the frame is skipped.
    fn begin_frame(&mut self) -> Option<Self::Canvas>;

    fn commit(&mut self, canvas: Self::Canvas) -> Result<(), SurfaceError>;
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("the surface went away before the frame was posted")]
    Gone,

    #[error("unable to present the frame: {0}")]
    Present(String),
}

/// CPU side frame buffer, one opaque ARGB word per pixel.
pub struct PixelBuffer {
    buffer: Vec<Argb>,
    width: usize,
    height: usize,
    blur: bool,
}

impl PixelBuffer {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            buffer: vec![0; w * h],
            width: w,
            height: h,
            blur: false,
        }
    }

    pub fn sizeu(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Keeps the allocation when shrinking.
    pub fn resize(&mut self, w: usize, h: usize) {
        let len = w * h;
        if len > self.buffer.len() {
            self.buffer.resize(len, 0);
        }
        self.width = w;
        self.height = h;
    }

    pub fn fill(&mut self, c: Argb) {
        let len = self.width * self.height;
        self.buffer[..len].fill(c);
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Argb> {
        if x >= self.width || y >= self.height {
            return None;
        }

        self.buffer.get(y * self.width + x).copied()
    }

    pub fn row_mut(&mut self, y: usize) -> Option<&mut [Argb]> {
        if y >= self.height {
            return None;
        }

        let start = y * self.width;
        self.buffer.get_mut(start..start + self.width)
    }

    pub fn as_slice(&self) -> &[Argb] {
        &self.buffer[..self.width * self.height]
    }

    /// Copies into a destination of the same size, such as a presentable
    /// window buffer. Extra destination pixels are left alone.
    pub fn copy_to(&self, dest: &mut [u32]) {
        let src = self.as_slice();
        let n = src.len().min(dest.len());
        dest[..n].copy_from_slice(&src[..n]);
    }
}

impl Canvas for PixelBuffer {
    fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    fn draw_background(&mut self, color: Rgb) {
        self.fill(color.to_argb());
    }

    fn draw_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgb, alpha: u8) {
        // Blurred bubbles fade out over half their radius.
        let feather = if self.blur {
            (radius * 0.5).max(1.0)
        } else {
            1.0
        };

        draw::draw_disc(self, x, y, radius, feather, color.to_argb(), alpha);
    }

    fn set_blur(&mut self, enabled: bool) {
        self.blur = enabled;
    }
}
