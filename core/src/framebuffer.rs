use embedded_graphics::{
    Pixel,
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Size},
};
use image::GrayImage;
use image::imageops::{BiLevel, dither};

use crate::error::PlayerError;

pub const WIDTH: usize = 800;
pub const HEIGHT: usize = 480;
pub const BUFFER_SIZE: usize = WIDTH / 8 * HEIGHT;

/// Physical mounting orientation, derived purely from the incoming image
/// dimensions relative to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Image matches the panel (800x480).
    Vertical,
    /// Image is rotated 90 degrees (480x800).
    Horizontal,
}

impl Orientation {
    /// Any size other than the panel resolution or its 90-degree rotation
    /// is a contract violation: the caller must letterbox first.
    pub fn detect(width: u32, height: u32) -> Result<Orientation, PlayerError> {
        if width as usize == WIDTH && height as usize == HEIGHT {
            Ok(Orientation::Vertical)
        } else if width as usize == HEIGHT && height as usize == WIDTH {
            Ok(Orientation::Horizontal)
        } else {
            Err(PlayerError::BadFrameSize {
                width,
                height,
                panel_width: WIDTH as u32,
                panel_height: HEIGHT as u32,
            })
        }
    }
}

/// One device-ready frame: 8 pixels per byte, MSB first, 1 = white.
/// The driver inverts each byte at transmission time.
pub struct Framebuffer {
    buffer: [u8; BUFFER_SIZE],
    orientation: Orientation,
}

impl Framebuffer {
    pub fn new(orientation: Orientation) -> Self {
        // Blank screen is all white
        Self {
            buffer: [0xFF; BUFFER_SIZE],
            orientation,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn data(&self) -> &[u8; BUFFER_SIZE] {
        &self.buffer
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: BinaryColor) {
        let size = self.size();
        if x < 0 || y < 0 || x as u32 >= size.width || y as u32 >= size.height {
            return;
        }
        let (x, y) = match self.orientation {
            Orientation::Vertical => (x as usize, y as usize),
            Orientation::Horizontal => (y as usize, HEIGHT - 1 - x as usize),
        };
        let index = y * WIDTH + x;
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);
        match color {
            BinaryColor::On => self.buffer[byte_index] |= 1 << bit_index,
            BinaryColor::Off => self.buffer[byte_index] &= !(1 << bit_index),
        }
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        match self.orientation {
            Orientation::Vertical => Size::new(WIDTH as u32, HEIGHT as u32),
            Orientation::Horizontal => Size::new(HEIGHT as u32, WIDTH as u32),
        }
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.set_pixel(coord.x, coord.y, color);
        }
        Ok(())
    }
}

/// Dither a grayscale still with Floyd-Steinberg error diffusion and pack
/// it into a device-ready buffer.
pub fn encode(image: &GrayImage) -> Result<Framebuffer, PlayerError> {
    let orientation = Orientation::detect(image.width(), image.height())?;
    log::debug!("Encoding {orientation:?} frame");

    let mut mono = image.clone();
    dither(&mut mono, &BiLevel);

    let mut frame = Framebuffer::new(orientation);
    for (x, y, pixel) in mono.enumerate_pixels() {
        if pixel.0[0] == 0 {
            frame.set_pixel(x as i32, y as i32, BinaryColor::Off);
        }
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn white(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([0xFF]))
    }

    #[test]
    fn vertical_buffer_is_48000_bytes() {
        let frame = encode(&white(800, 480)).unwrap();
        assert_eq!(frame.orientation(), Orientation::Vertical);
        assert_eq!(frame.data().len(), 48000);
        assert!(frame.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn horizontal_buffer_is_48000_bytes() {
        let frame = encode(&white(480, 800)).unwrap();
        assert_eq!(frame.orientation(), Orientation::Horizontal);
        assert_eq!(frame.data().len(), 48000);
    }

    #[test]
    fn other_sizes_are_rejected() {
        assert!(encode(&white(640, 480)).is_err());
        assert!(encode(&white(800, 479)).is_err());
    }

    #[test]
    fn vertical_origin_pixel_clears_msb_of_first_byte() {
        let mut image = white(800, 480);
        image.put_pixel(0, 0, Luma([0]));
        let frame = encode(&image).unwrap();
        assert_eq!(frame.data()[0], 0x7F);
        assert!(frame.data()[1..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn horizontal_origin_pixel_maps_to_byte_47900() {
        // (0,0) in a rotated 480x800 image lands at new_x=0, new_y=479,
        // i.e. bit 7 of byte 479*800/8.
        let mut image = white(480, 800);
        image.put_pixel(0, 0, Luma([0]));
        let frame = encode(&image).unwrap();
        assert_eq!(frame.data()[47900], 0x7F);
        assert!(frame.data()[..47900].iter().all(|&b| b == 0xFF));
        assert!(frame.data()[47901..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn packing_is_msb_first() {
        let mut image = white(800, 480);
        for x in 0..8 {
            if x % 2 == 0 {
                image.put_pixel(x, 0, Luma([0]));
            }
        }
        let frame = encode(&image).unwrap();
        assert_eq!(frame.data()[0], 0b0101_0101);
    }

    #[test]
    fn draw_target_clear_fills_buffer() {
        let mut frame = Framebuffer::new(Orientation::Vertical);
        frame.clear(BinaryColor::Off).unwrap();
        assert!(frame.data().iter().all(|&b| b == 0x00));
    }
}
