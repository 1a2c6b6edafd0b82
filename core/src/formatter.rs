use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};

/// Scale a still to fit the panel without distorting its aspect ratio,
/// centred on a black canvas of exactly `panel_width` x `panel_height`.
///
/// Re-applying the formatter to its own output is a no-op: an image that
/// is already panel-sized has scale factor 1 and offset (0, 0).
pub fn letterbox(image: &DynamicImage, panel_width: u32, panel_height: u32) -> GrayImage {
    let (src_width, src_height) = (image.width(), image.height());
    if (src_width, src_height) == (panel_width, panel_height) {
        return image.to_luma8();
    }

    let scale = f64::min(
        panel_width as f64 / src_width as f64,
        panel_height as f64 / src_height as f64,
    );
    let resize_width = (src_width as f64 * scale).round() as u32;
    let resize_height = (src_height as f64 * scale).round() as u32;

    log::debug!(
        "Letterboxing {src_width}x{src_height} -> {resize_width}x{resize_height} on {panel_width}x{panel_height}"
    );

    let resized = imageops::resize(
        &image.to_luma8(),
        resize_width,
        resize_height,
        FilterType::Lanczos3,
    );

    let mut canvas = GrayImage::new(panel_width, panel_height);
    let offset_x = (panel_width - resize_width) / 2;
    let offset_y = (panel_height - resize_height) / 2;
    imageops::replace(&mut canvas, &resized, offset_x as i64, offset_y as i64);
    canvas
}
