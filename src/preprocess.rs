use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer};
use image::DynamicImage;
use ndarray::Array4;

use crate::error::DetectError;

/// Dense `[1, H, W, 3]` f32 buffer in RGB order, built per request and
/// discarded after inference.
pub type PreprocessedTensor = Array4<f32>;

/// Normalize an arbitrary image into the fixed shape the graph expects.
///
/// Any color mode is first converted to RGB (alpha dropped), then the image
/// is squashed to exactly `resolution` — no cropping, padding, or
/// aspect-ratio preservation, matching the training-time assumption of the
/// exported model. Pixel values stay on the 0-255 scale; the graph performs
/// its own scaling.
pub fn preprocess(
    image: &DynamicImage,
    resolution: (u32, u32),
) -> Result<PreprocessedTensor, DetectError> {
    let (width, height) = resolution;

    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut resized = Image::new(width, height, PixelType::U8x3);
    let mut resizer = Resizer::new();
    let options = ResizeOptions::new();
    resizer
        .resize(&rgb, &mut resized, Some(&options))
        .map_err(|e| DetectError::ImageDecode {
            reason: format!("cannot resize {}x{} image: {e}", image.width(), image.height()),
        })?;

    let (w, h) = (width as usize, height as usize);
    let mut tensor = Array4::<f32>::zeros((1, h, w, 3));
    for (i, px) in resized.buffer().chunks_exact(3).enumerate() {
        let y = i / w;
        let x = i % w;
        tensor[[0, y, x, 0]] = f32::from(px[0]);
        tensor[[0, y, x, 1]] = f32::from(px[1]);
        tensor[[0, y, x, 2]] = f32::from(px[2]);
    }
    Ok(tensor)
}
