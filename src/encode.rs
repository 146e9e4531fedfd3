use std::path::Path;

use crate::{
    error::{VorosetError, VorosetResult},
    render::FrameRgba,
};

/// Drop the alpha channel, keeping the top 24 bits of every pixel intact.
pub fn rgba_to_rgb24(frame: &FrameRgba) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(frame.data.len() / 4 * 3);
    for px in frame.data.chunks_exact(4) {
        rgb.extend_from_slice(&px[0..3]);
    }
    rgb
}

/// Down-convert to 24 bits per pixel and write a JPEG at `path`.
pub fn save_jpeg(frame: &FrameRgba, path: impl AsRef<Path>) -> VorosetResult<()> {
    let path = path.as_ref();
    let expected = (frame.width as usize)
        .checked_mul(frame.height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| VorosetError::image("frame dimensions overflow"))?;
    if frame.data.len() != expected {
        return Err(VorosetError::image(format!(
            "frame data is {} bytes, expected {} for {}x{} rgba8",
            frame.data.len(),
            expected,
            frame.width,
            frame.height
        )));
    }

    let rgb = rgba_to_rgb24(frame);
    image::save_buffer_with_format(
        path,
        &rgb,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Jpeg,
    )
    .map_err(|e| VorosetError::image(format!("cannot save '{}': {e}", path.display())))
}
