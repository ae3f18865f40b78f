use crate::domain::error::PipelineError;
use crate::domain::error::PipelineError::{DecodeError, EncodeError, ResizeError};
use crate::domain::size::ThumbnailSize;
use crate::domain::FormatHint;
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer, SrcCropping};
use image::{imageops, DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::{debug, error, instrument, warn};

const RESIZE_OPTS: ResizeOptions = ResizeOptions {
    algorithm: ResizeAlg::Convolution(FilterType::CatmullRom),
    cropping: SrcCropping::None,
    mul_div_alpha: true,
};

/// Decodes a source image; for animated formats only the first frame is kept.
///
/// The format is sniffed from the bytes, so a mislabelled extension still decodes.
#[instrument(skip(bytes))]
pub fn decode_image(
    key: &str,
    bytes: &[u8],
) -> Result<(DynamicImage, ImageFormat), PipelineError> {
    let decode_error = |reason: String| {
        error!(key, reason = %reason, "Could not decode image");
        DecodeError {
            key: key.to_string(),
            reason,
        }
    };

    let detected = image::guess_format(bytes).map_err(|e| decode_error(e.to_string()))?;
    let image = image::load_from_memory_with_format(bytes, detected)
        .map_err(|e| decode_error(e.to_string()))?;

    let format = key.format_hint().unwrap_or_else(|| {
        warn!("Defaulting to detected {detected:?} format for {key}");
        detected
    });
    debug!(key, width = image.width(), height = image.height(), "Image decoded");
    Ok((image, format))
}

/// Largest size with the source's aspect ratio that fits in `size`×`size`, never enlarged.
pub fn fit_dimensions(width: u32, height: u32, size: ThumbnailSize) -> (u32, u32) {
    let bound = size.px();
    if width <= bound && height <= bound {
        return (width, height);
    }
    let scale = f64::min(bound as f64 / width as f64, bound as f64 / height as f64);
    let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, bound);
    (fit(width), fit(height))
}

/// Fits the source into a `size`×`size` transparent canvas, anchored top-left.
#[instrument(skip(src_image))]
pub fn resample(
    key: &str,
    src_image: &DynamicImage,
    size: ThumbnailSize,
) -> Result<RgbaImage, PipelineError> {
    let (new_width, new_height) = fit_dimensions(src_image.width(), src_image.height(), size);
    let src_rgba = DynamicImage::ImageRgba8(src_image.to_rgba8());

    let thumbnail = if (new_width, new_height) == (src_image.width(), src_image.height()) {
        src_rgba
    } else {
        let mut dst_image = DynamicImage::new_rgba8(new_width, new_height);
        Resizer::new()
            .resize(&src_rgba, &mut dst_image, &RESIZE_OPTS)
            .map_err(|e| {
                error!(key, size = size.px(), error = %e, "Could not resize image");
                ResizeError {
                    key: key.to_string(),
                    size: size.px(),
                    reason: e.to_string(),
                }
            })?;
        dst_image
    };

    let mut canvas = RgbaImage::new(size.px(), size.px());
    imageops::replace(&mut canvas, &thumbnail.to_rgba8(), 0, 0);
    debug!(key, size = size.px(), new_width, new_height, "Image resampled");
    Ok(canvas)
}

/// Encodes a thumbnail canvas in `format`.
///
/// JPEG carries no alpha, so the canvas is flattened to RGB first.
#[instrument(skip(canvas))]
pub fn encode_image(
    key: &str,
    size: ThumbnailSize,
    canvas: RgbaImage,
    format: ImageFormat,
) -> Result<Vec<u8>, PipelineError> {
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8()),
        _ => DynamicImage::ImageRgba8(canvas),
    };

    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).map_err(|e| {
        error!(key, size = size.px(), ?format, error = %e, "Could not encode thumbnail");
        EncodeError {
            key: key.to_string(),
            size: size.px(),
            reason: e.to_string(),
        }
    })?;
    Ok(buffer.into_inner())
}
