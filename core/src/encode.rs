//! Encoder (C4): compresses a [`RawBitmap`] into WebP/PNG/JPEG bytes per the
//! active [`RenderOptions`] codec knobs.
//!
//! Grounded on `albert-einshutoin-lazy-image`'s `engine::encoder` module for
//! the per-format encoder wiring (mozjpeg `Compress`, `webp::Encoder`,
//! `oxipng::optimize_from_memory`); simplified to this pipeline's needs (no
//! ICC/EXIF embedding — out of scope per §1, "image post-processing beyond
//! encode").
//!
//! Invariant (§4.4): the encoder never resizes. Dimension enforcement already
//! happened in the decoder's `compute_scale` (§4.3); by the time a [`RawBitmap`]
//! reaches here its dimensions are guaranteed to respect the codec ceiling.

use crate::config::{OutputFormat, RenderOptions};
use crate::decoder::RawBitmap;
use crate::pipeline_error::{ConvertError, ConvertResultT};

/// Encodes `bitmap` (RGBA8) to `render_opts.format`, honoring the configured
/// quality/effort/compression knobs.
pub fn encode(bitmap: &RawBitmap, render_opts: &RenderOptions) -> ConvertResultT<Vec<u8>> {
    if bitmap.width_px == 0 || bitmap.height_px == 0 {
        return Err(ConvertError::InvalidInput(
            "cannot encode a zero-dimension bitmap".into(),
        ));
    }
    let expected_len = bitmap.width_px as usize * bitmap.height_px as usize * 4;
    if bitmap.pixel_bytes.len() != expected_len {
        return Err(ConvertError::InvalidInput(format!(
            "bitmap buffer length {} does not match {}x{}x4",
            bitmap.pixel_bytes.len(),
            bitmap.width_px,
            bitmap.height_px
        )));
    }

    match render_opts.format {
        OutputFormat::Webp => encode_webp(bitmap, render_opts.webp_quality, render_opts.webp_effort),
        OutputFormat::Jpeg => encode_jpeg(bitmap, render_opts.jpeg_quality),
        OutputFormat::Png => encode_png(bitmap, render_opts.png_compression),
    }
}

/// Reports whether any preferred native codec is missing, for [`crate::config::Capabilities::probe`]
/// — the fallback itself (picking whichever encoder the environment provides)
/// happens once at startup, not per call (§4.4).
pub fn native_codecs_available() -> bool {
    cfg!(feature = "encode-webp") || cfg!(feature = "encode-jpeg") || cfg!(feature = "encode-png")
}

#[cfg(feature = "encode-webp")]
fn encode_webp(bitmap: &RawBitmap, quality: u8, effort: u8) -> ConvertResultT<Vec<u8>> {
    let mut config = webp::WebPConfig::new().map_err(|_| {
        ConvertError::EncodeFailed {
            page: 0,
            detail: "failed to create WebPConfig".into(),
        }
    })?;
    config.quality = quality.min(100) as f32;
    // method (0-6) trades encode time for compression; the spec's "effort"
    // knob maps directly onto libwebp's method parameter.
    config.method = effort.min(6) as i32;
    config.pass = if effort >= 4 { 6 } else { 1 };
    // Smart chroma subsampling (§4.4): non-zero `sns_strength` lets the
    // encoder pick chroma subsampling per-segment instead of blindly 4:2:0.
    config.sns_strength = 80;
    config.autofilter = 1;

    let encoder = webp::Encoder::from_rgba(&bitmap.pixel_bytes, bitmap.width_px, bitmap.height_px);
    let mem = encoder.encode_advanced(&config).map_err(|e| ConvertError::EncodeFailed {
        page: 0,
        detail: format!("webp encode failed: {e:?}"),
    })?;
    Ok(mem.to_vec())
}

#[cfg(not(feature = "encode-webp"))]
fn encode_webp(_bitmap: &RawBitmap, _quality: u8, _effort: u8) -> ConvertResultT<Vec<u8>> {
    Err(ConvertError::ConfigError("encode-webp feature is not enabled".into()))
}

#[cfg(feature = "encode-jpeg")]
fn encode_jpeg(bitmap: &RawBitmap, quality: u8) -> ConvertResultT<Vec<u8>> {
    use mozjpeg::{ColorSpace, Compress};

    // mozjpeg wants packed RGB; the source bitmap is RGBA (§4.3 contract), so
    // drop the alpha channel per pixel. A rendered PDF page is always fully
    // opaque (the decoder fills white before drawing), so this never loses
    // information that matters.
    let rgb: Vec<u8> = bitmap
        .pixel_bytes
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(bitmap.width_px as usize, bitmap.height_px as usize);
    comp.set_color_space(ColorSpace::JCS_YCbCr);
    comp.set_quality(quality.min(100) as f32);
    comp.set_progressive_mode();

    let mut output = Vec::with_capacity(rgb.len() / 8);
    let mut writer = comp.start_compress(&mut output).map_err(|e| ConvertError::EncodeFailed {
        page: 0,
        detail: format!("mozjpeg start_compress failed: {e:?}"),
    })?;

    let stride = bitmap.width_px as usize * 3;
    for row in rgb.chunks(stride) {
        writer.write_scanlines(row).map_err(|e| ConvertError::EncodeFailed {
            page: 0,
            detail: format!("mozjpeg write_scanlines failed: {e:?}"),
        })?;
    }
    writer.finish().map_err(|e| ConvertError::EncodeFailed {
        page: 0,
        detail: format!("mozjpeg finish failed: {e:?}"),
    })?;

    Ok(output)
}

#[cfg(not(feature = "encode-jpeg"))]
fn encode_jpeg(_bitmap: &RawBitmap, _quality: u8) -> ConvertResultT<Vec<u8>> {
    Err(ConvertError::ConfigError("encode-jpeg feature is not enabled".into()))
}

#[cfg(feature = "encode-png")]
fn encode_png(bitmap: &RawBitmap, compression_level: u8) -> ConvertResultT<Vec<u8>> {
    use image::{ImageBuffer, Rgba};

    let image_buf: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_raw(bitmap.width_px, bitmap.height_px, bitmap.pixel_bytes.clone())
            .ok_or_else(|| ConvertError::EncodeFailed {
                page: 0,
                detail: "failed to build image buffer from bitmap".into(),
            })?;

    let mut raw_png = Vec::new();
    image_buf
        .write_to(&mut std::io::Cursor::new(&mut raw_png), image::ImageFormat::Png)
        .map_err(|e| ConvertError::EncodeFailed {
            page: 0,
            detail: format!("png encode failed: {e}"),
        })?;

    // oxipng presets run 0 (fastest) - 6 (max); the spec's `png_compression`
    // knob (0-9, zlib convention) is mapped proportionally onto that range.
    let preset = ((compression_level.min(9) as u32 * 6) / 9) as u8;
    let mut options = oxipng::Options::from_preset(preset);
    options.strip = oxipng::StripChunks::Safe;

    oxipng::optimize_from_memory(&raw_png, &options).map_err(|e| ConvertError::EncodeFailed {
        page: 0,
        detail: format!("oxipng optimization failed: {e}"),
    })
}

#[cfg(not(feature = "encode-png"))]
fn encode_png(_bitmap: &RawBitmap, _compression_level: u8) -> ConvertResultT<Vec<u8>> {
    Err(ConvertError::ConfigError("encode-png feature is not enabled".into()))
}
