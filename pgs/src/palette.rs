/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Maps palette entries to colors and rasterizes decoded objects for OCR.
//!
//! Palette entries are stored as BT.601 YCrCb with an alpha channel. Recognition only needs a
//! brightness per pixel, so a rasterized object is a grayscale image whose intensity is the
//! mean of the RGB channels scaled by alpha.


use super::{
    rle::Bitmap,
    segment::{PaletteDefinitionSegment, PaletteEntry},
};
use image::{GrayAlphaImage, LumaA, Rgba};

/// Converts a palette entry to RGBA using the inverse BT.601 transform.
pub fn to_rgba(entry: &PaletteEntry) -> Rgba<u8> {

    let y = entry.y as f64;
    let cb = entry.cb as f64 - 128.0;
    let cr = entry.cr as f64 - 128.0;

    Rgba([
        clamp(y + 1.402 * cr),
        clamp(y - 0.344136 * cb - 0.714136 * cr),
        clamp(y + 1.772 * cb),
        entry.alpha,
    ])
}

/// The alpha-scaled brightness of a palette entry.
pub fn intensity(entry: &PaletteEntry) -> u8 {

    let Rgba([r, g, b, a]) = to_rgba(entry);
    let mean = (r as f64 + g as f64 + b as f64) / 3.0;

    clamp(mean * a as f64 / 255.0)
}

/// Renders a bitmap through a palette.
///
/// Each pixel becomes `LumaA([intensity, alpha])`. Pixels whose palette entry is not defined are
/// left fully transparent.
pub fn rasterize(bitmap: &Bitmap, palette: &PaletteDefinitionSegment) -> GrayAlphaImage {

    let mut lookup = [None; 256];

    for entry in palette.entries.iter() {
        lookup[entry.id as usize] = Some(LumaA([intensity(entry), entry.alpha]));
    }

    let mut image = GrayAlphaImage::new(bitmap.width as u32, bitmap.height as u32);

    for (index, pixel) in image.pixels_mut().enumerate() {
        if let Some(color) = bitmap.pixels.get(index).and_then(|&id| lookup[id as usize]) {
            *pixel = color;
        }
    }

    image
}

fn clamp(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
