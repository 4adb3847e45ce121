/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Reads, writes and converts Presentation Graphics Stream (PGS) subtitles.
//!
//! PGS is the bitmap subtitle format of Blu-ray discs. A stream is a sequence of display sets,
//! each made up of segments. This crate decodes and encodes both, decompresses and colors the
//! bitmaps they carry, and merges display sets over time into timed text through an OCR engine.
//!
//! The pieces fit together as follows:
//!
//! 1. a [`source`] produces [display sets](displayset) from a `.sup` file or container blocks,
//! 2. the [`coalesce`] stage reassembles [objects](object), [decodes](rle) and
//!    [rasterizes](palette) them and hands them to a [recognizer](ocr),
//! 3. [`export`] writes the result as [`.srt`](srt) text or as a cleaned `.sup` file.

pub mod coalesce;
pub mod displayset;
pub mod export;
pub mod object;
pub mod ocr;
pub mod palette;
pub mod rle;
pub mod segment;
pub mod source;
pub mod srt;

use std::time::Duration;

/// Converts a 90 kHz timestamp to a duration.
pub fn ts_to_duration(ts: u32) -> Duration {
    Duration::from_nanos(ts as u64 * 100_000 / 9)
}

/// Formats a 90 kHz timestamp as `HH:MM:SS.mmm`.
pub fn ts_to_timestamp(ts: u32) -> String {

    let millis = ts as u64 / 90;

    format!(
        "{:02}:{:02}:{:02}.{:03}",
        millis / 3_600_000,
        millis / 60_000 % 60,
        millis / 1_000 % 60,
        millis % 1_000,
    )
}
