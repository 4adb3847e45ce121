/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Compresses and decompresses object pixel data.
//!
//! Each pixel of an object is a palette entry ID. Lines are run-length encoded as follows,
//! where `C` is a nonzero palette entry ID and `L` a run length:
//!
//! | Bytes                          | Meaning                        |
//! |--------------------------------|--------------------------------|
//! | `CCCCCCCC`                     | one pixel of `C`               |
//! | `00000000 00LLLLLL`            | `L` (1-63) pixels of 0         |
//! | `00000000 01LLLLLL LLLLLLLL`   | `L` (64-16,383) pixels of 0    |
//! | `00000000 10LLLLLL CCCCCCCC`   | `L` (3-63) pixels of `C`       |
//! | `00000000 11LLLLLL LLLLLLLL CCCCCCCC` | `L` (64-16,383) pixels of `C` |
//! | `00000000 00000000`            | end of line                    |


use thiserror::Error as ThisError;

const MAX_RUN_LENGTH: usize = 0x3FFF;

/// The error type for [decode].
#[derive(ThisError, Debug, PartialEq)]
pub enum RleError {
    /// The data ends in the middle of a run.
    #[error("object data ends in the middle of a run at offset {offset}")]
    Truncated {
        offset: usize,
    },
}

/// A rectangular grid of palette entry IDs, stored row by row.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Bitmap {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
}

impl Bitmap {

    /// Creates a bitmap with every pixel set to entry 0.
    pub fn new(width: u16, height: u16) -> Self {
        Bitmap {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(usize::from(self.width).max(1))
    }

    /// Sets `count` pixels starting at `(x, y)`, discarding whatever falls outside the bitmap.
    fn fill(&mut self, x: usize, y: usize, count: usize, value: u8) {

        let width = self.width as usize;

        if y >= self.height as usize || x >= width {
            return
        }

        let start = y * width + x;
        let end = y * width + (x + count).min(width);

        self.pixels[start..end].fill(value);
    }
}

/// Decompresses object data into a bitmap of the given dimensions.
///
/// Decoding runs until the data is exhausted; the last line need not carry an end-of-line
/// marker. Pixels falling outside of `width` and `height` are dropped.
pub fn decode(data: &[u8], width: u16, height: u16) -> Result<Bitmap, RleError> {

    let mut bitmap = Bitmap::new(width, height);
    let mut offset = 0;
    let mut x = 0_usize;
    let mut y = 0_usize;
    let next = |offset: &mut usize| -> Result<u8, RleError> {
        let byte = data.get(*offset).copied().ok_or(RleError::Truncated { offset: *offset })?;
        *offset += 1;
        Ok(byte)
    };

    while offset < data.len() {

        let byte1 = next(&mut offset)?;

        if byte1 != 0x00 {
            bitmap.fill(x, y, 1, byte1);
            x += 1;
            continue
        }

        let byte2 = next(&mut offset)?;

        if byte2 == 0x00 {
            x = 0;
            y += 1;
            continue
        }

        let mut count = (byte2 & 0x3F) as usize;

        if byte2 & 0x40 != 0 {
            count = (count << 8) | next(&mut offset)? as usize;
        }

        let value = if byte2 & 0x80 != 0 {
            next(&mut offset)?
        } else {
            0x00
        };

        bitmap.fill(x, y, count, value);
        x += count;
    }

    Ok(bitmap)
}

/// Compresses a bitmap, terminating every line with an end-of-line marker.
pub fn encode(bitmap: &Bitmap) -> Vec<u8> {

    let mut output = Vec::<u8>::new();

    for line in bitmap.rows() {

        let mut start = 0;

        while start < line.len() {
            let byte = line[start];
            let count = line[start..].iter().take_while(|&&next| next == byte).count();
            output_rle_sequence(&mut output, byte, count);
            start += count;
        }

        output.push(0x00);
        output.push(0x00);
    }

    output
}

fn output_rle_sequence(output: &mut Vec<u8>, byte: u8, mut count: usize) {

    while count > 0 {

        let run = count.min(MAX_RUN_LENGTH);

        if byte == 0x00 {
            match run {
                1 ..= 63 => {
                    output.push(0x00);
                    output.push(run as u8);
                }
                _ => {
                    output.push(0x00);
                    output.push(0x40 | (run >> 8) as u8);
                    output.push((run & 0xFF) as u8);
                }
            }
        } else {
            match run {
                1 => {
                    output.push(byte);
                }
                2 ..= 63 => {
                    output.push(0x00);
                    output.push(0x80 | run as u8);
                    output.push(byte);
                }
                _ => {
                    output.push(0x00);
                    output.push(0xC0 | (run >> 8) as u8);
                    output.push((run & 0xFF) as u8);
                    output.push(byte);
                }
            }
        }

        count -= run;
    }
}
