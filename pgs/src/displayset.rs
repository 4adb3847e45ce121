/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Operates on display sets.
//!
//! A display set (DS) is every segment from a presentation composition segment (PCS) up to and
//! including the next end segment (ES). Within a `.sup` file, each of those segments is preceded
//! by a header:
//!
//! | Field     | Size | Value                        |
//! |-----------|------|------------------------------|
//! | Magic     | 2    | `0x5047` (`PG`)              |
//! | PTS       | 4    | presentation time, 90 kHz    |
//! | DTS       | 4    | decoding time, 90 kHz        |
//!
//! Container tracks omit the header and carry the timing out of band; see [`Framing`].

#[cfg(test)]
mod tests;

mod displaysetread;
mod displaysetwrite;

pub use displaysetread::*;
pub use displaysetwrite::*;

use super::segment::{
    EndSegment,
    ObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PresentationCompositionSegment,
    Segment,
    WindowDefinitionSegment,
};

/// The magic number that opens every segment header: `PG`.
pub const MAGIC_NUMBER: u16 = 0x5047;

/// How segments are delimited in a bitstream.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Framing {
    /// Every segment is preceded by the `PG` magic number and its PTS and DTS.
    Headers,
    /// Segments carry no header. When reading, the display set is given these timestamps. When
    /// writing, they are ignored.
    Bare {
        pts: u32,
        dts: u32,
    },
}

/// A single display set along with every segment it carries.
///
/// Windows, palettes and objects are kept in bitstream order. A DS may legitimately carry none
/// of them, such as one that clears the screen.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct DisplaySet {
    /// Presentation timestamp in 90 kHz ticks.
    pub pts: u32,
    /// Decoding timestamp in 90 kHz ticks.
    pub dts: u32,
    pub composition: PresentationCompositionSegment,
    pub windows: Vec<WindowDefinitionSegment>,
    pub palettes: Vec<PaletteDefinitionSegment>,
    pub objects: Vec<ObjectDefinitionSegment>,
}

impl DisplaySet {

    /// The segments making up this DS in the order they are written.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        std::iter::once(Segment::PresentationComposition(self.composition.clone()))
            .chain(self.windows.iter().cloned().map(Segment::WindowDefinition))
            .chain(self.palettes.iter().cloned().map(Segment::PaletteDefinition))
            .chain(self.objects.iter().cloned().map(Segment::ObjectDefinition))
            .chain(std::iter::once(Segment::End(EndSegment)))
    }

    /// Whether this DS carries the same object data as another, fragment by fragment.
    pub fn has_same_objects(&self, other: &DisplaySet) -> bool {
        self.objects.len() == other.objects.len()
            && self.objects.iter().zip(other.objects.iter()).all(|(a, b)| a.data == b.data)
    }
}
