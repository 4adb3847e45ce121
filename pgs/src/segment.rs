/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Operates on individual segments.
//!
//! # Overview
//!
//! A segment is the most fundamental data structure within a PGS bitstream. Multiple segments
//! come together in a well-defined manner to form a display set (DS).
//!
//! There are five types that typically appear in this order:
//!
//! 1. Presentation Composition Segment (PCS)
//! 2. Window Definition Segment (WDS)
//! 3. Palette Definition Segment (PDS)
//! 4. Object Definition Segment (ODS)
//! 5. End Segment (ES)
//!
//! Within a `.sup` file, every segment is preceded by a header carrying the `PG` magic number
//! and the PTS/DTS timestamps. Segments taken from a container track carry no such header, as
//! the container provides the timing. This module therefore only deals with the segment body:
//! a one-byte kind, a two-byte length and the payload that follows. The header is handled by
//! [`displayset`](crate::displayset).
//!
//! ## Presentation Composition Segment (PCS)
//!
//! A PCS signals the start of a new display set (DS). It also defines properties such as the
//! role of the DS within the larger epoch, the screen resolution, and initial mappings of
//! objects to windows.
//!
//! ## Window Definition Segment (WDS)
//!
//! A WDS defines the areas of the screen that will be used to show objects during the larger
//! epoch.
//!
//! ## Palette Definition Segment (PDS)
//!
//! A PDS contains a list of YCrCbA values with each one having a unique ID.
//!
//! ## Object Definition Segment (ODS)
//!
//! An ODS carries run-length encoded pixel data. Objects too large for one segment are split
//! across several, the first of which declares the total length and the dimensions.
//!
//! ## End Segment (ES)
//!
//! An ES signals that the current DS has come to an end.


mod segmentread;
mod segmentwrite;

pub use segmentread::*;
pub use segmentwrite::*;

/// Kind byte of a Palette Definition Segment.
pub const PDS_KIND: u8 = 0x14;
/// Kind byte of an Object Definition Segment.
pub const ODS_KIND: u8 = 0x15;
/// Kind byte of a Presentation Composition Segment.
pub const PCS_KIND: u8 = 0x16;
/// Kind byte of a Window Definition Segment.
pub const WDS_KIND: u8 = 0x17;
/// Kind byte of an End Segment.
pub const ES_KIND: u8 = 0x80;

/// Set on a composition object whose record carries a cropping rectangle.
pub const CROPPED_FLAG: u8 = 0x80;

const FIRST_IN_SEQUENCE: u8 = 0x80;
const LAST_IN_SEQUENCE: u8 = 0x40;

/// Represents a PGS segment.
#[derive(Clone, Debug, Hash, PartialEq)]
pub enum Segment {
    /// Represents a Presentation Composition Segment (PCS).
    PresentationComposition(PresentationCompositionSegment),
    /// Represents a Window Definition Segment (WDS).
    WindowDefinition(WindowDefinitionSegment),
    /// Represents a Palette Definition Segment (PDS).
    PaletteDefinition(PaletteDefinitionSegment),
    /// Represents an Object Definition Segment (ODS).
    ObjectDefinition(ObjectDefinitionSegment),
    /// Represents an End Segment (ES).
    End(EndSegment),
}

impl Segment {

    /// The kind byte that precedes this segment in a bitstream.
    pub fn kind(&self) -> u8 {
        match self {
            Segment::PresentationComposition(_) => PCS_KIND,
            Segment::WindowDefinition(_) => WDS_KIND,
            Segment::PaletteDefinition(_) => PDS_KIND,
            Segment::ObjectDefinition(_) => ODS_KIND,
            Segment::End(_) => ES_KIND,
        }
    }
}

/// Defines the role of a PCS (and thereby the associated DS) within an epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompositionState {
    /// This updates the composition that is on the screen. This is typically used to clear the
    /// current composition from the screen by defining a PCS with no composition objects,
    /// thereby effectively closing out the current epoch.
    Normal,
    /// Used to refresh the screen with the current composition. The associated DS should
    /// redefine the same windows, objects, and palettes as the `EpochStart` DS.
    AcquisitionPoint,
    /// Indicates that the associated PCS (and the DS it belongs to) defines the start of a new
    /// epoch. As such, the associated DS should contain all other segments necessary to render
    /// a composition onto the screen.
    EpochStart,
    /// Any other nonzero value. Some discs use these; they are treated like `EpochStart`.
    Other(u8),
}

impl CompositionState {

    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => Self::Normal,
            0x40 => Self::AcquisitionPoint,
            0x80 => Self::EpochStart,
            other => Self::Other(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Normal => 0x00,
            Self::AcquisitionPoint => 0x40,
            Self::EpochStart => 0x80,
            Self::Other(other) => other,
        }
    }

    /// Whether palettes, windows and objects defined before this DS must be discarded.
    ///
    /// Every nonzero state does so.
    pub fn resets_context(self) -> bool {
        self != Self::Normal
    }
}

impl Default for CompositionState {
    fn default() -> Self { Self::EpochStart }
}

/// Defines this object's role in a possible multi-part object.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Sequence {
    /// This object is discrete and stands alone.
    Single,
    /// This object is the first portion in a multi-part object.
    First,
    /// This object is neither the first nor the last portion in a multi-part object.
    Middle,
    /// This object is the last portion in a multi-part object.
    Last,
}

impl Sequence {

    pub fn from_flags(flags: u8) -> Self {
        match (flags & FIRST_IN_SEQUENCE != 0, flags & LAST_IN_SEQUENCE != 0) {
            (true, true) => Self::Single,
            (true, false) => Self::First,
            (false, true) => Self::Last,
            (false, false) => Self::Middle,
        }
    }

    pub fn to_flags(self) -> u8 {
        match self {
            Self::Single => FIRST_IN_SEQUENCE | LAST_IN_SEQUENCE,
            Self::First => FIRST_IN_SEQUENCE,
            Self::Middle => 0x00,
            Self::Last => LAST_IN_SEQUENCE,
        }
    }

    /// Whether this portion carries the object's length and dimensions.
    pub fn is_first(self) -> bool {
        matches!(self, Self::Single | Self::First)
    }

    /// Whether this portion completes the object.
    pub fn is_last(self) -> bool {
        matches!(self, Self::Single | Self::Last)
    }
}

impl Default for Sequence {
    fn default() -> Self { Self::Single }
}

/// Defines a Presentation Composition Segment (PCS).
///
/// A PCS marks the beginning of a display set (DS).
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PresentationCompositionSegment {
    /// The width of the display in pixels. This value should be consistent within a
    /// presentation.
    pub width: u16,
    /// The height of the display in pixels. This value should be consistent within a
    /// presentation.
    pub height: u16,
    /// This value should be set to `0x10` and can typically be ignored.
    pub frame_rate: u8,
    pub composition_number: u16,
    pub composition_state: CompositionState,
    /// `0x80` when this DS only updates the palette, `0x00` otherwise.
    pub palette_update_flag: u8,
    /// The palette used to render every composition object of this DS.
    pub palette_id: u8,
    pub composition_objects: Vec<CompositionObject>,
}

/// Places an object within a window.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct CompositionObject {
    pub object_id: u16,
    pub window_id: u8,
    /// Raw flag byte. When [`CROPPED_FLAG`] is set, the record carries `crop`.
    pub cropped_flag: u8,
    pub x: u16,
    pub y: u16,
    pub crop: Option<Crop>,
}

impl CompositionObject {

    pub fn is_cropped(&self) -> bool {
        self.cropped_flag & CROPPED_FLAG != 0
    }
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Crop {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinitionSegment {
    pub windows: Vec<WindowDefinition>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinition {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Defines a Palette Definition Segment (PDS).
///
/// Entry IDs are unique within a segment. Entries are kept in bitstream order so that a decoded
/// segment is written back byte for byte.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PaletteDefinitionSegment {
    pub id: u8,
    pub version: u8,
    pub entries: Vec<PaletteEntry>,
}

impl PaletteDefinitionSegment {

    /// Looks up the entry for a pixel value.
    pub fn entry(&self, id: u8) -> Option<&PaletteEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PaletteEntry {
    pub id: u8,
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

/// Defines an Object Definition Segment (ODS).
///
/// `data_length`, `width` and `height` are only present in the bitstream when `sequence` is
/// [`Sequence::Single`] or [`Sequence::First`]; they are zero otherwise. `data_length` counts
/// the RLE bytes of every portion of the object plus four bytes for the dimensions.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct ObjectDefinitionSegment {
    pub id: u16,
    pub version: u8,
    pub sequence: Sequence,
    pub data_length: u32,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct EndSegment;
