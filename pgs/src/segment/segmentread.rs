/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    CompositionObject,
    CompositionState,
    Crop,
    EndSegment,
    ObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    Segment,
    Sequence,
    WindowDefinition,
    WindowDefinitionSegment,
    ES_KIND,
    ODS_KIND,
    PCS_KIND,
    PDS_KIND,
    WDS_KIND,
};
use std::io::{Cursor, Error as IoError, Read};
use byteorder::{BigEndian, ReadBytesExt};
use log::trace;
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for segment-reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [ReadSegmentExt].
///
/// Every variant is fatal for the stream being read: once a segment cannot be framed, the
/// offsets of everything after it are meaningless.
#[derive(ThisError, Debug)]
pub enum ReadError {
    /// The segment could not be read because of an underlying I/O error.
    #[error("segment IO error")]
    IoError {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },
    /// The kind byte does not name any of the five segment types.
    #[error("unknown segment type 0x{0:02X}")]
    UnknownSegmentType(u8),
    /// The segment payload is shorter or longer than what its fields require.
    #[error("segment 0x{kind:02X} does not match its declared length of {declared} bytes")]
    FramingError {
        kind: u8,
        declared: usize,
    },
    /// A palette definition segment defines the same entry twice.
    #[error("palette definition segment defines entry {0} more than once")]
    DuplicatePaletteEntry(u8),
}

/// Allows reading segment bodies from a source.
///
/// A segment body is the kind byte, the two-byte length and the payload. Any `PG` header
/// preceding it must already have been consumed.
pub trait ReadSegmentExt {
    /// Reads the next segment body.
    fn read_segment(&mut self) -> ReadResult<Segment>;
    /// Reads the length and payload of a segment whose kind byte has already been read.
    fn read_segment_body(&mut self, kind: u8) -> ReadResult<Segment>;
}

impl<T> ReadSegmentExt for T where
    T: Read,
{

    fn read_segment(&mut self) -> ReadResult<Segment> {

        let kind = self.read_u8()?;

        self.read_segment_body(kind)
    }

    fn read_segment_body(&mut self, kind: u8) -> ReadResult<Segment> {

        if !matches!(kind, PDS_KIND | ODS_KIND | PCS_KIND | WDS_KIND | ES_KIND) {
            return Err(ReadError::UnknownSegmentType(kind))
        }

        let size = self.read_u16::<BigEndian>()? as usize;
        let mut payload = vec![0u8; size];

        self.read_exact(&mut payload)?;
        trace!("read segment 0x{:02X} with {} byte payload", kind, size);

        Segment::decode(kind, &payload)
    }
}

impl Segment {

    /// Decodes a segment payload of the given kind.
    ///
    /// The payload must be consumed exactly; both leftover bytes and running short are
    /// reported as [`ReadError::FramingError`].
    pub fn decode(kind: u8, payload: &[u8]) -> ReadResult<Segment> {

        let mut input = Cursor::new(payload);
        let parsed = match kind {
            PDS_KIND => parse_pds(&mut input).map(Segment::PaletteDefinition),
            ODS_KIND => parse_ods(&mut input).map(Segment::ObjectDefinition),
            PCS_KIND => parse_pcs(&mut input).map(Segment::PresentationComposition),
            WDS_KIND => parse_wds(&mut input).map(Segment::WindowDefinition),
            ES_KIND => Ok(Segment::End(EndSegment)),
            _ => return Err(ReadError::UnknownSegmentType(kind)),
        };
        let framing_error = ReadError::FramingError { kind, declared: payload.len() };
        let segment = match parsed {
            Ok(segment) => segment,
            // The only I/O error a slice cursor produces is running out of bytes.
            Err(ReadError::IoError { .. }) => return Err(framing_error),
            Err(err) => return Err(err),
        };

        if input.position() as usize != payload.len() {
            return Err(framing_error)
        }

        Ok(segment)
    }
}

fn parse_pcs(input: &mut Cursor<&[u8]>) -> ReadResult<PresentationCompositionSegment> {

    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let frame_rate = input.read_u8()?;
    let composition_number = input.read_u16::<BigEndian>()?;
    let composition_state = CompositionState::from_byte(input.read_u8()?);
    let palette_update_flag = input.read_u8()?;
    let palette_id = input.read_u8()?;
    let comp_obj_count = input.read_u8()? as usize;
    let mut composition_objects = Vec::with_capacity(comp_obj_count);

    for _ in 0..comp_obj_count {

        let mut composition_object = CompositionObject {
            object_id: input.read_u16::<BigEndian>()?,
            window_id: input.read_u8()?,
            cropped_flag: input.read_u8()?,
            x: input.read_u16::<BigEndian>()?,
            y: input.read_u16::<BigEndian>()?,
            crop: None,
        };

        if composition_object.is_cropped() {
            composition_object.crop = Some(
                Crop {
                    x: input.read_u16::<BigEndian>()?,
                    y: input.read_u16::<BigEndian>()?,
                    width: input.read_u16::<BigEndian>()?,
                    height: input.read_u16::<BigEndian>()?,
                }
            );
        }

        composition_objects.push(composition_object);
    }

    Ok(
        PresentationCompositionSegment {
            width,
            height,
            frame_rate,
            composition_number,
            composition_state,
            palette_update_flag,
            palette_id,
            composition_objects,
        }
    )
}

fn parse_wds(input: &mut Cursor<&[u8]>) -> ReadResult<WindowDefinitionSegment> {

    let count = input.read_u8()?;
    let mut windows = Vec::with_capacity(count as usize);

    for _ in 0..count {
        windows.push(
            WindowDefinition {
                id: input.read_u8()?,
                x: input.read_u16::<BigEndian>()?,
                y: input.read_u16::<BigEndian>()?,
                width: input.read_u16::<BigEndian>()?,
                height: input.read_u16::<BigEndian>()?,
            }
        );
    }

    Ok(WindowDefinitionSegment { windows })
}

fn parse_pds(input: &mut Cursor<&[u8]>) -> ReadResult<PaletteDefinitionSegment> {

    let id = input.read_u8()?;
    let version = input.read_u8()?;
    let count = (input.get_ref().len() - 2) / 5;
    let mut entries = Vec::<PaletteEntry>::with_capacity(count);

    for _ in 0..count {

        let entry = PaletteEntry {
            id: input.read_u8()?,
            y: input.read_u8()?,
            cr: input.read_u8()?,
            cb: input.read_u8()?,
            alpha: input.read_u8()?,
        };

        if entries.iter().any(|existing| existing.id == entry.id) {
            return Err(ReadError::DuplicatePaletteEntry(entry.id))
        }

        entries.push(entry);
    }

    Ok(
        PaletteDefinitionSegment {
            id,
            version,
            entries,
        }
    )
}

fn parse_ods(input: &mut Cursor<&[u8]>) -> ReadResult<ObjectDefinitionSegment> {

    let id = input.read_u16::<BigEndian>()?;
    let version = input.read_u8()?;
    let sequence = Sequence::from_flags(input.read_u8()?);
    let (data_length, width, height) = if sequence.is_first() {
        (
            input.read_u24::<BigEndian>()?,
            input.read_u16::<BigEndian>()?,
            input.read_u16::<BigEndian>()?,
        )
    } else {
        (0, 0, 0)
    };
    let mut data = Vec::new();

    input.read_to_end(&mut data)?;

    Ok(
        ObjectDefinitionSegment {
            id,
            version,
            sequence,
            data_length,
            width,
            height,
            data,
        }
    )
}
