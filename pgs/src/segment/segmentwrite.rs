/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    ObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PresentationCompositionSegment,
    Segment,
    Sequence,
    WindowDefinitionSegment,
};
use std::io::{
    Error as IoError,
    Write,
};
use byteorder::{BigEndian, WriteBytesExt};
use thiserror::Error as ThisError;

const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;
const MAX_OBJECT_DATA_LENGTH: usize = 0xFF_FFFF;
const FIRST_ODS_HEADER_SIZE: usize = 11;
const OTHER_ODS_HEADER_SIZE: usize = 4;

/// A specialized [`Result`](std::result::Result) type for segment-writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [WriteSegmentExt].
///
/// Errors are caused by either invalid state or by an underlying I/O error.
#[derive(ThisError, Debug)]
pub enum WriteError {
    /// The [`Segment`] could not be written because of an underlying I/O error.
    #[error("segment IO error")]
    IoError {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },
    /// The [`Segment`] ([`PresentationCompositionSegment`]) being written has more than 255
    /// composition objects.
    #[error("too many composition objects in presentation composition segment")]
    TooManyCompositionObjects,
    /// The [`Segment`] ([`WindowDefinitionSegment`]) being written has more than 255 window
    /// definitions.
    #[error("too many window definitions")]
    TooManyWindowDefinitions,
    /// The object being written has more than 16,777,211 compressed bytes of data.
    #[error("object data is too large")]
    ObjectDataTooLarge,
    /// The payload does not fit the two-byte length field.
    #[error("segment payload of {0} bytes is too large")]
    SegmentTooLarge(usize),
}

/// Allows writing segment bodies to a destination.
pub trait WriteSegmentExt {
    /// Writes the kind byte, the length and the payload of a segment, returning the number of
    /// bytes written.
    fn write_segment(&mut self, segment: &Segment) -> WriteResult<usize>;
}

impl<T> WriteSegmentExt for T where
    T: Write,
{

    fn write_segment(&mut self, segment: &Segment) -> WriteResult<usize> {

        let payload = match segment {
            Segment::PresentationComposition(pcs) => generate_pcs(pcs)?,
            Segment::WindowDefinition(wds) => generate_wds(wds)?,
            Segment::PaletteDefinition(pds) => generate_pds(pds)?,
            Segment::ObjectDefinition(ods) => generate_ods(ods)?,
            Segment::End(_) => vec![],
        };

        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(WriteError::SegmentTooLarge(payload.len()))
        }

        debug_assert_eq!(payload.len(), segment.payload_len());

        self.write_u8(segment.kind())?;
        self.write_u16::<BigEndian>(payload.len() as u16)?;
        self.write_all(&payload)?;

        Ok(3 + payload.len())
    }
}

impl Segment {

    /// The number of payload bytes this segment occupies once written, which is the value of
    /// its length field.
    pub fn payload_len(&self) -> usize {
        match self {
            Segment::PresentationComposition(pcs) => {
                11 + pcs.composition_objects.iter()
                    .map(|co| if co.is_cropped() { 16 } else { 8 })
                    .sum::<usize>()
            }
            Segment::WindowDefinition(wds) => 1 + 9 * wds.windows.len(),
            Segment::PaletteDefinition(pds) => 2 + 5 * pds.entries.len(),
            Segment::ObjectDefinition(ods) => {
                if ods.sequence.is_first() {
                    FIRST_ODS_HEADER_SIZE + ods.data.len()
                } else {
                    OTHER_ODS_HEADER_SIZE + ods.data.len()
                }
            }
            Segment::End(_) => 0,
        }
    }
}

impl ObjectDefinitionSegment {

    /// Splits RLE-compressed object data into as many segments as needed to keep each one
    /// within the two-byte length field.
    pub fn split(
        id: u16,
        version: u8,
        width: u16,
        height: u16,
        data: &[u8],
    ) -> WriteResult<Vec<ObjectDefinitionSegment>> {

        if data.len() + 4 > MAX_OBJECT_DATA_LENGTH {
            return Err(WriteError::ObjectDataTooLarge)
        }

        let first_size = MAX_PAYLOAD_SIZE - FIRST_ODS_HEADER_SIZE;
        let other_size = MAX_PAYLOAD_SIZE - OTHER_ODS_HEADER_SIZE;
        let data_length = (data.len() + 4) as u32;

        if data.len() <= first_size {
            return Ok(vec![
                ObjectDefinitionSegment {
                    id,
                    version,
                    sequence: Sequence::Single,
                    data_length,
                    width,
                    height,
                    data: data.to_vec(),
                }
            ])
        }

        let mut segments = vec![
            ObjectDefinitionSegment {
                id,
                version,
                sequence: Sequence::First,
                data_length,
                width,
                height,
                data: data[..first_size].to_vec(),
            }
        ];
        let mut chunks = data[first_size..].chunks(other_size).peekable();

        while let Some(chunk) = chunks.next() {
            segments.push(
                ObjectDefinitionSegment {
                    id,
                    version,
                    sequence: if chunks.peek().is_some() { Sequence::Middle } else { Sequence::Last },
                    data: chunk.to_vec(),
                    ..Default::default()
                }
            );
        }

        Ok(segments)
    }
}

fn generate_pcs(pcs: &PresentationCompositionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(pcs.width)?;
    payload.write_u16::<BigEndian>(pcs.height)?;
    payload.write_u8(pcs.frame_rate)?;
    payload.write_u16::<BigEndian>(pcs.composition_number)?;
    payload.write_u8(pcs.composition_state.to_byte())?;
    payload.write_u8(pcs.palette_update_flag)?;
    payload.write_u8(pcs.palette_id)?;

    if pcs.composition_objects.len() <= 255 {
        payload.write_u8(pcs.composition_objects.len() as u8)?;
    } else {
        return Err(WriteError::TooManyCompositionObjects)
    }

    for comp_obj in &pcs.composition_objects {

        payload.write_u16::<BigEndian>(comp_obj.object_id)?;
        payload.write_u8(comp_obj.window_id)?;
        payload.write_u8(comp_obj.cropped_flag)?;
        payload.write_u16::<BigEndian>(comp_obj.x)?;
        payload.write_u16::<BigEndian>(comp_obj.y)?;

        if comp_obj.is_cropped() {

            let crop = comp_obj.crop.clone().unwrap_or_default();

            payload.write_u16::<BigEndian>(crop.x)?;
            payload.write_u16::<BigEndian>(crop.y)?;
            payload.write_u16::<BigEndian>(crop.width)?;
            payload.write_u16::<BigEndian>(crop.height)?;
        }
    }

    Ok(payload)
}

fn generate_wds(wds: &WindowDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    if wds.windows.len() <= 255 {
        payload.write_u8(wds.windows.len() as u8)?;
    } else {
        return Err(WriteError::TooManyWindowDefinitions)
    }

    for window in wds.windows.iter() {
        payload.write_u8(window.id)?;
        payload.write_u16::<BigEndian>(window.x)?;
        payload.write_u16::<BigEndian>(window.y)?;
        payload.write_u16::<BigEndian>(window.width)?;
        payload.write_u16::<BigEndian>(window.height)?;
    }

    Ok(payload)
}

fn generate_pds(pds: &PaletteDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u8(pds.id)?;
    payload.write_u8(pds.version)?;

    for entry in &pds.entries {
        payload.write_u8(entry.id)?;
        payload.write_u8(entry.y)?;
        payload.write_u8(entry.cr)?;
        payload.write_u8(entry.cb)?;
        payload.write_u8(entry.alpha)?;
    }

    Ok(payload)
}

fn generate_ods(ods: &ObjectDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(ods.id)?;
    payload.write_u8(ods.version)?;
    payload.write_u8(ods.sequence.to_flags())?;

    if ods.sequence.is_first() {

        if ods.data_length as usize <= MAX_OBJECT_DATA_LENGTH {
            payload.write_u24::<BigEndian>(ods.data_length)?;
        } else {
            return Err(WriteError::ObjectDataTooLarge)
        }

        payload.write_u16::<BigEndian>(ods.width)?;
        payload.write_u16::<BigEndian>(ods.height)?;
    }

    payload.write_all(&ods.data)?;

    Ok(payload)
}
