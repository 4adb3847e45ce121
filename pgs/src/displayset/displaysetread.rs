/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    DisplaySet,
    Framing,
    MAGIC_NUMBER,
    super::segment::{
        PresentationCompositionSegment,
        ReadError as SegmentReadError,
        ReadSegmentExt,
        Segment,
    },
};
use std::io::{Error as IoError, ErrorKind, Read};
use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, trace};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for display set-reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// The error type for [ReadDisplaySetExt].
///
/// Every variant is fatal for the stream being read.
#[derive(ThisError, Debug)]
pub enum ReadError {
    /// The display set could not be read because of an underlying I/O error.
    #[error("display set IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    /// A segment within the display set could not be read.
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentReadError,
    },
    /// A segment header does not begin with `PG`.
    #[error("invalid magic number 0x{0:04X}")]
    InvalidMagicNumber(u16),
    /// The display set ended without a presentation composition segment.
    #[error("display set has no presentation composition segment")]
    MissingPresentationCompositionSegment,
    /// The display set has more than one presentation composition segment.
    #[error("unexpected presentation composition segment within display set")]
    UnexpectedPresentationCompositionSegment,
}

/// Allows reading display sets from a source.
pub trait ReadDisplaySetExt {
    /// Reads the next display set, returning `None` if the source is exhausted before its first
    /// byte.
    fn read_display_set(&mut self, framing: Framing) -> ReadResult<Option<DisplaySet>>;
}

impl<T> ReadDisplaySetExt for T where
    T: Read,
{

    fn read_display_set(&mut self, framing: Framing) -> ReadResult<Option<DisplaySet>> {

        let mut lead = read_lead_byte(self)?;

        if lead.is_none() {
            return Ok(None)
        }

        let mut timestamps = match framing {
            Framing::Headers => None,
            Framing::Bare { pts, dts } => Some((pts, dts)),
        };
        let mut composition = None::<PresentationCompositionSegment>;
        let mut windows = vec![];
        let mut palettes = vec![];
        let mut objects = vec![];

        loop {

            let kind = match framing {
                Framing::Headers => {

                    let magic = match lead.take() {
                        Some(high) => u16::from_be_bytes([high, self.read_u8()?]),
                        None => self.read_u16::<BigEndian>()?,
                    };

                    if magic != MAGIC_NUMBER {
                        return Err(ReadError::InvalidMagicNumber(magic))
                    }

                    let pts = self.read_u32::<BigEndian>()?;
                    let dts = self.read_u32::<BigEndian>()?;

                    match timestamps {
                        Some((first_pts, first_dts)) => {
                            if (first_pts, first_dts) != (pts, dts) {
                                debug!("segment header timestamps differ within display set");
                            }
                        }
                        None => timestamps = Some((pts, dts)),
                    }

                    self.read_u8()?
                }
                Framing::Bare { .. } => {
                    match lead.take() {
                        Some(kind) => kind,
                        None => self.read_u8()?,
                    }
                }
            };

            match self.read_segment_body(kind)? {
                Segment::PresentationComposition(pcs) => {
                    if composition.is_some() {
                        return Err(ReadError::UnexpectedPresentationCompositionSegment)
                    }
                    composition = Some(pcs);
                }
                Segment::WindowDefinition(wds) => windows.push(wds),
                Segment::PaletteDefinition(pds) => palettes.push(pds),
                Segment::ObjectDefinition(ods) => objects.push(ods),
                Segment::End(_) => break,
            }
        }

        let composition = composition.ok_or(ReadError::MissingPresentationCompositionSegment)?;
        let (pts, dts) = timestamps.unwrap_or_default();

        trace!(
            "read display set at {} with {} window, {} palette and {} object segments",
            pts,
            windows.len(),
            palettes.len(),
            objects.len(),
        );

        Ok(
            Some(
                DisplaySet {
                    pts,
                    dts,
                    composition,
                    windows,
                    palettes,
                    objects,
                }
            )
        )
    }
}

/// Reads a single byte, distinguishing a clean end of input from a failure.
fn read_lead_byte<R: Read + ?Sized>(input: &mut R) -> ReadResult<Option<u8>> {

    let mut buffer = [0u8; 1];

    loop {
        match input.read(&mut buffer) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buffer[0])),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}
