/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    DisplaySet,
    Framing,
    MAGIC_NUMBER,
    super::segment::{
        WriteError as SegmentWriteError,
        WriteSegmentExt,
    },
};
use std::io::{Error as IoError, Write};
use byteorder::{BigEndian, WriteBytesExt};
use thiserror::Error as ThisError;

const HEADER_SIZE: usize = 10;

/// A specialized [`Result`](std::result::Result) type for display set-writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [WriteDisplaySetExt].
///
/// Errors are caused by either an inability to deconstruct a display set (DS) into segments, or
/// by an underlying I/O error.
#[derive(ThisError, Debug)]
pub enum WriteError {
    /// The display set could not be written because of an underlying I/O error.
    #[error("display set IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    /// The display set could not be written because of an underlying segment error.
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentWriteError,
    },
}

/// Allows writing display sets to a sink.
pub trait WriteDisplaySetExt {
    /// Writes a display set: its composition, then every window, palette and object segment,
    /// then an end segment. Returns the number of bytes written.
    fn write_display_set(&mut self, display_set: &DisplaySet, framing: Framing)
        -> WriteResult<usize>;
}

impl<T> WriteDisplaySetExt for T where
    T: Write,
{

    fn write_display_set(&mut self, display_set: &DisplaySet, framing: Framing)
        -> WriteResult<usize> {

        let mut written = 0;

        for segment in display_set.segments() {

            if framing == Framing::Headers {
                self.write_u16::<BigEndian>(MAGIC_NUMBER)?;
                self.write_u32::<BigEndian>(display_set.pts)?;
                self.write_u32::<BigEndian>(display_set.dts)?;
                written += HEADER_SIZE;
            }

            written += self.write_segment(&segment)?;
        }

        Ok(written)
    }
}
