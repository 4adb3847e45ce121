/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Converts display set sources into `.srt` and `.sup` files.
//!
//! Output files are written to a temporary file in the destination directory and only moved
//! into place once complete, so a failed export never leaves a partial file behind.


use super::{
    coalesce::{Coalescer, Error as CoalesceError},
    displayset::{Framing, ReadError, WriteDisplaySetExt, WriteError},
    ocr::{OcrError, Recognize},
    source::DisplaySetSource,
    srt::write_entry,
};
use std::{
    io::{BufWriter, Error as IoError, ErrorKind, Write},
    path::Path,
};
use log::{debug, info};
use tempfile::NamedTempFile;
use thiserror::Error as ThisError;

/// The error type for exports.
#[derive(ThisError, Debug)]
pub enum ExportError {
    #[error("export IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("could not read display sets")]
    ReadError {
        #[from]
        source: ReadError,
    },
    #[error("could not write display sets")]
    WriteError {
        #[from]
        source: WriteError,
    },
    #[error("could not prepare text recognition")]
    OcrError {
        #[from]
        source: OcrError,
    },
    #[error("could not extract subtitles")]
    CoalesceError {
        #[from]
        source: CoalesceError,
    },
}

/// Settings shared by every export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    /// Language of the subtitle track, as an ISO 639-2 code.
    pub language: String,
    /// Drop display sets that repeat the objects of the one before them.
    pub cleanup: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            language: "eng".to_string(),
            cleanup: true,
        }
    }
}

/// Writes a file through a temporary file in the same directory.
///
/// The destination must not exist yet. If `write` fails, the temporary file is removed and the
/// destination is left untouched.
pub fn write_atomically<P, F, E>(path: P, write: F) -> Result<(), E> where
    P: AsRef<Path>,
    F: FnOnce(&mut dyn Write) -> Result<(), E>,
    E: From<IoError>,
{

    let path = path.as_ref();

    if path.exists() {
        return Err(
            IoError::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ).into()
        )
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }

    debug!("moving {} to {}", temp.path().display(), path.display());
    temp.persist_noclobber(path).map_err(|err| err.error)?;

    Ok(())
}

/// Recognizes the subtitles of a source and writes them as SubRip text, returning how many were
/// written.
pub fn write_subtitles<S, R, W>(
    source: S,
    recognizer: R,
    options: &ExportOptions,
    output: W,
) -> Result<usize, ExportError> where
    S: DisplaySetSource,
    R: Recognize,
    W: Write,
{
    if options.cleanup {
        subtitles_to(Coalescer::new(source.deduplicate(), recognizer, &options.language), output)
    } else {
        subtitles_to(Coalescer::new(source, recognizer, &options.language), output)
    }
}

/// Writes the display sets of a source as a `.sup` bitstream, returning how many were written.
pub fn write_display_sets<S, W>(
    source: S,
    options: &ExportOptions,
    output: W,
) -> Result<usize, ExportError> where
    S: DisplaySetSource,
    W: Write,
{
    if options.cleanup {
        display_sets_to(source.deduplicate(), output)
    } else {
        display_sets_to(source, output)
    }
}

/// Exports the subtitles of a source to a new `.srt` file.
pub fn sup_to_srt<S, R, P>(
    source: S,
    recognizer: R,
    options: &ExportOptions,
    path: P,
) -> Result<usize, ExportError> where
    S: DisplaySetSource,
    R: Recognize,
    P: AsRef<Path>,
{

    let mut count = 0;

    write_atomically(path.as_ref(), |output| {
        count = write_subtitles(source, recognizer, options, output)?;
        Ok::<(), ExportError>(())
    })?;
    info!("wrote {} subtitles to {}", count, path.as_ref().display());

    Ok(count)
}

/// Exports the display sets of a source to a new `.sup` file.
pub fn sup_to_sup<S, P>(
    source: S,
    options: &ExportOptions,
    path: P,
) -> Result<usize, ExportError> where
    S: DisplaySetSource,
    P: AsRef<Path>,
{

    let mut count = 0;

    write_atomically(path.as_ref(), |output| {
        count = write_display_sets(source, options, output)?;
        Ok::<(), ExportError>(())
    })?;
    info!("wrote {} display sets to {}", count, path.as_ref().display());

    Ok(count)
}

fn subtitles_to<S, R, W>(
    subtitles: Coalescer<S, R>,
    mut output: W,
) -> Result<usize, ExportError> where
    S: DisplaySetSource,
    R: Recognize,
    W: Write,
{

    let mut count = 0;

    for subtitle in subtitles {
        count += 1;
        write_entry(&mut output, count, &subtitle?)?;
    }

    Ok(count)
}

fn display_sets_to<S, W>(mut source: S, mut output: W) -> Result<usize, ExportError> where
    S: DisplaySetSource,
    W: Write,
{

    let mut count = 0;

    while let Some(display_set) = source.next_display_set()? {
        output.write_display_set(&display_set, Framing::Headers)?;
        count += 1;
    }

    Ok(count)
}
