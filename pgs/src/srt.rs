/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Writes subtitles in the SubRip (`.srt`) text format.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:03,000
//! First subtitle
//!
//! 2
//! ...
//! ```

#[cfg(test)]
mod tests;

use super::coalesce::Subtitle;
use std::{
    io::{Result as IoResult, Write},
    time::Duration,
};

/// Formats a time as `HH:MM:SS,mmm`.
pub fn format_time(time: Duration) -> String {

    let millis = time.as_millis();

    format!(
        "{:02}:{:02}:{:02},{:03}",
        millis / 3_600_000,
        millis / 60_000 % 60,
        millis / 1_000 % 60,
        millis % 1_000,
    )
}

/// Writes one numbered block.
pub fn write_entry<W: Write + ?Sized>(
    output: &mut W,
    index: usize,
    subtitle: &Subtitle,
) -> IoResult<()> {
    writeln!(output, "{}", index)?;
    writeln!(output, "{} --> {}", format_time(subtitle.start), format_time(subtitle.end))?;
    writeln!(output, "{}", subtitle.text)?;
    writeln!(output)
}

/// Writes every subtitle, numbering them from 1, and returns how many were written.
pub fn write_srt<W, I>(output: &mut W, subtitles: I) -> IoResult<usize> where
    W: Write + ?Sized,
    I: IntoIterator<Item = Subtitle>,
{

    let mut count = 0;

    for subtitle in subtitles {
        count += 1;
        write_entry(output, count, &subtitle)?;
    }

    Ok(count)
}
