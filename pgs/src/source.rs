/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Origins of display set sequences.
//!
//! A `.sup` file is read with [`SupSource`]; subtitle blocks demuxed from a container track are
//! read with [`TrackSource`]. [`Deduplicate`] can be stacked on top of either.


use super::displayset::{DisplaySet, Framing, ReadDisplaySetExt, ReadResult};
use std::io::{Cursor, Read};
use log::debug;

/// Produces display sets in stream order.
///
/// Sources are forward-only: once a display set has been returned it cannot be read again.
pub trait DisplaySetSource {
    /// Returns the next display set, or `None` at the end of the stream.
    fn next_display_set(&mut self) -> ReadResult<Option<DisplaySet>>;

    /// Drops display sets that repeat the object data of the one before them.
    fn deduplicate(self) -> Deduplicate<Self> where
        Self: Sized,
    {
        Deduplicate::new(self)
    }
}

impl<S> DisplaySetSource for &mut S where
    S: DisplaySetSource + ?Sized,
{
    fn next_display_set(&mut self) -> ReadResult<Option<DisplaySet>> {
        (**self).next_display_set()
    }
}

impl<S> DisplaySetSource for Box<S> where
    S: DisplaySetSource + ?Sized,
{
    fn next_display_set(&mut self) -> ReadResult<Option<DisplaySet>> {
        (**self).next_display_set()
    }
}

/// Reads display sets from a `.sup` bitstream, where every segment carries a header.
pub struct SupSource<R> {
    input: R,
}

impl<R: Read> SupSource<R> {

    pub fn new(input: R) -> Self {
        SupSource { input }
    }

    pub fn into_inner(self) -> R {
        self.input
    }
}

impl<R: Read> DisplaySetSource for SupSource<R> {
    fn next_display_set(&mut self) -> ReadResult<Option<DisplaySet>> {
        self.input.read_display_set(Framing::Headers)
    }
}

/// A subtitle block demuxed from a container track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    /// Timestamp of the cluster holding the block, in track ticks.
    pub cluster_timestamp: u64,
    /// Timestamp of the block relative to its cluster, in track ticks.
    pub relative_timestamp: i16,
    /// Segments without headers.
    pub data: Vec<u8>,
}

/// Converts container ticks to milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackTiming {
    /// Milliseconds per tick.
    pub timestamp_scale: f64,
    /// Milliseconds subtracted from every block time.
    pub delay: f64,
}

impl Default for TrackTiming {
    fn default() -> Self {
        TrackTiming {
            timestamp_scale: 1.0,
            delay: 0.0,
        }
    }
}

impl TrackTiming {

    /// Builds a timing from the container's nanosecond-based timestamp scale and the track's
    /// codec delay in nanoseconds.
    pub fn from_nanoseconds(timestamp_scale: u64, codec_delay: u64) -> Self {
        TrackTiming {
            timestamp_scale: timestamp_scale as f64 / 1_000_000.0,
            delay: codec_delay as f64 / 1_000_000.0,
        }
    }

    /// The 90 kHz presentation timestamp of a block, clamped to zero.
    ///
    /// The block time is rounded to whole milliseconds before it is converted to ticks.
    pub fn pts(&self, block: &Block) -> u32 {

        let ticks = block.cluster_timestamp as f64 + block.relative_timestamp as f64;
        let milliseconds = (ticks * self.timestamp_scale - self.delay).round();

        (milliseconds * 90.0).clamp(0.0, u32::MAX as f64) as u32
    }
}

/// Reads display sets from container blocks, whose segments carry no headers.
///
/// Every display set is timed by the block it came from, with its DTS equal to its PTS. A block
/// normally holds one display set but may hold several.
pub struct TrackSource<I> {
    blocks: I,
    timing: TrackTiming,
    current: Option<(Cursor<Vec<u8>>, u32)>,
}

impl<I> TrackSource<I> where
    I: Iterator<Item = Block>,
{

    pub fn new<T>(blocks: T, timing: TrackTiming) -> Self where
        T: IntoIterator<IntoIter = I>,
    {
        TrackSource {
            blocks: blocks.into_iter(),
            timing,
            current: None,
        }
    }
}

impl<I> DisplaySetSource for TrackSource<I> where
    I: Iterator<Item = Block>,
{

    fn next_display_set(&mut self) -> ReadResult<Option<DisplaySet>> {

        loop {

            if let Some((cursor, pts)) = self.current.as_mut() {

                let framing = Framing::Bare { pts: *pts, dts: *pts };

                match cursor.read_display_set(framing)? {
                    Some(display_set) => return Ok(Some(display_set)),
                    None => self.current = None,
                }
            }

            match self.blocks.next() {
                Some(block) => {
                    let pts = self.timing.pts(&block);
                    self.current = Some((Cursor::new(block.data), pts));
                }
                None => return Ok(None),
            }
        }
    }
}

/// Skips display sets whose object data repeats that of the last display set returned.
///
/// Some discs repeat the same composition every few milliseconds. Two display sets are
/// considered equal when they carry the same number of object fragments and each pair of
/// fragments holds identical data.
pub struct Deduplicate<S> {
    source: S,
    last: Option<DisplaySet>,
}

impl<S: DisplaySetSource> Deduplicate<S> {

    pub fn new(source: S) -> Self {
        Deduplicate {
            source,
            last: None,
        }
    }
}

impl<S: DisplaySetSource> DisplaySetSource for Deduplicate<S> {

    fn next_display_set(&mut self) -> ReadResult<Option<DisplaySet>> {

        while let Some(display_set) = self.source.next_display_set()? {

            if let Some(last) = self.last.as_ref() {
                if last.has_same_objects(&display_set) {
                    debug!("dropping repeated display set at {}", display_set.pts);
                    continue
                }
            }

            self.last = Some(display_set.clone());

            return Ok(Some(display_set))
        }

        Ok(None)
    }
}

/// Iterates over the display sets of a source.
pub struct DisplaySets<S> {
    source: S,
    done: bool,
}

impl<S: DisplaySetSource> Iterator for DisplaySets<S> {

    type Item = ReadResult<DisplaySet>;

    fn next(&mut self) -> Option<Self::Item> {

        if self.done {
            return None
        }

        match self.source.next_display_set() {
            Ok(Some(display_set)) => Some(Ok(display_set)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Turns a source into an iterator that stops after the first error.
pub fn display_sets<S: DisplaySetSource>(source: S) -> DisplaySets<S> {
    DisplaySets { source, done: false }
}
