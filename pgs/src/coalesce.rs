/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Turns display sets into timed subtitle text.
//!
//! Every display set replaces whatever was on screen before it. The text recognized from one
//! display set is therefore shown from its own timestamp until the timestamp of the next display
//! set. When several objects are on screen together, their texts are joined line by line in the
//! order the composition lists them.
//!
//! Text still on screen when the stream ends has no end time and is dropped.

#[cfg(test)]
mod tests;

use super::{
    displayset::{DisplaySet, ReadError},
    object::ObjectReassembler,
    ocr::{OcrError, Recognize},
    palette::rasterize,
    segment::{PaletteDefinitionSegment, WindowDefinition},
    source::DisplaySetSource,
    ts_to_duration,
};
use std::{
    collections::BTreeMap,
    time::Duration,
};
use image::imageops;
use log::{debug, warn};
use thiserror::Error as ThisError;

/// The error type for [Coalescer].
#[derive(ThisError, Debug)]
pub enum Error {
    /// The display sets could not be read.
    #[error("display set read error")]
    ReadError {
        #[from]
        source: ReadError,
    },
    /// Recognition failed.
    #[error("text recognition error")]
    OcrError {
        #[from]
        source: OcrError,
    },
}

/// Text shown on screen for an interval.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Subtitle {
    pub text: String,
    pub start: Duration,
    pub end: Duration,
}

impl Subtitle {

    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}

#[derive(Clone, Debug)]
struct ActiveText {
    window_id: u8,
    text: String,
    start: Duration,
}

/// Everything carried from one display set to the next.
#[derive(Clone, Debug, Default)]
pub struct CoalescerState {
    palettes: BTreeMap<u8, PaletteDefinitionSegment>,
    windows: BTreeMap<u8, WindowDefinition>,
    objects: ObjectReassembler,
    active: Vec<ActiveText>,
}

impl CoalescerState {

    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a display set, returning the subtitle it takes off the screen, if any.
    pub fn advance<R>(
        &mut self,
        display_set: &DisplaySet,
        recognizer: &mut R,
        language: &str,
    ) -> Result<Option<Subtitle>, OcrError> where
        R: Recognize + ?Sized,
    {

        let time = ts_to_duration(display_set.pts);
        let composition = &display_set.composition;

        if composition.composition_state.resets_context() {
            self.palettes.clear();
            self.windows.clear();
            self.objects.clear();
        }

        for window in display_set.windows.iter().flat_map(|wds| wds.windows.iter()) {
            self.windows.insert(window.id, window.clone());
        }
        for pds in display_set.palettes.iter() {
            self.palettes.insert(pds.id, pds.clone());
        }
        for ods in display_set.objects.iter() {
            self.objects.push(ods);
        }

        let closed = self.close(time);
        let palette = match self.palettes.get(&composition.palette_id) {
            Some(palette) => palette,
            None => {
                if !composition.composition_objects.is_empty() {
                    debug!("palette {} is not defined at {:?}", composition.palette_id, time);
                }
                return Ok(closed)
            }
        };

        for comp_obj in composition.composition_objects.iter() {

            if !self.windows.contains_key(&comp_obj.window_id) {
                debug!("skipping object {}: window {} is not defined", comp_obj.object_id,
                    comp_obj.window_id);
                continue
            }

            let object = match self.objects.get(comp_obj.object_id) {
                Some(object) => object,
                None => {
                    debug!("skipping object {}: not defined or incomplete", comp_obj.object_id);
                    continue
                }
            };

            if object.width > composition.width || object.height > composition.height {
                warn!(
                    "skipping object {}: {}x{} does not fit the {}x{} video",
                    comp_obj.object_id,
                    object.width,
                    object.height,
                    composition.width,
                    composition.height,
                );
                continue
            }

            let bitmap = match object.decode() {
                Ok(bitmap) => bitmap,
                Err(err) => {
                    warn!("skipping object {}: {}", comp_obj.object_id, err);
                    continue
                }
            };
            let mut image = rasterize(&bitmap, palette);

            if let Some(crop) = comp_obj.crop.as_ref().filter(|_| comp_obj.is_cropped()) {
                image = imageops::crop_imm(
                    &image,
                    crop.x as u32,
                    crop.y as u32,
                    crop.width as u32,
                    crop.height as u32,
                ).to_image();
            }

            if image.width() == 0 || image.height() == 0 {
                debug!("skipping object {}: nothing left to recognize", comp_obj.object_id);
                continue
            }

            let text = recognizer.recognize(&image, language)?;
            let text = text.trim();

            if text.is_empty() {
                continue
            }

            self.active.push(
                ActiveText {
                    window_id: comp_obj.window_id,
                    text: text.to_string(),
                    start: time,
                }
            );
        }

        Ok(closed)
    }

    /// The number of texts currently on screen.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Ends the stream, discarding text that never left the screen.
    pub fn finish(&mut self) {
        for active in self.active.drain(..) {
            debug!(
                "dropping text in window {} shown since {:?} with no end time: {:?}",
                active.window_id,
                active.start,
                active.text,
            );
        }
    }

    fn close(&mut self, time: Duration) -> Option<Subtitle> {

        let start = self.active.first()?.start;
        let text = self.active.iter()
            .map(|active| active.text.as_str())
            .collect::<Vec<&str>>()
            .join("\n");

        self.active.clear();

        if time < start {
            warn!("display set at {:?} precedes the text it ends at {:?}", time, start);
        }

        Some(
            Subtitle {
                text,
                start,
                end: time.max(start),
            }
        )
    }
}

/// Reads display sets from a source and yields the subtitles they produce.
pub struct Coalescer<S, R> {
    source: S,
    recognizer: R,
    language: String,
    state: CoalescerState,
    done: bool,
}

impl<S, R> Coalescer<S, R> where
    S: DisplaySetSource,
    R: Recognize,
{

    pub fn new(source: S, recognizer: R, language: &str) -> Self {
        Coalescer {
            source,
            recognizer,
            language: language.to_string(),
            state: CoalescerState::new(),
            done: false,
        }
    }

    pub fn into_recognizer(self) -> R {
        self.recognizer
    }
}

impl<S, R> Iterator for Coalescer<S, R> where
    S: DisplaySetSource,
    R: Recognize,
{

    type Item = Result<Subtitle, Error>;

    fn next(&mut self) -> Option<Self::Item> {

        while !self.done {

            let display_set = match self.source.next_display_set() {
                Ok(Some(display_set)) => display_set,
                Ok(None) => {
                    self.done = true;
                    self.state.finish();
                    break
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err.into()))
                }
            };

            match self.state.advance(&display_set, &mut self.recognizer, &self.language) {
                Ok(Some(subtitle)) => return Some(Ok(subtitle)),
                Ok(None) => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err.into()))
                }
            }
        }

        None
    }
}
