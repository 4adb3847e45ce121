/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;
use super::super::{
    displayset::{Framing, WriteDisplaySetExt},
    rle::{self, Bitmap},
    segment::{
        CompositionObject,
        CompositionState,
        ObjectDefinitionSegment,
        PaletteEntry,
        PresentationCompositionSegment,
        WindowDefinitionSegment,
    },
    source::{DisplaySetSource, SupSource},
};
use std::io::Cursor;
use image::GrayAlphaImage;

/// Object IDs double as the width of their bitmap, which the fake recognizer reads back.
const TEXTS: [&str; 5] = ["", "A", "B", "  C \n", " "];

fn recognize_width(image: &GrayAlphaImage, _: &str) -> Result<String, OcrError> {
    Ok(TEXTS.get(image.width() as usize).copied().unwrap_or("?").to_string())
}

fn object(id: u16) -> ObjectDefinitionSegment {

    let bitmap = Bitmap {
        width: id,
        height: 1,
        pixels: vec![1; id as usize],
    };

    ObjectDefinitionSegment::split(id, 0, id, 1, &rle::encode(&bitmap))
        .unwrap()
        .remove(0)
}

fn palette() -> PaletteDefinitionSegment {
    PaletteDefinitionSegment {
        id: 0,
        version: 0,
        entries: vec![
            PaletteEntry { id: 1, y: 235, cr: 128, cb: 128, alpha: 255 },
        ],
    }
}

fn composition_object(object_id: u16, window_id: u8) -> CompositionObject {
    CompositionObject {
        object_id,
        window_id,
        ..Default::default()
    }
}

/// A display set that starts an epoch and shows the given objects, one window each.
fn epoch(milliseconds: u32, object_ids: &[u16]) -> DisplaySet {
    DisplaySet {
        pts: milliseconds * 90,
        dts: milliseconds * 90,
        composition: PresentationCompositionSegment {
            width: 1920,
            height: 1080,
            composition_state: CompositionState::EpochStart,
            composition_objects: object_ids.iter().enumerate().map(|(window_id, &object_id)|
                composition_object(object_id, window_id as u8)
            ).collect(),
            ..Default::default()
        },
        windows: vec![
            WindowDefinitionSegment {
                windows: (0..object_ids.len()).map(|id|
                    WindowDefinition {
                        id: id as u8,
                        width: 100,
                        height: 10,
                        ..Default::default()
                    }
                ).collect(),
            },
        ],
        palettes: vec![palette()],
        objects: object_ids.iter().map(|&id| object(id)).collect(),
    }
}

/// A display set that clears the screen.
fn clear(milliseconds: u32) -> DisplaySet {
    DisplaySet {
        pts: milliseconds * 90,
        dts: milliseconds * 90,
        composition: PresentationCompositionSegment {
            width: 1920,
            height: 1080,
            composition_state: CompositionState::Normal,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn source(display_sets: &[DisplaySet]) -> SupSource<Cursor<Vec<u8>>> {

    let mut buffer = vec![];

    for display_set in display_sets {
        buffer.write_display_set(display_set, Framing::Headers).unwrap();
    }

    SupSource::new(Cursor::new(buffer))
}

fn coalesce<S: DisplaySetSource>(source: S) -> Vec<Subtitle> {
    Coalescer::new(source, recognize_width, "eng")
        .collect::<Result<Vec<Subtitle>, Error>>()
        .unwrap()
}

fn subtitle(text: &str, start: u64, end: u64) -> Subtitle {
    Subtitle {
        text: text.to_string(),
        start: Duration::from_millis(start),
        end: Duration::from_millis(end),
    }
}

#[test]
fn test_single_subtitle() {

    let subtitles = coalesce(source(&[epoch(0, &[]), epoch(1_000, &[1]), clear(3_000)]));

    assert_eq!(subtitles, vec![subtitle("A", 1_000, 3_000)]);
    assert_eq!(subtitles[0].duration(), Duration::from_secs(2));
}

#[test]
fn test_multiple_windows() {

    let subtitles = coalesce(source(&[epoch(2_000, &[1, 2]), clear(5_000)]));

    assert_eq!(subtitles, vec![subtitle("A\nB", 2_000, 5_000)]);
}

#[test]
fn test_consecutive_subtitles() {

    let subtitles = coalesce(source(&[
        epoch(1_000, &[1]),
        epoch(2_000, &[2]),
        clear(2_500),
        clear(4_000),
    ]));

    assert_eq!(subtitles, vec![subtitle("A", 1_000, 2_000), subtitle("B", 2_000, 2_500)]);
}

#[test]
fn test_open_subtitle_dropped_at_end() {

    assert!(coalesce(source(&[epoch(1_000, &[1])])).is_empty());
    assert!(coalesce(source(&[])).is_empty());
}

#[test]
fn test_text_is_trimmed() {

    let subtitles = coalesce(source(&[epoch(1_000, &[3]), clear(2_000)]));

    assert_eq!(subtitles, vec![subtitle("C", 1_000, 2_000)]);
}

#[test]
fn test_blank_text_ignored() {

    assert!(coalesce(source(&[epoch(1_000, &[4]), clear(2_000)])).is_empty());
}

#[test]
fn test_repeated_display_sets() {

    let mut repeat = epoch(1_500, &[1]);

    repeat.composition.composition_state = CompositionState::Normal;

    let display_sets = [epoch(1_000, &[1]), repeat, clear(3_000)];

    assert_eq!(
        coalesce(source(&display_sets)),
        vec![subtitle("A", 1_000, 1_500), subtitle("A", 1_500, 3_000)],
    );
    assert_eq!(
        coalesce(source(&display_sets).deduplicate()),
        vec![subtitle("A", 1_000, 3_000)],
    );
}

#[test]
fn test_normal_state_keeps_context() {

    let mut redisplay = clear(2_000);

    redisplay.composition.composition_objects = vec![composition_object(1, 0)];

    assert_eq!(
        coalesce(source(&[epoch(1_000, &[1]), redisplay, clear(3_000)])),
        vec![subtitle("A", 1_000, 2_000), subtitle("A", 2_000, 3_000)],
    );
}

#[test]
fn test_reset_clears_context() {

    let mut acquisition = clear(2_000);

    acquisition.composition.composition_state = CompositionState::AcquisitionPoint;
    acquisition.composition.composition_objects = vec![composition_object(1, 0)];

    assert_eq!(
        coalesce(source(&[epoch(1_000, &[1]), acquisition, clear(3_000)])),
        vec![subtitle("A", 1_000, 2_000)],
    );
}

#[test]
fn test_unnamed_state_clears_context() {

    let mut other = clear(2_000);

    other.composition.composition_state = CompositionState::Other(0x20);
    other.composition.composition_objects = vec![composition_object(1, 0)];

    assert_eq!(
        coalesce(source(&[epoch(1_000, &[1]), other, clear(3_000)])),
        vec![subtitle("A", 1_000, 2_000)],
    );
}

#[test]
fn test_missing_window() {

    let mut display_set = epoch(1_000, &[1, 2]);

    display_set.composition.composition_objects[0].window_id = 9;

    assert_eq!(
        coalesce(source(&[display_set, clear(2_000)])),
        vec![subtitle("B", 1_000, 2_000)],
    );
}

#[test]
fn test_missing_palette() {

    let mut display_set = epoch(1_000, &[1]);

    display_set.composition.palette_id = 5;

    assert!(coalesce(source(&[display_set, clear(2_000)])).is_empty());
}

#[test]
fn test_incomplete_object() {

    let mut display_set = epoch(1_000, &[1]);

    display_set.objects[0].sequence = crate::segment::Sequence::First;

    assert!(coalesce(source(&[display_set, clear(2_000)])).is_empty());
}

#[test]
fn test_cropped_object() {

    let mut display_set = epoch(1_000, &[4]);
    let comp_obj = &mut display_set.composition.composition_objects[0];

    comp_obj.cropped_flag = crate::segment::CROPPED_FLAG;
    comp_obj.crop = Some(
        crate::segment::Crop {
            x: 1,
            y: 0,
            width: 2,
            height: 1,
        }
    );

    assert_eq!(
        coalesce(source(&[display_set, clear(2_000)])),
        vec![subtitle("B", 1_000, 2_000)],
    );
}

#[test]
fn test_crop_outside_object() {

    let mut display_set = epoch(1_000, &[2, 1]);
    let comp_obj = &mut display_set.composition.composition_objects[0];

    comp_obj.cropped_flag = crate::segment::CROPPED_FLAG;
    comp_obj.crop = Some(
        crate::segment::Crop {
            x: 50,
            y: 50,
            width: 10,
            height: 10,
        }
    );

    let recognize_png = |image: &GrayAlphaImage, language: &str| -> Result<String, OcrError> {
        crate::ocr::encode_png(image)?;
        recognize_width(image, language)
    };
    let subtitles = Coalescer::new(source(&[display_set, clear(2_000)]), recognize_png, "eng")
        .collect::<Result<Vec<Subtitle>, Error>>()
        .unwrap();

    assert_eq!(subtitles, vec![subtitle("A", 1_000, 2_000)]);
}

#[test]
fn test_empty_object_skipped() {

    let mut display_set = epoch(1_000, &[1]);
    let failing = |_: &GrayAlphaImage, _: &str| -> Result<String, OcrError> {
        Err(OcrError::EngineError("empty image".to_string()))
    };

    display_set.objects[0].height = 0;

    let subtitles = Coalescer::new(source(&[display_set, clear(2_000)]), failing, "eng")
        .collect::<Result<Vec<Subtitle>, Error>>()
        .unwrap();

    assert!(subtitles.is_empty());
}

#[test]
fn test_object_larger_than_video() {

    let mut display_set = epoch(1_000, &[3, 1]);

    display_set.composition.width = 2;
    display_set.objects[0].width = 0xFFFF;
    display_set.objects[0].height = 0xFFFF;

    assert_eq!(
        coalesce(source(&[display_set, clear(2_000)])),
        vec![subtitle("A", 1_000, 2_000)],
    );
}

#[test]
fn test_state_in_isolation() {

    let mut state = CoalescerState::new();
    let mut recognizer = recognize_width;

    assert_eq!(state.advance(&epoch(1_000, &[1, 2]), &mut recognizer, "eng").unwrap(), None);
    assert_eq!(state.active_count(), 2);

    let closed = state.advance(&clear(1_250), &mut recognizer, "eng").unwrap();

    assert_eq!(closed, Some(subtitle("A\nB", 1_000, 1_250)));
    assert_eq!(state.active_count(), 0);

    state.advance(&epoch(2_000, &[1]), &mut recognizer, "eng").unwrap();
    state.finish();

    assert_eq!(state.active_count(), 0);
}

#[test]
fn test_recognition_error_stops() {

    let failing = |_: &GrayAlphaImage, _: &str| -> Result<String, OcrError> {
        Err(OcrError::EngineError("no engine".to_string()))
    };
    let results = Coalescer::new(source(&[epoch(1_000, &[1]), clear(2_000)]), failing, "eng")
        .collect::<Vec<_>>();

    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(Error::OcrError { .. })));
}

#[test]
fn test_read_error_stops() {

    let mut buffer = vec![];

    buffer.write_display_set(&epoch(1_000, &[1]), Framing::Headers).unwrap();
    buffer.extend_from_slice(&[0x50, 0x47, 0x00]);

    let results = Coalescer::new(SupSource::new(Cursor::new(buffer)), recognize_width, "eng")
        .collect::<Vec<_>>();

    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(Error::ReadError { .. })));
}
