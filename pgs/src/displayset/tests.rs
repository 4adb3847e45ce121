/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::{
    *,
    super::segment::{
        CompositionObject,
        CompositionState,
        Crop,
        PaletteEntry,
        ReadError as SegmentReadError,
        WindowDefinition,
        CROPPED_FLAG,
    },
};
use std::io::Cursor;
use rand::{thread_rng, Rng};

fn random_display_set() -> DisplaySet {

    let mut rng = thread_rng();
    let data = (0..1_000).map(|_| rng.gen()).collect::<Vec<u8>>();

    DisplaySet {
        pts: rng.gen(),
        dts: rng.gen(),
        composition: PresentationCompositionSegment {
            width: 1920,
            height: 1080,
            frame_rate: 0x10,
            composition_number: rng.gen(),
            composition_state: CompositionState::EpochStart,
            palette_update_flag: 0x00,
            palette_id: rng.gen(),
            composition_objects: vec![
                CompositionObject {
                    object_id: rng.gen(),
                    window_id: 0,
                    cropped_flag: 0x00,
                    x: rng.gen(),
                    y: rng.gen(),
                    crop: None,
                },
                CompositionObject {
                    object_id: rng.gen(),
                    window_id: 1,
                    cropped_flag: CROPPED_FLAG,
                    x: rng.gen(),
                    y: rng.gen(),
                    crop: Some(
                        Crop {
                            x: rng.gen(),
                            y: rng.gen(),
                            width: rng.gen(),
                            height: rng.gen(),
                        }
                    ),
                },
            ],
        },
        windows: vec![
            WindowDefinitionSegment {
                windows: (0..2).map(|id|
                    WindowDefinition {
                        id,
                        x: rng.gen(),
                        y: rng.gen(),
                        width: rng.gen(),
                        height: rng.gen(),
                    }
                ).collect(),
            },
        ],
        palettes: vec![
            PaletteDefinitionSegment {
                id: rng.gen(),
                version: rng.gen(),
                entries: (0..=255).map(|id|
                    PaletteEntry {
                        id,
                        y: rng.gen(),
                        cr: rng.gen(),
                        cb: rng.gen(),
                        alpha: rng.gen(),
                    }
                ).collect(),
            },
        ],
        objects: ObjectDefinitionSegment::split(rng.gen(), rng.gen(), 100, 50, &data).unwrap(),
    }
}

#[test]
fn test_ds_cycle_empty() {

    let mut rng = thread_rng();
    let display_set = DisplaySet {
        pts: rng.gen(),
        dts: rng.gen(),
        composition: PresentationCompositionSegment {
            composition_state: CompositionState::Normal,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut buffer = vec![];

    // PCS and ES, each with a header.
    assert_eq!(buffer.write_display_set(&display_set, Framing::Headers).unwrap(), 37);
    assert_eq!(buffer.len(), 37);

    let mut cursor = Cursor::new(buffer);

    assert_eq!(cursor.read_display_set(Framing::Headers).unwrap(), Some(display_set));
    assert_eq!(cursor.read_display_set(Framing::Headers).unwrap(), None);
}

#[test]
fn test_ds_cycle_not_empty() {

    let display_set = random_display_set();
    let mut buffer = vec![];

    buffer.write_display_set(&display_set, Framing::Headers).unwrap();

    let mut cursor = Cursor::new(buffer);
    let cycled_display_set = cursor.read_display_set(Framing::Headers).unwrap().unwrap();

    assert_eq!(cycled_display_set, display_set);
}

#[test]
fn test_ds_cycle_large_object() {

    let mut rng = thread_rng();
    let mut display_set = random_display_set();
    let data = (0..200_000).map(|_| rng.gen()).collect::<Vec<u8>>();

    display_set.objects = ObjectDefinitionSegment::split(1, 0, 1920, 1080, &data).unwrap();

    let mut buffer = vec![];

    buffer.write_display_set(&display_set, Framing::Headers).unwrap();

    let mut cursor = Cursor::new(buffer);

    assert_eq!(cursor.read_display_set(Framing::Headers).unwrap(), Some(display_set));
}

#[test]
fn test_ds_cycle_bare() {

    let mut display_set = random_display_set();
    let mut buffer = vec![];

    display_set.pts = 184_500;
    display_set.dts = 184_500;
    buffer.write_display_set(&display_set, Framing::Bare { pts: 0, dts: 0 }).unwrap();

    assert_eq!(buffer[0], 0x16);

    let mut cursor = Cursor::new(buffer);
    let framing = Framing::Bare { pts: 184_500, dts: 184_500 };

    assert_eq!(cursor.read_display_set(framing).unwrap(), Some(display_set));
    assert_eq!(cursor.read_display_set(framing).unwrap(), None);
}

#[test]
fn test_ds_multiple() {

    let first = random_display_set();
    let second = random_display_set();
    let mut buffer = vec![];

    buffer.write_display_set(&first, Framing::Headers).unwrap();
    buffer.write_display_set(&second, Framing::Headers).unwrap();

    let mut cursor = Cursor::new(buffer);

    assert_eq!(cursor.read_display_set(Framing::Headers).unwrap(), Some(first));
    assert_eq!(cursor.read_display_set(Framing::Headers).unwrap(), Some(second));
    assert_eq!(cursor.read_display_set(Framing::Headers).unwrap(), None);
}

#[test]
fn test_ds_segment_order() {

    let display_set = random_display_set();
    let kinds = display_set.segments().map(|segment| segment.kind()).collect::<Vec<u8>>();

    assert_eq!(kinds.first(), Some(&0x16));
    assert_eq!(kinds[1], 0x17);
    assert_eq!(kinds[2], 0x14);
    assert!(kinds[3..kinds.len() - 1].iter().all(|&kind| kind == 0x15));
    assert_eq!(kinds.last(), Some(&0x80));
}

#[test]
fn test_ds_invalid_magic() {

    let mut cursor = Cursor::new(vec![0x50, 0x48, 0, 0, 0, 0, 0, 0, 0, 0, 0x80, 0, 0]);

    assert!(matches!(
        cursor.read_display_set(Framing::Headers),
        Err(ReadError::InvalidMagicNumber(0x5048)),
    ));
}

#[test]
fn test_ds_missing_pcs() {

    let mut cursor = Cursor::new(vec![0x50, 0x47, 0, 0, 0, 1, 0, 0, 0, 1, 0x80, 0, 0]);

    assert!(matches!(
        cursor.read_display_set(Framing::Headers),
        Err(ReadError::MissingPresentationCompositionSegment),
    ));
}

#[test]
fn test_ds_duplicate_pcs() {

    let mut buffer = vec![];
    let display_set = DisplaySet::default();

    buffer.write_display_set(&display_set, Framing::Bare { pts: 0, dts: 0 }).unwrap();

    // Drop the end segment so the next PCS lands inside the same display set.
    buffer.truncate(buffer.len() - 3);
    buffer.write_display_set(&display_set, Framing::Bare { pts: 0, dts: 0 }).unwrap();

    let mut cursor = Cursor::new(buffer);

    assert!(matches!(
        cursor.read_display_set(Framing::Bare { pts: 0, dts: 0 }),
        Err(ReadError::UnexpectedPresentationCompositionSegment),
    ));
}

#[test]
fn test_ds_unknown_segment_type() {

    let mut cursor = Cursor::new(vec![0x50, 0x47, 0, 0, 0, 0, 0, 0, 0, 0, 0x18, 0, 0]);

    assert!(matches!(
        cursor.read_display_set(Framing::Headers),
        Err(ReadError::SegmentError { source: SegmentReadError::UnknownSegmentType(0x18) }),
    ));
}

#[test]
fn test_ds_truncated() {

    let display_set = random_display_set();
    let mut buffer = vec![];

    buffer.write_display_set(&display_set, Framing::Headers).unwrap();
    buffer.truncate(buffer.len() - 1);

    let mut cursor = Cursor::new(buffer);

    assert!(cursor.read_display_set(Framing::Headers).is_err());
}

#[test]
fn test_ds_same_objects() {

    let first = random_display_set();
    let mut second = first.clone();

    second.pts = second.pts.wrapping_add(1);
    second.palettes.clear();

    assert!(first.has_same_objects(&second));

    second.objects.pop();

    assert!(!first.has_same_objects(&second));
    assert!(DisplaySet::default().has_same_objects(&DisplaySet::default()));
}
