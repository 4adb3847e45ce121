/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::{
    *,
    super::segment::Sequence,
};
use rand::{thread_rng, Rng};

#[test]
fn test_single_fragment() {

    let mut reassembler = ObjectReassembler::new();
    let ods = ObjectDefinitionSegment {
        id: 3,
        version: 1,
        sequence: Sequence::Single,
        data_length: 7,
        width: 1,
        height: 1,
        data: vec![0x05, 0x00, 0x00],
    };
    let object = reassembler.push(&ods).cloned().unwrap();

    assert_eq!(object.width, 1);
    assert_eq!(object.height, 1);
    assert_eq!(object.data, vec![0x05, 0x00, 0x00]);
    assert_eq!(object.decode().unwrap().pixels, vec![5]);
    assert_eq!(reassembler.get(3), Some(&object));
}

#[test]
fn test_split_fragments() {

    let mut rng = thread_rng();
    let data = (0..140_000).map(|_| rng.gen()).collect::<Vec<u8>>();
    let segments = ObjectDefinitionSegment::split(9, 0, 1920, 1080, &data).unwrap();
    let mut reassembler = ObjectReassembler::new();
    let (last, rest) = segments.split_last().unwrap();

    for ods in rest {
        assert!(reassembler.push(ods).is_none());
        assert!(reassembler.get(9).is_none());
        assert!(reassembler.is_pending(9));
    }

    let object = reassembler.push(last).unwrap();

    assert_eq!(object.width, 1920);
    assert_eq!(object.height, 1080);
    assert_eq!(object.data, data);
    assert!(!reassembler.is_pending(9));
}

#[test]
fn test_interleaved_objects() {

    let first = ObjectDefinitionSegment::split(1, 0, 2, 1, &[0x01, 0x01]).unwrap();
    let mut reassembler = ObjectReassembler::new();
    let a_first = ObjectDefinitionSegment {
        id: 2,
        sequence: Sequence::First,
        data_length: 8,
        width: 2,
        height: 1,
        data: vec![0x02, 0x02],
        ..Default::default()
    };
    let a_last = ObjectDefinitionSegment {
        id: 2,
        sequence: Sequence::Last,
        data: vec![0x00, 0x00],
        ..Default::default()
    };

    assert!(reassembler.push(&a_first).is_none());
    assert!(reassembler.push(&first[0]).is_some());
    assert_eq!(reassembler.push(&a_last).unwrap().data, vec![0x02, 0x02, 0x00, 0x00]);
    assert_eq!(reassembler.get(1).unwrap().data, vec![0x01, 0x01]);
}

#[test]
fn test_orphan_fragment() {

    let mut reassembler = ObjectReassembler::new();
    let ods = ObjectDefinitionSegment {
        id: 4,
        sequence: Sequence::Last,
        data: vec![0x00, 0x00],
        ..Default::default()
    };

    assert!(reassembler.push(&ods).is_none());
    assert!(reassembler.get(4).is_none());
}

#[test]
fn test_restart_discards_partial_object() {

    let mut reassembler = ObjectReassembler::new();
    let first = ObjectDefinitionSegment {
        id: 5,
        sequence: Sequence::First,
        data_length: 100,
        width: 10,
        height: 10,
        data: vec![0xAA; 10],
        ..Default::default()
    };
    let single = ObjectDefinitionSegment {
        id: 5,
        sequence: Sequence::Single,
        data_length: 6,
        width: 2,
        height: 1,
        data: vec![0x01, 0x02],
        ..Default::default()
    };

    reassembler.push(&first);

    assert_eq!(reassembler.push(&single).unwrap().data, vec![0x01, 0x02]);
}

#[test]
fn test_clear() {

    let mut reassembler = ObjectReassembler::new();
    let segments = ObjectDefinitionSegment::split(6, 0, 1, 1, &[0x01]).unwrap();

    reassembler.push(&segments[0]);
    reassembler.clear();

    assert!(reassembler.get(6).is_none());
}
