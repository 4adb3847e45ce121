/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;

#[test]
fn test_format_time() {

    assert_eq!(format_time(Duration::ZERO), "00:00:00,000");
    assert_eq!(format_time(Duration::from_millis(1_000)), "00:00:01,000");
    assert_eq!(format_time(Duration::from_millis(3_723_045)), "01:02:03,045");
    assert_eq!(format_time(Duration::from_secs(100 * 3_600)), "100:00:00,000");
}

#[test]
fn test_format_time_truncates_to_milliseconds() {

    assert_eq!(format_time(Duration::from_micros(1_999)), "00:00:00,001");
    assert_eq!(format_time(crate::ts_to_duration(184_500)), "00:00:02,050");
}

#[test]
fn test_write_srt() {

    let subtitles = vec![
        Subtitle {
            text: "A".to_string(),
            start: Duration::from_millis(1_000),
            end: Duration::from_millis(3_000),
        },
        Subtitle {
            text: "B\nC".to_string(),
            start: Duration::from_millis(61_500),
            end: Duration::from_millis(62_250),
        },
    ];
    let mut output = Vec::<u8>::new();

    assert_eq!(write_srt(&mut output, subtitles).unwrap(), 2);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "1\n00:00:01,000 --> 00:00:03,000\nA\n\n\
        2\n00:01:01,500 --> 00:01:02,250\nB\nC\n\n",
    );
}

#[test]
fn test_write_srt_empty() {

    let mut output = Vec::<u8>::new();

    assert_eq!(write_srt(&mut output, vec![]).unwrap(), 0);
    assert!(output.is_empty());
}
