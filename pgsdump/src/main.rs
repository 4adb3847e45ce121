/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use pgs::{
    ts_to_timestamp,
    displayset::{Framing, ReadDisplaySetExt},
    segment::{CompositionState, Segment, Sequence},
};
use std::{
    fs::File,
    io::{stdin, BufReader, Read},
    process::exit,
};
use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};
use log::error;

fn main() {

    env_logger::init();

    let matches = app_from_crate!()
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input PGS file; use - for STDIN")
            .required(true)
        )
        .after_help(format!("This utility will dump PGS subtitle bitstream data.\n\n\
            Copyright © 2021 William Swartzendruber\n\
            Licensed under the Mozilla Public License 2.0\n\
            <{}>", env!("CARGO_PKG_REPOSITORY")).as_str())
        .get_matches();
    let input_value = matches.value_of("input").unwrap();
    let (mut stdin_read, mut file_read);
    let mut input = BufReader::<&mut dyn Read>::new(
        if input_value == "-" {
            stdin_read = stdin();
            &mut stdin_read
        } else {
            file_read = match File::open(input_value) {
                Ok(file) => file,
                Err(err) => {
                    error!("Could not open input file: {}", err);
                    exit(1)
                }
            };
            &mut file_read
        }
    );

    eprintln!("Iterating through PGS segments...");

    //
    // READ
    //

    loop {

        let display_set = match input.read_display_set(Framing::Headers) {
            Ok(Some(display_set)) => display_set,
            Ok(None) => break,
            Err(err) => {
                error!("Could not read display set: {}", err);
                exit(1)
            }
        };
        let ts = ts_to_timestamp(display_set.pts);

        for segment in display_set.segments() {
            match segment {
                Segment::PresentationComposition(pcs) => {
                    println!("presentation_composition_segment({})", ts);
                    println!("  video_width = {}", pcs.width);
                    println!("  video_height = {}", pcs.height);
                    println!("  composition_number = {}", pcs.composition_number);
                    println!("  composition_state = {}", match pcs.composition_state {
                        CompositionState::EpochStart => "EPOCH_START".to_string(),
                        CompositionState::Normal => "NORMAL_CASE".to_string(),
                        CompositionState::AcquisitionPoint => "ACQUISITION_POINT".to_string(),
                        CompositionState::Other(value) => format!("0x{:02X}", value),
                    });
                    println!("  palette_update_flag = 0x{:02X}", pcs.palette_update_flag);
                    println!("  palette_id = {}", pcs.palette_id);
                    for comp_obj in pcs.composition_objects.iter() {
                        println!("  window_information");
                        println!("    object_id = {}", comp_obj.object_id);
                        println!("    window_id = {}", comp_obj.window_id);
                        println!("    object_cropped_flag = 0x{:02X}", comp_obj.cropped_flag);
                        println!("    object_horizontal_position = {}", comp_obj.x);
                        println!("    object_vertical_position = {}", comp_obj.y);
                        if let Some(crop) = &comp_obj.crop {
                            println!("    object_cropping_horizontal_position = {}", crop.x);
                            println!("    object_cropping_vertical_position = {}", crop.y);
                            println!("    object_cropping_width = {}", crop.width);
                            println!("    object_cropping_height = {}", crop.height);
                        }
                    }
                }
                Segment::WindowDefinition(wds) => {
                    println!("window_definition_segment({})", ts);
                    for wd in wds.windows.iter() {
                        println!("  window_id = {}", wd.id);
                        println!("  window_horizontal_position = {}", wd.x);
                        println!("  window_vertical_position = {}", wd.y);
                        println!("  window_width = {}", wd.width);
                        println!("  window_height = {}", wd.height);
                    }
                }
                Segment::PaletteDefinition(pds) => {
                    println!("palette_definition_segment({})", ts);
                    println!("  palette_id = {}", pds.id);
                    println!("  palette_version = {}", pds.version);
                    println!("  palette_entries = [{}]", pds.entries.len());
                }
                Segment::ObjectDefinition(ods) => {
                    println!("object_definition_segment({})", ts);
                    println!("  object_id = {}", ods.id);
                    println!("  object_version = {}", ods.version);
                    println!("  sequence = {}", match ods.sequence {
                        Sequence::Single => "SINGLE",
                        Sequence::First => "FIRST",
                        Sequence::Middle => "MIDDLE",
                        Sequence::Last => "LAST",
                    });
                    if ods.sequence.is_first() {
                        println!("  object_data_length = {}", ods.data_length);
                        println!("  object_width = {}", ods.width);
                        println!("  object_height = {}", ods.height);
                    }
                    println!("  object_data = [{}]", ods.data.len());
                }
                Segment::End(_) => {
                    println!("end_segment({})", ts);
                    println!();
                }
            }
        }
    }
}
