/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use pgs::{
    displayset::{DisplaySet, Framing, ReadDisplaySetExt},
    object::ObjectReassembler,
    ts_to_timestamp,
};
use std::{
    collections::BTreeSet,
    fs::File,
    io::{stdin, BufReader, Read},
    process::exit,
};
use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};
use log::{error, warn};

/// Cross-checks the segments of a display set against the context built up before it, returning
/// the number of problems found.
fn check(display_set: &DisplaySet, windows: &mut BTreeSet<u8>, palettes: &mut BTreeSet<u8>,
    objects: &mut ObjectReassembler) -> usize {

    let ts = ts_to_timestamp(display_set.pts);
    let composition = &display_set.composition;
    let mut problems = 0;

    if composition.composition_state.resets_context() {
        windows.clear();
        palettes.clear();
        objects.clear();
    }

    windows.extend(display_set.windows.iter().flat_map(|wds| wds.windows.iter().map(|wd| wd.id)));
    palettes.extend(display_set.palettes.iter().map(|pds| pds.id));

    for ods in display_set.objects.iter() {
        if let Some(object) = objects.push(ods) {
            if object.width > composition.width || object.height > composition.height {
                warn!("{}: object {} is {}x{}, larger than the {}x{} video", ts, object.id,
                    object.width, object.height, composition.width, composition.height);
                problems += 1;
            } else if let Err(err) = object.decode() {
                warn!("{}: object {} does not decode: {}", ts, object.id, err);
                problems += 1;
            }
        }
    }

    if !composition.composition_objects.is_empty() && !palettes.contains(&composition.palette_id) {
        warn!("{}: composition references unknown palette {}", ts, composition.palette_id);
        problems += 1;
    }

    for comp_obj in composition.composition_objects.iter() {
        if !windows.contains(&comp_obj.window_id) {
            warn!("{}: composition references unknown window {}", ts, comp_obj.window_id);
            problems += 1;
        }
        if objects.get(comp_obj.object_id).is_none() {
            warn!("{}: composition references unknown object {}", ts, comp_obj.object_id);
            problems += 1;
        }
    }

    problems
}

fn main() {

    env_logger::init();

    let matches = app_from_crate!()
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input PGS file; use - for STDIN")
            .required(true)
        )
        .after_help(format!("This utility will test PGS subtitles.\n\n\
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
    let mut windows = BTreeSet::<u8>::new();
    let mut palettes = BTreeSet::<u8>::new();
    let mut objects = ObjectReassembler::new();
    let mut display_sets = 0;
    let mut problems = 0;

    eprintln!("Iterating through PGS display sets...");

    //
    // READ
    //

    loop {

        match input.read_display_set(Framing::Headers) {
            Ok(Some(display_set)) => {
                display_sets += 1;
                problems += check(&display_set, &mut windows, &mut palettes, &mut objects);
            }
            Ok(None) => break,
            Err(err) => {
                error!("Could not read display set {}: {}", display_sets + 1, err);
                exit(1)
            }
        }
    }

    eprintln!("Read {} display sets with {} problems.", display_sets, problems);

    if problems > 0 {
        exit(2)
    }
}
