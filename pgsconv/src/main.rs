/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */


use pgs::{
    export::{sup_to_sup, ExportError, ExportOptions},
    ocr::TessdataStore,
    source::SupSource,
};
use std::{
    error::Error,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    process::exit,
    sync::{mpsc::channel, Arc},
};
use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};
use log::{debug, error};
use threadpool::ThreadPool;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Format {
    Srt,
    Sup,
}

impl Format {

    fn extension(self) -> &'static str {
        match self {
            Format::Srt => "srt",
            Format::Sup => "sup",
        }
    }
}

#[cfg(feature = "tesseract")]
fn to_srt(
    source: SupSource<BufReader<File>>,
    store: &TessdataStore,
    options: &ExportOptions,
    output: &Path,
) -> Result<usize, ExportError> {

    let recognizer = pgs::ocr::TesseractRecognizer::new(store, &options.language)?;

    pgs::export::sup_to_srt(source, recognizer, options, output)
}

#[cfg(not(feature = "tesseract"))]
fn to_srt(
    _: SupSource<BufReader<File>>,
    _: &TessdataStore,
    _: &ExportOptions,
    _: &Path,
) -> Result<usize, ExportError> {
    Err(
        pgs::ocr::OcrError::EngineError(
            "this build has no OCR engine; enable the tesseract feature".to_string()
        ).into()
    )
}

fn convert(
    input: &Path,
    output: &Path,
    format: Format,
    store: &TessdataStore,
    options: &ExportOptions,
) -> Result<usize, ExportError> {

    let source = SupSource::new(BufReader::new(File::open(input)?));

    match format {
        Format::Srt => to_srt(source, store, options, output),
        Format::Sup => sup_to_sup(source, options, output),
    }
}

/// Picks where the converted form of an input goes.
fn output_path(input: &Path, dir: Option<&Path>, format: Format) -> PathBuf {

    let stem = input.file_stem().unwrap_or_else(|| input.as_os_str()).to_string_lossy();
    // A cleaned stream must not collide with its own input.
    let name = match format {
        Format::Srt => format!("{}.srt", stem),
        Format::Sup => format!("{}.clean.{}", stem, format.extension()),
    };

    match dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn describe(err: &dyn Error) -> String {

    let mut description = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }

    description
}

fn main() {

    env_logger::init();

    let matches = app_from_crate!()
        .arg(Arg::with_name("output")
            .long("output")
            .short("o")
            .value_name("DIR")
            .help("Directory to write converted files to; defaults to each input's directory")
            .takes_value(true)
        )
        .arg(Arg::with_name("format")
            .long("format")
            .short("f")
            .value_name("FORMAT")
            .help("Output format")
            .takes_value(true)
            .possible_values(&["srt", "sup"])
            .default_value("srt")
        )
        .arg(Arg::with_name("lang")
            .long("lang")
            .short("l")
            .value_name("CODE")
            .help("ISO 639-2 language of the subtitles")
            .takes_value(true)
            .default_value("eng")
        )
        .arg(Arg::with_name("tessdata")
            .long("tessdata")
            .short("t")
            .value_name("DIR")
            .help("Directory holding OCR trained data; missing languages are downloaded")
            .takes_value(true)
            .default_value("tessdata")
        )
        .arg(Arg::with_name("no-cleanup")
            .long("no-cleanup")
            .help("Keep display sets that repeat the previous one's objects")
        )
        .arg(Arg::with_name("jobs")
            .long("jobs")
            .short("j")
            .value_name("COUNT")
            .help("Number of inputs to convert at once; defaults to the number of CPUs")
            .takes_value(true)
        )
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT-FILE")
            .help("Input PGS files")
            .required(true)
            .multiple(true)
        )
        .after_help(format!("This utility will convert PGS subtitles to SubRip text or to \
            cleaned PGS streams.\n\n\
            Copyright © 2022 William Swartzendruber\n\
            Licensed under the Mozilla Public License 2.0\n\
            <{}>", env!("CARGO_PKG_REPOSITORY")).as_str())
        .get_matches();
    let format = match matches.value_of("format").unwrap() {
        "sup" => Format::Sup,
        _ => Format::Srt,
    };
    let jobs = match matches.value_of("jobs") {
        Some(value) => match value.parse::<usize>() {
            Ok(jobs) if jobs > 0 => jobs,
            _ => {
                error!("Invalid job count: {}", value);
                exit(1)
            }
        },
        None => num_cpus::get(),
    };
    let output_dir = matches.value_of("output").map(PathBuf::from);
    let options = Arc::new(
        ExportOptions {
            language: matches.value_of("lang").unwrap().to_string(),
            cleanup: !matches.is_present("no-cleanup"),
        }
    );
    let store = Arc::new(TessdataStore::new(matches.value_of("tessdata").unwrap()));
    let inputs = matches.values_of("input").unwrap().map(PathBuf::from).collect::<Vec<_>>();
    let pool = ThreadPool::new(jobs);
    let (tx, rx) = channel();

    debug!("converting {} inputs with {} jobs", inputs.len(), jobs);

    for input in inputs {

        let output = output_path(&input, output_dir.as_deref(), format);
        let tx = tx.clone();
        let store = Arc::clone(&store);
        let options = Arc::clone(&options);

        pool.execute(move || {
            let result = convert(&input, &output, format, &store, &options)
                .map_err(|err| describe(&err));
            tx.send((input, output, result)).ok();
        });
    }

    drop(tx);

    let mut failures = 0;

    for (input, output, result) in rx {
        match result {
            Ok(count) => {
                eprintln!("{} -> {} ({} entries)", input.display(), output.display(), count);
            }
            Err(description) => {
                error!("Could not convert {}: {}", input.display(), description);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        exit(1)
    }
}
