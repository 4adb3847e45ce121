/*
 * SPDX-FileCopyrightText: 2022 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Text recognition of rasterized objects.
//!
//! Recognition itself happens behind the [`Recognize`] trait. The Tesseract backend, enabled with
//! the `tesseract` feature, needs a trained data file per language. Those files are provisioned
//! on first use by a [`TessdataStore`], which downloads each of them at most once even when
//! several pipelines ask for the same language at the same time.


use super::export::write_atomically;
use std::{
    io::{Cursor, Error as IoError, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use image::{GrayAlphaImage, ImageError, ImageFormat};
use log::{debug, info, warn};
use reqwest::blocking::{Client, Response};
use thiserror::Error as ThisError;

/// Where trained data files are fetched from.
pub const TESSDATA_URL: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// The error type for recognition and provisioning.
#[derive(ThisError, Debug)]
pub enum OcrError {
    #[error("OCR IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("could not encode image for recognition")]
    ImageError {
        #[from]
        source: ImageError,
    },
    /// Trained data could not be downloaded.
    #[error("could not fetch {url}: {reason}")]
    FetchError {
        url: String,
        reason: String,
    },
    /// The recognition engine failed to start or to process an image.
    #[error("OCR engine error: {0}")]
    EngineError(String),
}

/// Recognizes the text within an image.
///
/// An image without text yields an empty string rather than an error.
pub trait Recognize {
    fn recognize(&mut self, image: &GrayAlphaImage, language: &str) -> Result<String, OcrError>;
}

impl<F> Recognize for F where
    F: FnMut(&GrayAlphaImage, &str) -> Result<String, OcrError>,
{
    fn recognize(&mut self, image: &GrayAlphaImage, language: &str) -> Result<String, OcrError> {
        self(image, language)
    }
}

/// Downloads a file.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str, output: &mut dyn Write) -> Result<(), OcrError>;
}

/// Downloads over HTTP with a blocking `reqwest` client.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestFetch;

impl Fetch for ReqwestFetch {

    fn fetch(&self, url: &str, output: &mut dyn Write) -> Result<(), OcrError> {

        let fetch_error = |err: reqwest::Error| OcrError::FetchError {
            url: url.to_string(),
            reason: err.to_string(),
        };
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(fetch_error)?;
        let mut response = client.get(url)
            .send()
            .and_then(Response::error_for_status)
            .map_err(fetch_error)?;

        debug!("{} answered {}", url, response.status());
        response.copy_to(output).map_err(fetch_error)?;

        Ok(())
    }
}

/// A directory of Tesseract trained data files, filled on demand.
pub struct TessdataStore<F = ReqwestFetch> {
    dir: PathBuf,
    fetch: F,
    lock: Mutex<()>,
}

impl TessdataStore<ReqwestFetch> {

    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self::with_fetch(dir, ReqwestFetch)
    }
}

impl<F: Fetch> TessdataStore<F> {

    pub fn with_fetch<P: Into<PathBuf>>(dir: P, fetch: F) -> Self {
        TessdataStore {
            dir: dir.into(),
            fetch,
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the trained data for a language lives.
    pub fn path(&self, language: &str) -> PathBuf {
        self.dir.join(format!("{}.traineddata", language))
    }

    /// Makes sure the trained data for a language is present, downloading it if needed.
    ///
    /// A failed download is retried once.
    pub fn provision(&self, language: &str) -> Result<PathBuf, OcrError> {

        let path = self.path(language);

        if path.exists() {
            return Ok(path)
        }

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another pipeline may have finished the download while this one waited.
        if path.exists() {
            return Ok(path)
        }

        std::fs::create_dir_all(&self.dir)?;

        if let Err(err) = self.download(language, &path) {
            warn!("could not download trained data for '{}', retrying: {}", language, err);
            if !path.exists() {
                self.download(language, &path)?;
            }
        }

        Ok(path)
    }

    fn download(&self, language: &str, path: &Path) -> Result<(), OcrError> {

        let url = format!("{}/{}.traineddata", TESSDATA_URL, language);

        info!("downloading trained data for '{}' from {}", language, url);
        write_atomically(path, |writer| self.fetch.fetch(&url, writer))?;
        info!("trained data for '{}' was downloaded", language);

        Ok(())
    }
}

/// Maps bibliographic ISO 639-2 language codes to the terminological codes Tesseract uses.
pub fn map_language(language: &str) -> &str {
    match language {
        "ger" => "deu",
        "fre" => "fra",
        "dut" => "nld",
        "ice" => "isl",
        other => other,
    }
}

/// Encodes an image as PNG.
pub fn encode_png(image: &GrayAlphaImage) -> Result<Vec<u8>, OcrError> {

    let mut png = Vec::new();

    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(png)
}

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;

#[cfg(feature = "tesseract")]
mod tesseract {

    use super::{encode_png, map_language, Fetch, OcrError, Recognize, TessdataStore};
    use std::path::PathBuf;
    use image::GrayAlphaImage;
    use leptess::LepTess;
    use log::debug;

    /// Recognizes text with Tesseract.
    pub struct TesseractRecognizer {
        engine: LepTess,
        dir: PathBuf,
        language: String,
    }

    impl TesseractRecognizer {

        /// Starts an engine for a language, provisioning its trained data first.
        pub fn new<F: Fetch>(store: &TessdataStore<F>, language: &str) -> Result<Self, OcrError> {

            let language = map_language(language);

            store.provision(language)?;

            Ok(
                TesseractRecognizer {
                    engine: start(store.dir().to_path_buf(), language)?,
                    dir: store.dir().to_path_buf(),
                    language: language.to_string(),
                }
            )
        }
    }

    impl Recognize for TesseractRecognizer {

        fn recognize(&mut self, image: &GrayAlphaImage, language: &str)
            -> Result<String, OcrError> {

            let language = map_language(language);

            if language != self.language {
                debug!("switching OCR engine from '{}' to '{}'", self.language, language);
                self.engine = start(self.dir.clone(), language)?;
                self.language = language.to_string();
            }

            self.engine.set_image_from_mem(&encode_png(image)?)
                .map_err(|err| OcrError::EngineError(err.to_string()))?;
            self.engine.get_utf8_text()
                .map_err(|err| OcrError::EngineError(err.to_string()))
        }
    }

    fn start(dir: PathBuf, language: &str) -> Result<LepTess, OcrError> {

        let dir = dir.to_str()
            .ok_or_else(|| OcrError::EngineError(format!("invalid path {}", dir.display())))?
            .to_string();

        LepTess::new(Some(&dir), language).map_err(|err| OcrError::EngineError(err.to_string()))
    }
}
