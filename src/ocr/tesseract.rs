//! Tesseract-backed [`TextRecognizer`]
//!
//! `rusty-tesseract` shells out to the `tesseract` binary, so the binary must be
//! on `PATH`. The crate writes the input image to its own scratch file and
//! removes it again; nothing leaks into our contracts.

use std::collections::HashMap;

use image::GrayImage;
use rusty_tesseract::{Args, Image};
use tracing::debug;

use super::{TextFragment, TextRecognizer};
use crate::error::{Error, Result};

/// Characters the engine may emit
pub const CHAR_WHITELIST: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ .,";

/// Page segmentation mode: assume a single uniform block of text
pub const PSM_SINGLE_BLOCK: i32 = 6;

/// OCR engine mode: whatever is available
pub const OEM_DEFAULT: i32 = 3;

/// Tesseract word-level level in `image_to_data` output
const WORD_LEVEL: i32 = 5;

/// Recognizer configured for finding short English phrases in screenshots
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    lang: String,
}

impl TesseractRecognizer {
    pub fn new(lang: impl Into<String>) -> Self {
        Self { lang: lang.into() }
    }

    /// Version string of the installed engine, or the reason it is unusable
    pub fn probe() -> Result<String> {
        rusty_tesseract::get_tesseract_version().map_err(|e| Error::Recognition(e.to_string()))
    }

    fn args(&self) -> Args {
        let mut args = Args::default();
        args.lang = self.lang.clone();
        args.psm = Some(PSM_SINGLE_BLOCK);
        args.oem = Some(OEM_DEFAULT);
        args.config_variables.insert(
            "tessedit_char_whitelist".to_string(),
            CHAR_WHITELIST.to_string(),
        );
        args
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("eng")
    }
}

/// Hand the pixels to the engine's own `image` types
///
/// `rusty-tesseract` links its own version of the `image` crate, so the buffer
/// is rebuilt from raw bytes instead of passed through.
fn engine_input(image: &GrayImage) -> Result<Image> {
    let (width, height) = image.dimensions();
    let buffer = rusty_tesseract::image::GrayImage::from_raw(width, height, image.as_raw().clone())
        .ok_or_else(|| Error::Recognition("image buffer size mismatch".to_string()))?;
    Image::from_dynamic_image(&rusty_tesseract::image::DynamicImage::ImageLuma8(buffer))
        .map_err(|e| Error::Recognition(e.to_string()))
}

/// Identifies the text line a word belongs to
type LineKey = (i32, i32, i32);

/// Whole lines first, in reading order, followed by the individual words
///
/// A multi-word phrase can only match a line, and a line match must outrank
/// any single word.
fn line_and_word_fragments(words: Vec<(LineKey, TextFragment)>) -> Vec<TextFragment> {
    let mut order: Vec<LineKey> = Vec::new();
    let mut lines: HashMap<LineKey, Vec<&TextFragment>> = HashMap::new();
    for (key, word) in &words {
        lines
            .entry(*key)
            .or_insert_with(|| {
                order.push(*key);
                Vec::new()
            })
            .push(word);
    }

    let mut fragments: Vec<TextFragment> = order
        .iter()
        .filter_map(|key| lines.get(key))
        .filter(|line| line.len() > 1)
        .map(|line| {
            let left = line.iter().map(|w| w.left).min().unwrap_or(0);
            let top = line.iter().map(|w| w.top).min().unwrap_or(0);
            let right = line.iter().map(|w| w.left + w.width).max().unwrap_or(left);
            let bottom = line.iter().map(|w| w.top + w.height).max().unwrap_or(top);
            TextFragment {
                text: line.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" "),
                left,
                top,
                width: right - left,
                height: bottom - top,
            }
        })
        .collect();

    fragments.extend(words.into_iter().map(|(_, word)| word));
    fragments
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextFragment>> {
        let input = engine_input(image)?;

        let output = rusty_tesseract::image_to_data(&input, &self.args())
            .map_err(|e| Error::Recognition(e.to_string()))?;
        debug!("Tesseract produced {} rows", output.data.len());

        let words = output
            .data
            .into_iter()
            .filter(|row| row.level == WORD_LEVEL && !row.text.trim().is_empty())
            .map(|row| {
                let key = (row.block_num, row.par_num, row.line_num);
                let word = TextFragment {
                    text: row.text.trim().to_string(),
                    left: row.left.max(0) as u32,
                    top: row.top.max(0) as u32,
                    width: row.width.max(0) as u32,
                    height: row.height.max(0) as u32,
                };
                (key, word)
            })
            .collect();

        Ok(line_and_word_fragments(words))
    }
}
