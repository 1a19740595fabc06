//! Boundary detection: find the row where the answer feedback starts
//!
//! The screenshot is binarized, handed to a [`TextRecognizer`], and the
//! recognized fragments are searched for the target phrase with a ranked list
//! of matchers. The returned row is expressed in the original image's
//! coordinates.

pub mod preprocess;
pub mod tesseract;

use image::{DynamicImage, GrayImage};
use tracing::debug;

use crate::error::Result;

pub use preprocess::{binarize, enhance_contrast, preprocess_for_ocr, CONTRAST_FACTOR, THRESHOLD};
pub use tesseract::TesseractRecognizer;

/// Phrase that opens the answer feedback block
pub const DEFAULT_PHRASE: &str = "You answered";

/// A piece of recognized text with its bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl TextFragment {
    /// Fragment with only text and a top coordinate
    pub fn at(text: impl Into<String>, top: u32) -> Self {
        Self {
            text: text.into(),
            left: 0,
            top,
            width: 0,
            height: 0,
        }
    }
}

/// Something that turns a preprocessed image into text fragments
///
/// Fragment coordinates are in the space of the image passed in.
pub trait TextRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextFragment>>;
}

/// How strongly a fragment matched the phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    /// The whole phrase, ignoring case
    Phrase,
    /// One word of the phrase, exact case
    Word,
}

type Matcher = fn(&str, &str) -> bool;

/// Matchers in priority order; a lower tier is only consulted when no fragment
/// matched any higher tier.
const MATCHERS: [(MatchTier, Matcher); 2] = [
    (MatchTier::Phrase, matches_phrase),
    (MatchTier::Word, matches_word),
];

fn matches_phrase(text: &str, phrase: &str) -> bool {
    text.to_lowercase().contains(&phrase.to_lowercase())
}

fn matches_word(text: &str, phrase: &str) -> bool {
    phrase.split_whitespace().any(|word| text.contains(word))
}

/// A fragment that matched, and how
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhraseMatch<'a> {
    pub tier: MatchTier,
    pub fragment: &'a TextFragment,
}

/// Find the best fragment for `phrase`
///
/// Within a tier the first fragment in recognizer order wins. Fragments that
/// are blank after trimming are ignored.
pub fn find_phrase<'a>(fragments: &'a [TextFragment], phrase: &str) -> Option<PhraseMatch<'a>> {
    MATCHERS.iter().find_map(|&(tier, matcher)| {
        fragments
            .iter()
            .filter(|f| !f.text.trim().is_empty())
            .find(|f| matcher(f.text.trim(), phrase))
            .map(|fragment| PhraseMatch { tier, fragment })
    })
}

/// Map a row from the preprocessed image back to the original image
pub fn rescale_row(row: u32, original_height: u32, processed_height: u32) -> u32 {
    if processed_height == 0 {
        return row;
    }
    (row as f64 * (original_height as f64 / processed_height as f64)) as u32
}

/// Locate the first row of the answer region in `image`
///
/// `Ok(None)` means the phrase was not found. Recognizer failures are returned
/// as errors so the caller can decide on a fallback.
pub fn locate_boundary<R: TextRecognizer + ?Sized>(
    image: &DynamicImage,
    recognizer: &R,
    phrase: &str,
) -> Result<Option<u32>> {
    let processed = preprocess_for_ocr(image);
    let fragments = recognizer.recognize(&processed)?;
    debug!("Recognizer returned {} fragments", fragments.len());

    Ok(find_phrase(&fragments, phrase).map(|found| {
        let row = rescale_row(found.fragment.top, image.height(), processed.height());
        debug!(
            "{:?} match '{}' at y={}",
            found.tier,
            found.fragment.text.trim(),
            row
        );
        row
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::{GrayImage, Luma};

    struct Fixed(Vec<TextFragment>);

    impl TextRecognizer for Fixed {
        fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextFragment>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl TextRecognizer for Broken {
        fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextFragment>> {
            Err(Error::Recognition("engine missing".to_string()))
        }
    }

    #[test]
    fn test_phrase_match_ignores_case() {
        let fragments = vec![
            TextFragment::at("Question 4", 10),
            TextFragment::at("YOU ANSWERED correctly", 220),
        ];
        let found = find_phrase(&fragments, DEFAULT_PHRASE).unwrap();
        assert_eq!(found.tier, MatchTier::Phrase);
        assert_eq!(found.fragment.top, 220);
    }

    #[test]
    fn test_phrase_beats_earlier_word_match() {
        let fragments = vec![
            TextFragment::at("You", 50),
            TextFragment::at("you answered", 300),
        ];
        let found = find_phrase(&fragments, DEFAULT_PHRASE).unwrap();
        assert_eq!(found.tier, MatchTier::Phrase);
        assert_eq!(found.fragment.top, 300);
    }

    #[test]
    fn test_word_fallback_is_case_sensitive() {
        let fragments = vec![
            TextFragment::at("you", 40),
            TextFragment::at("   ", 45),
            TextFragment::at("answered", 310),
            TextFragment::at("You", 305),
        ];
        let found = find_phrase(&fragments, DEFAULT_PHRASE).unwrap();
        assert_eq!(found.tier, MatchTier::Word);
        assert_eq!(found.fragment.top, 310);
    }

    #[test]
    fn test_no_match() {
        let fragments = vec![TextFragment::at("Correct answer", 12)];
        assert!(find_phrase(&fragments, DEFAULT_PHRASE).is_none());
        assert!(find_phrase(&[], DEFAULT_PHRASE).is_none());
    }

    #[test]
    fn test_rescale_row() {
        assert_eq!(rescale_row(150, 1000, 500), 300);
        assert_eq!(rescale_row(300, 1000, 1000), 300);
        assert_eq!(rescale_row(7, 10, 0), 7);
    }

    #[test]
    fn test_locate_boundary_with_fixed_fragments() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 100, Luma([255])));
        let recognizer = Fixed(vec![TextFragment::at("You answered", 42)]);
        let row = locate_boundary(&image, &recognizer, DEFAULT_PHRASE).unwrap();
        assert_eq!(row, Some(42));

        let nothing = Fixed(Vec::new());
        assert_eq!(locate_boundary(&image, &nothing, DEFAULT_PHRASE).unwrap(), None);
    }

    #[test]
    fn test_locate_boundary_propagates_engine_failure() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 100, Luma([255])));
        let result = locate_boundary(&image, &Broken, DEFAULT_PHRASE);
        assert!(matches!(result, Err(Error::Recognition(_))));
    }
}
