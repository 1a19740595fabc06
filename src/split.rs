//! Cut a screenshot into its question and answer parts

use image::{DynamicImage, GenericImageView};

/// Content for one booklet slot
#[derive(Debug, Clone)]
pub enum Crop {
    Content(DynamicImage),
    /// Nothing to draw; the slot still exists
    NoContent,
}

impl Crop {
    pub fn is_content(&self) -> bool {
        matches!(self, Crop::Content(_))
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Crop::Content(image) => Some(image.dimensions()),
            Crop::NoContent => None,
        }
    }
}

/// What to do when no usable boundary was found
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallbackPolicy {
    /// Whole image is the question, the answer slot is empty
    WholeAsQuestion,
    /// Split at this fraction of the image height
    FractionalSplit(f64),
}

/// Splitting configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Answer crops shorter than this many pixels count as no content
    pub min_answer_height: u32,
    pub fallback: FallbackPolicy,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            min_answer_height: 5,
            fallback: FallbackPolicy::WholeAsQuestion,
        }
    }
}

/// Question and answer crops of one screenshot
#[derive(Debug, Clone)]
pub struct SplitImage {
    pub question: Crop,
    pub answer: Crop,
    /// Row the image was actually cut at, if it was cut
    pub cut_at: Option<u32>,
}

/// Keep an offset only if it lies strictly inside the image
pub fn clamp_offset(offset: Option<u32>, height: u32) -> Option<u32> {
    offset.filter(|&o| o > 0 && o < height)
}

/// Split `image` at `offset`
///
/// Out-of-range offsets are handled exactly like a missing one. The source
/// image is left untouched.
pub fn split_image(image: &DynamicImage, offset: Option<u32>, config: &SplitConfig) -> SplitImage {
    let (width, height) = image.dimensions();

    let cut = clamp_offset(offset, height).or_else(|| match config.fallback {
        FallbackPolicy::WholeAsQuestion => None,
        FallbackPolicy::FractionalSplit(fraction) => {
            let row = (height as f64 * fraction.clamp(0.0, 1.0)).floor() as u32;
            clamp_offset(Some(row), height)
        }
    });

    let Some(cut) = cut else {
        return SplitImage {
            question: Crop::Content(image.clone()),
            answer: Crop::NoContent,
            cut_at: None,
        };
    };

    let question = Crop::Content(image.crop_imm(0, 0, width, cut));
    let answer_height = height - cut;
    let answer = if answer_height < config.min_answer_height {
        Crop::NoContent
    } else {
        Crop::Content(image.crop_imm(0, cut, width, answer_height))
    };

    SplitImage {
        question,
        answer,
        cut_at: Some(cut),
    }
}
