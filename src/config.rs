//! Run configuration

use crate::enumerate::EnumerateOptions;
use crate::layout::LayoutConfig;
use crate::ocr::DEFAULT_PHRASE;
use crate::pdf::Fidelity;
use crate::split::SplitConfig;

/// How the two booklets are assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assembly {
    /// Draw straight into one document per booklet for the whole run
    Continuous,
    /// Render each folder to a scratch PDF and merge them at the end
    MergeFolders,
}

/// What happens to folders without eligible images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyFolderPolicy {
    /// Leave the folder out of both booklets
    Omit,
    /// Emit the folder's title pages but no content
    TitleOnly,
}

/// Everything that shapes a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Phrase marking the start of the answer region
    pub phrase: String,
    /// Tesseract language tag
    pub lang: String,
    pub enumerate: EnumerateOptions,
    pub split: SplitConfig,
    pub layout: LayoutConfig,
    pub fidelity: Fidelity,
    pub assembly: Assembly,
    pub empty_folders: EmptyFolderPolicy,
    /// Inserted into output names: `{stamp}_{prefix}_Questions.pdf`
    pub output_prefix: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            phrase: DEFAULT_PHRASE.to_string(),
            lang: "eng".to_string(),
            enumerate: EnumerateOptions::default(),
            split: SplitConfig::default(),
            layout: LayoutConfig::default(),
            fidelity: Fidelity::Direct,
            assembly: Assembly::Continuous,
            empty_folders: EmptyFolderPolicy::Omit,
            output_prefix: "SME".to_string(),
        }
    }
}
