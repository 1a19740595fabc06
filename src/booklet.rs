//! The two output booklets and how crops are laid out in them

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use image::GenericImageView;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::config::Assembly;
use crate::error::Result;
use crate::layout::{
    place_flowing, place_single, place_text_line, Length, LayoutConfig, LayoutMode, PageCursor,
};
use crate::pdf::{merge_pdfs, BookletDocument, Fidelity, Font, MergeOptions};
use crate::split::Crop;

const LABEL_FONT_SIZE: f32 = 10.0;
const MESSAGE_FONT_SIZE: f32 = 12.0;
const TITLE_FONT_SIZE: f32 = 24.0;
const NO_CONTENT_MESSAGE: &str = "No corresponding content found.";

/// Which of the two booklets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookletKind {
    Questions,
    Answers,
}

impl BookletKind {
    /// Label drawn next to each slot index
    pub fn label(&self) -> &'static str {
        match self {
            BookletKind::Questions => "Question",
            BookletKind::Answers => "Answer",
        }
    }

    fn file_suffix(&self) -> &'static str {
        match self {
            BookletKind::Questions => "Questions",
            BookletKind::Answers => "Answers",
        }
    }
}

/// What ended up in a booklet slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// The crop was drawn
    Image,
    /// The crop had no content (placeholder page in one-per-page mode)
    NoContent,
    /// Drawing failed and an error notice took its place
    RenderError,
}

/// Run stamp used in output names, e.g. `250314_0915`
pub fn run_stamp(at: &NaiveDateTime) -> String {
    at.format("%y%m%d_%H%M").to_string()
}

/// Where the two booklets of a run are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub questions: PathBuf,
    pub answers: PathBuf,
}

impl OutputPaths {
    /// `{dir}/{stamp}_{prefix}_Questions.pdf` and the matching answers path
    pub fn new(dir: &Path, prefix: &str, stamp: &str) -> Self {
        let name = |kind: BookletKind| dir.join(format!("{}_{}_{}.pdf", stamp, prefix, kind.file_suffix()));
        Self {
            questions: name(BookletKind::Questions),
            answers: name(BookletKind::Answers),
        }
    }

    /// Like [`OutputPaths::new`], adding `_2`, `_3`, ... to the stamp until
    /// neither file exists yet
    pub fn unused(dir: &Path, prefix: &str, stamp: &str) -> Self {
        let mut paths = Self::new(dir, prefix, stamp);
        let mut n = 2;
        while paths.questions.exists() || paths.answers.exists() {
            paths = Self::new(dir, prefix, &format!("{}_{}", stamp, n));
            n += 1;
        }
        paths
    }

    pub fn get(&self, kind: BookletKind) -> &Path {
        match kind {
            BookletKind::Questions => &self.questions,
            BookletKind::Answers => &self.answers,
        }
    }
}

/// Where finished pages go
enum Sink {
    Continuous(BookletDocument),
    PerFolder {
        current: Option<BookletDocument>,
        parts: Vec<PathBuf>,
        scratch: TempDir,
    },
}

impl Sink {
    fn current(&mut self, layout: &LayoutConfig, fidelity: Fidelity) -> &mut BookletDocument {
        match self {
            Sink::Continuous(doc) => doc,
            Sink::PerFolder { current, .. } => {
                current.get_or_insert_with(|| BookletDocument::new(layout.page, fidelity))
            }
        }
    }
}

/// One output booklet, fed slot by slot
pub struct Booklet {
    kind: BookletKind,
    layout: LayoutConfig,
    fidelity: Fidelity,
    sink: Sink,
    cursor: PageCursor,
}

impl Booklet {
    pub fn new(
        kind: BookletKind,
        layout: LayoutConfig,
        fidelity: Fidelity,
        assembly: Assembly,
    ) -> Result<Self> {
        let sink = match assembly {
            Assembly::Continuous => Sink::Continuous(BookletDocument::new(layout.page, fidelity)),
            Assembly::MergeFolders => Sink::PerFolder {
                current: None,
                parts: Vec::new(),
                scratch: TempDir::new()?,
            },
        };

        Ok(Self {
            kind,
            layout,
            fidelity,
            sink,
            cursor: PageCursor::at_top(&layout),
        })
    }

    /// Start a folder section with its title page
    pub fn begin_folder(&mut self, title: &str, image_count: usize) -> Result<()> {
        self.end_folder()?;

        let middle = self.layout.page.height.pt() / 2.0;
        let doc = self.sink.current(&self.layout, self.fidelity);
        doc.start_page();
        doc.draw_text_centered(title, Font::Bold, TITLE_FONT_SIZE, middle)?;
        let count = match image_count {
            1 => "1 image".to_string(),
            n => format!("{} images", n),
        };
        doc.draw_text_centered(&count, Font::Regular, MESSAGE_FONT_SIZE, middle - 30.0)?;
        doc.finish_page();

        self.cursor = PageCursor::at_top(&self.layout);
        Ok(())
    }

    /// Close the current folder section
    ///
    /// In per-folder assembly the section is written to a scratch PDF.
    pub fn end_folder(&mut self) -> Result<()> {
        if let Sink::PerFolder { current, parts, scratch } = &mut self.sink {
            if let Some(doc) = current.take() {
                let path = scratch
                    .path()
                    .join(format!("{}-{:03}.pdf", self.kind.file_suffix(), parts.len() + 1));
                let pages = doc.save(&path)?;
                debug!("Wrote {} pages to {}", pages, path.display());
                parts.push(path);
            }
        }
        Ok(())
    }

    /// Put the crop for slot `index` into the booklet
    ///
    /// Drawing failures are recovered with an error notice in the slot; only
    /// failures unrelated to the crop itself are returned.
    pub fn place(&mut self, index: usize, crop: &Crop) -> Result<SlotKind> {
        match self.layout.mode {
            LayoutMode::OnePerPage { .. } => self.place_on_own_page(index, crop),
            LayoutMode::Flowing { .. } => self.place_flowing(index, crop),
        }
    }

    fn place_on_own_page(&mut self, index: usize, crop: &Crop) -> Result<SlotKind> {
        let label = format!("{}: {}", self.kind.label(), index);
        let inset = Length::from_inches(0.5).pt();
        let page_h = self.layout.page.height.pt();
        let layout = self.layout;

        let doc = self.sink.current(&self.layout, self.fidelity);
        doc.start_page();
        doc.draw_text(&label, Font::Regular, LABEL_FONT_SIZE, inset, page_h - inset)?;

        let slot = match crop {
            Crop::NoContent => {
                doc.draw_text_centered(NO_CONTENT_MESSAGE, Font::Regular, MESSAGE_FONT_SIZE, page_h / 2.0)?;
                SlotKind::NoContent
            }
            Crop::Content(image) => {
                let (width, height) = image.dimensions();
                let rect = place_single(width, height, &layout);
                match doc.draw_image(image, rect) {
                    Ok(()) => SlotKind::Image,
                    Err(e) => {
                        warn!("Failed to draw {} {}: {}", self.kind.label(), index, e);
                        doc.draw_text_centered(
                            &error_message(index),
                            Font::Regular,
                            MESSAGE_FONT_SIZE,
                            page_h / 2.0,
                        )?;
                        SlotKind::RenderError
                    }
                }
            }
        };

        doc.finish_page();
        Ok(slot)
    }

    fn place_flowing(&mut self, index: usize, crop: &Crop) -> Result<SlotKind> {
        let Crop::Content(image) = crop else {
            return Ok(SlotKind::NoContent);
        };

        let layout = self.layout;
        let doc = self.sink.current(&self.layout, self.fidelity);

        if !doc.has_open_page() {
            doc.start_page();
            self.cursor = PageCursor::at_top(&layout);
        }

        let (width, height) = image.dimensions();
        let (next, placement) = place_flowing(self.cursor, width, height, &layout);
        if placement.new_page {
            doc.start_page();
            self.cursor = PageCursor::at_top(&layout);
        }

        match doc.draw_image(image, placement.rect) {
            Ok(()) => {
                self.cursor = next;
                Ok(SlotKind::Image)
            }
            Err(e) => {
                warn!("Failed to draw {} {}: {}", self.kind.label(), index, e);
                let line_height = MESSAGE_FONT_SIZE as f64 * 1.2;
                let (next, new_page, baseline) = place_text_line(self.cursor, line_height, &layout);
                if new_page {
                    doc.start_page();
                }
                doc.draw_text(
                    &error_message(index),
                    Font::Regular,
                    MESSAGE_FONT_SIZE,
                    layout.margins.left.pt(),
                    baseline,
                )?;
                self.cursor = next;
                Ok(SlotKind::RenderError)
            }
        }
    }

    /// Write the booklet to `path`, returning its page count
    pub fn finish(mut self, path: &Path) -> Result<usize> {
        self.end_folder()?;

        match self.sink {
            Sink::Continuous(doc) => doc.save(path),
            Sink::PerFolder { parts, scratch, .. } => {
                let pages = if parts.is_empty() {
                    BookletDocument::new(self.layout.page, self.fidelity).save(path)?
                } else {
                    merge_pdfs(&MergeOptions {
                        input_paths: parts,
                        output_path: path.to_path_buf(),
                    })?
                };
                // Scratch files go away with the directory
                drop(scratch);
                Ok(pages)
            }
        }
    }
}

fn error_message(index: usize) -> String {
    format!("Error drawing image for index {}.", index)
}
