//! The run: folders in, two booklets out
//!
//! Strictly sequential. Per-image problems (undecodable file, recognizer
//! failure, drawing failure) are logged and recovered locally; only invalid
//! input as a whole and failures to write the booklets end the run.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use crate::booklet::{run_stamp, Booklet, BookletKind, OutputPaths, SlotKind};
use crate::config::{EmptyFolderPolicy, RunConfig};
use crate::enumerate::list_images;
use crate::error::{Error, Result};
use crate::ocr::{locate_boundary, TextRecognizer};
use crate::split::split_image;

/// One processed image and where its parts went
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    /// Running index shared by both booklets, starting at 1
    pub index: usize,
    pub source: PathBuf,
    /// Row the image was cut at, in original image coordinates
    pub boundary: Option<u32>,
    pub question: SlotKind,
    pub answer: SlotKind,
}

/// What happened to one input folder
#[derive(Debug, Clone, PartialEq)]
pub struct FolderReport {
    pub folder: PathBuf,
    /// Eligible images found
    pub images: usize,
    /// Images that could not be decoded
    pub failed: usize,
    /// Left out of the booklets entirely
    pub omitted: bool,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: OutputPaths,
    pub question_pages: usize,
    pub answer_pages: usize,
    pub folders: Vec<FolderReport>,
    pub slots: Vec<SlotRecord>,
}

impl RunSummary {
    pub fn failed_images(&self) -> usize {
        self.folders.iter().map(|f| f.failed).sum()
    }
}

/// Process `folders` and write both booklets, stamped with the current time
pub fn run<R: TextRecognizer + ?Sized>(
    folders: &[PathBuf],
    recognizer: &R,
    config: &RunConfig,
) -> Result<RunSummary> {
    run_at(folders, recognizer, config, Local::now().naive_local())
}

/// Like [`run`] with an explicit run time
pub fn run_at<R: TextRecognizer + ?Sized>(
    folders: &[PathBuf],
    recognizer: &R,
    config: &RunConfig,
    at: NaiveDateTime,
) -> Result<RunSummary> {
    let folders: Vec<&PathBuf> = folders
        .iter()
        .filter(|folder| {
            let ok = folder.is_dir();
            if !ok {
                warn!("{}", Error::InvalidPath(folder.to_path_buf()));
            }
            ok
        })
        .collect();

    let Some(first) = folders.first() else {
        return Err(Error::NoValidFolders);
    };

    let out_dir = first.parent().unwrap_or_else(|| Path::new("."));
    let output = OutputPaths::unused(out_dir, &config.output_prefix, &run_stamp(&at));
    info!("Question booklet: {}", output.questions.display());
    info!("Answer booklet:   {}", output.answers.display());

    let mut questions = Booklet::new(BookletKind::Questions, config.layout, config.fidelity, config.assembly)?;
    let mut answers = Booklet::new(BookletKind::Answers, config.layout, config.fidelity, config.assembly)?;

    let mut reports = Vec::new();
    let mut slots = Vec::new();

    for folder in folders {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| folder.display().to_string());
        info!("--- Processing folder: {} ---", name);

        let images = match list_images(folder, &config.enumerate) {
            Ok(images) => images,
            Err(e) => {
                warn!("{}", e);
                reports.push(FolderReport { folder: folder.clone(), images: 0, failed: 0, omitted: true });
                continue;
            }
        };

        if images.is_empty() {
            warn!("{}", Error::EmptyFolder(folder.clone()));
            let omitted = config.empty_folders == EmptyFolderPolicy::Omit;
            if !omitted {
                questions.begin_folder(&name, 0)?;
                answers.begin_folder(&name, 0)?;
            }
            reports.push(FolderReport { folder: folder.clone(), images: 0, failed: 0, omitted });
            continue;
        }

        info!("{} images found and sorted", images.len());
        questions.begin_folder(&name, images.len())?;
        answers.begin_folder(&name, images.len())?;

        let mut failed = 0;
        for (i, path) in images.iter().enumerate() {
            let file_name = path.file_name().unwrap_or_default().to_string_lossy();
            info!("Processing {}/{}: {}", i + 1, images.len(), file_name);

            let image = match image::open(path) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Failed to open {}: {}", file_name, e);
                    failed += 1;
                    continue;
                }
            };

            let boundary = match locate_boundary(&image, recognizer, &config.phrase) {
                Ok(Some(row)) => {
                    info!("'{}' found at y={}", config.phrase, row);
                    Some(row)
                }
                Ok(None) => {
                    info!("'{}' not found, using fallback", config.phrase);
                    None
                }
                Err(e) => {
                    warn!("{}; using fallback", e);
                    None
                }
            };

            let split = split_image(&image, boundary, &config.split);
            drop(image);

            let index = slots.len() + 1;
            let question = questions.place(index, &split.question)?;
            let answer = answers.place(index, &split.answer)?;

            slots.push(SlotRecord {
                index,
                source: path.clone(),
                boundary: split.cut_at,
                question,
                answer,
            });
        }

        reports.push(FolderReport { folder: folder.clone(), images: images.len(), failed, omitted: false });
    }

    let (question_pages, answer_pages) = write_booklets(questions, answers, &output)?;

    info!(
        "Wrote {} question pages and {} answer pages for {} images",
        question_pages,
        answer_pages,
        slots.len()
    );

    Ok(RunSummary {
        output,
        question_pages,
        answer_pages,
        folders: reports,
        slots,
    })
}

/// Save both booklets; if the answers cannot be written the questions are removed too
fn write_booklets(questions: Booklet, answers: Booklet, output: &OutputPaths) -> Result<(usize, usize)> {
    let question_pages = questions.finish(&output.questions)?;
    match answers.finish(&output.answers) {
        Ok(answer_pages) => Ok((question_pages, answer_pages)),
        Err(e) => {
            let _ = std::fs::remove_file(&output.questions);
            Err(e)
        }
    }
}
