//! Integration tests for the booklet pipeline

use chrono::{NaiveDate, NaiveDateTime};
use image::{GrayImage, Luma};
use lopdf::Document;
use quiz_booklets::booklet::SlotKind;
use quiz_booklets::layout::LayoutConfig;
use quiz_booklets::ocr::{TextFragment, TextRecognizer};
use quiz_booklets::pdf::count_pages;
use quiz_booklets::pipeline::run_at;
use quiz_booklets::{Assembly, EmptyFolderPolicy, Error, Result, RunConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Reports "You answered" at the first all-black row, like a real OCR engine
/// reading a dark banner
struct BandRecognizer;

impl TextRecognizer for BandRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextFragment>> {
        let band = (0..image.height()).find(|&y| (0..image.width()).all(|x| image.get_pixel(x, y)[0] == 0));
        Ok(band
            .map(|top| vec![TextFragment::at("Score", 0), TextFragment::at("You answered", top)])
            .unwrap_or_default())
    }
}

/// Always fails, as when the tesseract binary is missing
struct MissingEngine;

impl TextRecognizer for MissingEngine {
    fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextFragment>> {
        Err(Error::Recognition("tesseract not found".to_string()))
    }
}

fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(9, 7, 0)
        .unwrap()
}

/// White screenshot with an optional black band starting at `band`
fn write_screenshot(path: &Path, width: u32, height: u32, band: Option<u32>) {
    let mut img = GrayImage::from_pixel(width, height, Luma([255]));
    if let Some(top) = band {
        for y in top..(top + 20).min(height) {
            for x in 0..width {
                img.put_pixel(x, y, Luma([0]));
            }
        }
    }
    img.save(path).unwrap();
}

/// `/Height` of the first image drawn on page `page_number` (1-based)
fn image_height(pdf: &Path, page_number: u32) -> i64 {
    let doc = Document::load(pdf).unwrap();
    let page_id = doc.get_pages()[&page_number];
    let xobjects = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Resources")
        .and_then(|r| r.as_dict())
        .and_then(|r| r.get(b"XObject"))
        .and_then(|x| x.as_dict())
        .unwrap();
    let image_id = xobjects.get(b"Im1").and_then(|i| i.as_reference()).unwrap();
    doc.get_object(image_id)
        .and_then(|o| o.as_stream())
        .and_then(|s| s.dict.get(b"Height"))
        .and_then(|h| h.as_i64())
        .unwrap()
}

/// A quiz folder under `root` holding `1.png` (with band) and `2.png` (without)
fn quiz_folder(root: &Path, name: &str) -> PathBuf {
    let folder = root.join(name);
    fs::create_dir(&folder).unwrap();
    write_screenshot(&folder.join("1.png"), 400, 1000, Some(300));
    write_screenshot(&folder.join("2.png"), 400, 1000, None);
    folder
}

#[test]
fn test_end_to_end_single_folder() {
    let root = TempDir::new().unwrap();
    let folder = quiz_folder(root.path(), "week-1");

    let summary = run_at(&[folder], &BandRecognizer, &RunConfig::default(), stamp()).unwrap();

    assert_eq!(
        summary.output.questions,
        root.path().join("240305_0907_SME_Questions.pdf")
    );
    assert_eq!(
        summary.output.answers,
        root.path().join("240305_0907_SME_Answers.pdf")
    );

    // Title page plus one page per image in each booklet
    assert_eq!(summary.question_pages, 3);
    assert_eq!(summary.answer_pages, 3);
    assert_eq!(count_pages(&summary.output.questions).unwrap(), 3);
    assert_eq!(count_pages(&summary.output.answers).unwrap(), 3);

    assert_eq!(summary.slots.len(), 2);
    let first = &summary.slots[0];
    assert_eq!(first.index, 1);
    assert!(first.source.ends_with("1.png"));
    assert_eq!(first.boundary, Some(300));
    assert_eq!(first.question, SlotKind::Image);
    assert_eq!(first.answer, SlotKind::Image);

    let second = &summary.slots[1];
    assert_eq!(second.index, 2);
    assert!(second.source.ends_with("2.png"));
    assert_eq!(second.boundary, None);
    assert_eq!(second.question, SlotKind::Image);
    assert_eq!(second.answer, SlotKind::NoContent);

    // Page 1 is the folder title; image 1 is cut into rows 0..300 and 300..1000
    assert_eq!(image_height(&summary.output.questions, 2), 300);
    assert_eq!(image_height(&summary.output.answers, 2), 700);
    assert_eq!(image_height(&summary.output.questions, 3), 1000);
}

#[test]
fn test_indices_continue_across_folders() {
    let root = TempDir::new().unwrap();
    let first = quiz_folder(root.path(), "week-1");
    let second = quiz_folder(root.path(), "week-2");

    let summary = run_at(&[first, second], &BandRecognizer, &RunConfig::default(), stamp()).unwrap();

    let indices: Vec<usize> = summary.slots.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4]);
    assert!(summary.slots[2].source.ends_with("week-2/1.png"));

    // Two title pages and four content pages, in both booklets
    assert_eq!(summary.question_pages, 6);
    assert_eq!(summary.answer_pages, 6);
}

#[test]
fn test_merged_assembly_matches_continuous() {
    let root = TempDir::new().unwrap();
    let first = quiz_folder(root.path(), "week-1");
    let second = quiz_folder(root.path(), "week-2");

    let config = RunConfig {
        assembly: Assembly::MergeFolders,
        output_prefix: "Merged".to_string(),
        ..RunConfig::default()
    };
    let summary = run_at(&[first, second], &BandRecognizer, &config, stamp()).unwrap();

    assert_eq!(count_pages(&summary.output.questions).unwrap(), 6);
    assert_eq!(count_pages(&summary.output.answers).unwrap(), 6);
    assert!(summary
        .output
        .answers
        .ends_with("240305_0907_Merged_Answers.pdf"));
}

#[test]
fn test_result_summary_is_excluded() {
    let root = TempDir::new().unwrap();
    let folder = quiz_folder(root.path(), "week-1");
    write_screenshot(&folder.join("00_Result.png"), 400, 1000, Some(100));

    let summary = run_at(&[folder], &BandRecognizer, &RunConfig::default(), stamp()).unwrap();

    assert_eq!(summary.slots.len(), 2);
    assert!(summary
        .slots
        .iter()
        .all(|slot| !slot.source.ends_with("00_Result.png")));
}

#[test]
fn test_unreadable_image_uses_no_slot() {
    let root = TempDir::new().unwrap();
    let folder = quiz_folder(root.path(), "week-1");
    fs::write(folder.join("3.png"), b"not a png").unwrap();
    write_screenshot(&folder.join("4.png"), 400, 1000, Some(500));

    let summary = run_at(&[folder], &BandRecognizer, &RunConfig::default(), stamp()).unwrap();

    assert_eq!(summary.failed_images(), 1);
    assert_eq!(summary.slots.len(), 3);
    assert!(summary.slots[2].source.ends_with("4.png"));
    assert_eq!(summary.slots[2].index, 3);
    assert_eq!(summary.slots[2].boundary, Some(500));
    assert_eq!(summary.question_pages, summary.answer_pages);
}

#[test]
fn test_recognizer_failure_falls_back() {
    let root = TempDir::new().unwrap();
    let folder = quiz_folder(root.path(), "week-1");

    let summary = run_at(&[folder], &MissingEngine, &RunConfig::default(), stamp()).unwrap();

    assert_eq!(summary.slots.len(), 2);
    for slot in &summary.slots {
        assert_eq!(slot.boundary, None);
        assert_eq!(slot.question, SlotKind::Image);
        assert_eq!(slot.answer, SlotKind::NoContent);
    }
    assert_eq!(summary.answer_pages, 3);
}

#[test]
fn test_empty_folder_is_omitted() {
    let root = TempDir::new().unwrap();
    let empty = root.path().join("empty");
    fs::create_dir(&empty).unwrap();
    fs::write(empty.join("notes.txt"), b"no screenshots here").unwrap();
    let folder = quiz_folder(root.path(), "week-1");

    let summary = run_at(&[empty, folder], &BandRecognizer, &RunConfig::default(), stamp()).unwrap();

    assert!(summary.folders[0].omitted);
    assert_eq!(summary.folders[0].images, 0);
    assert_eq!(summary.slots.len(), 2);
    assert_eq!(summary.question_pages, 3);
    assert_eq!(summary.answer_pages, 3);
}

#[test]
fn test_empty_folder_title_only() {
    let root = TempDir::new().unwrap();
    let empty = root.path().join("empty");
    fs::create_dir(&empty).unwrap();

    let config = RunConfig {
        empty_folders: EmptyFolderPolicy::TitleOnly,
        ..RunConfig::default()
    };
    let summary = run_at(&[empty], &BandRecognizer, &config, stamp()).unwrap();

    assert!(!summary.folders[0].omitted);
    assert!(summary.slots.is_empty());
    assert_eq!(summary.question_pages, 1);
    assert_eq!(summary.answer_pages, 1);
}

#[test]
fn test_no_valid_folders() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("missing");
    let file = root.path().join("file.png");
    fs::write(&file, b"").unwrap();

    let result = run_at(&[missing, file], &BandRecognizer, &RunConfig::default(), stamp());

    assert!(matches!(result, Err(Error::NoValidFolders)));
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);
}

#[test]
fn test_repeated_run_does_not_overwrite() {
    let root = TempDir::new().unwrap();
    let folder = quiz_folder(root.path(), "week-1");

    let first = run_at(&[folder.clone()], &BandRecognizer, &RunConfig::default(), stamp()).unwrap();
    let second = run_at(&[folder], &BandRecognizer, &RunConfig::default(), stamp()).unwrap();

    assert_ne!(first.output.questions, second.output.questions);
    assert_ne!(first.output.answers, second.output.answers);
    assert!(first.output.questions.exists());
    assert!(second.output.questions.exists());
}

#[test]
fn test_flowing_layout_packs_images() {
    let root = TempDir::new().unwrap();
    let folder = root.path().join("short");
    fs::create_dir(&folder).unwrap();
    write_screenshot(&folder.join("1.png"), 400, 100, Some(40));
    write_screenshot(&folder.join("2.png"), 400, 100, Some(60));
    write_screenshot(&folder.join("3.png"), 400, 100, None);

    let config = RunConfig {
        layout: LayoutConfig::flowing(),
        ..RunConfig::default()
    };
    let summary = run_at(&[folder], &BandRecognizer, &config, stamp()).unwrap();

    assert_eq!(summary.slots.len(), 3);
    assert_eq!(summary.slots[2].answer, SlotKind::NoContent);
    // Title page plus one shared content page per booklet
    assert_eq!(summary.question_pages, 2);
    assert_eq!(summary.answer_pages, 2);
}
