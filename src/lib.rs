//! Quiz Booklets Library
//!
//! Turns folders of quiz-result screenshots into two page-aligned PDFs: one
//! with the question part of every screenshot and one with the answer
//! feedback. This library provides functionality to:
//! - Collect input folders and enumerate their images in natural order
//! - Locate the "You answered" line with OCR
//! - Split screenshots into question and answer crops
//! - Lay crops out on PDF pages, one per page or flowing
//! - Assemble and merge the two booklets
//!
//! # Example
//!
//! ```no_run
//! use quiz_booklets::{pipeline, RunConfig};
//! use quiz_booklets::ocr::TesseractRecognizer;
//! use std::path::PathBuf;
//!
//! let folders = vec![PathBuf::from("quizzes/week-1")];
//! let summary = pipeline::run(&folders, &TesseractRecognizer::default(), &RunConfig::default())
//!     .expect("Failed to build booklets");
//!
//! println!("{}", summary.output.questions.display());
//! ```

pub mod booklet;
pub mod collect;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod layout;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod split;

// Re-export commonly used items
pub use config::{Assembly, EmptyFolderPolicy, RunConfig};
pub use error::{Error, Result};
pub use pipeline::{run, RunSummary};
