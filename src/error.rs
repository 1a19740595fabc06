//! Error types for the quiz booklet pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the quiz booklet library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Input path missing or not a directory
    #[error("Not a directory: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Folder has no eligible images after filtering
    #[error("No eligible images in {}", .0.display())]
    EmptyFolder(PathBuf),

    /// Every supplied folder was rejected
    #[error("No valid input folders")]
    NoValidFolders,

    /// The text recognizer could not produce a result
    #[error("Text recognition failed: {0}")]
    Recognition(String),

    /// Drawing a crop onto a page failed
    #[error("Render error: {0}")]
    Render(String),

    /// Writing a finished booklet failed
    #[error("Failed to save {}: {reason}", .path.display())]
    Persistence { path: PathBuf, reason: String },

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// General error
    #[error("{0}")]
    General(String),
}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Self {
        Error::InvalidGlob(err.to_string())
    }
}
