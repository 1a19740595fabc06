//! PDF output: page building, merging and inspection

pub mod create;
pub mod merge;
pub mod metadata;

// Re-export commonly used items
pub use create::{BookletDocument, Fidelity, Font};
pub use merge::{merge_documents, merge_pdfs, MergeOptions};
pub use metadata::count_pages;
