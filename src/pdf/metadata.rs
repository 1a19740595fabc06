//! Page counting for written booklets

use std::path::Path;
use lopdf::Document;
use crate::error::{Error, Result};

/// Page count declared by the root of the page tree
fn declared_page_count(doc: &Document) -> Result<usize> {
    let root = doc.catalog()?.get(b"Pages")?.as_reference()?;
    let count = doc.get_dictionary(root)?.get(b"Count")?.as_i64()?;
    Ok(count.max(0) as usize)
}

/// Number of pages in a written booklet
///
/// An empty page tree is reported as [`Error::EmptyPdf`].
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    match declared_page_count(&Document::load(path)?)? {
        0 => Err(Error::EmptyPdf(path.to_path_buf())),
        n => Ok(n),
    }
}
