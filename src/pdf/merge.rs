//! PDF merging functionality using lopdf
//!
//! Used by the per-folder assembly strategy: every folder is rendered into its
//! own scratch PDF, and the scratch files are concatenated in folder order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Load `paths` and concatenate their pages into one in-memory document
///
/// Based on the lopdf merge example: objects of each input are renumbered past
/// the previous input's highest id, then a fresh catalog and page tree are
/// created that reference every page in order.
pub fn merge_documents(paths: &[PathBuf]) -> Result<Document> {
    if paths.is_empty() {
        return Err(Error::General("No input files provided".to_string()));
    }

    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for path in paths {
        if !path.exists() {
            return Err(Error::FileNotFound(path.clone()));
        }

        let mut doc = Document::load(path)?;
        if doc.get_pages().is_empty() {
            return Err(Error::EmptyPdf(path.clone()));
        }

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        page_ids.extend(doc.get_pages().into_values());
        objects.extend(doc.objects);
        debug!("Queued {} for merge", path.display());
    }

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);

    // New ids must start above everything copied in
    merged.max_id = max_id - 1;

    let pages_id = merged.new_object_id();
    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(page_ids.len() as i64));
    pages.set("Kids", Object::Array(kids));
    merged.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = merged.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = merged.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    Ok(merged)
}

/// Merge multiple PDF files into a single PDF
///
/// Returns the number of pages in the result. A failed write removes whatever
/// was partially written and is reported as [`Error::Persistence`].
pub fn merge_pdfs(options: &MergeOptions) -> Result<usize> {
    let mut merged = merge_documents(&options.input_paths)?;
    let page_count = merged.get_pages().len();

    merged.compress();
    save_or_clean_up(&mut merged, &options.output_path)?;

    Ok(page_count)
}

fn save_or_clean_up(doc: &mut Document, path: &Path) -> Result<()> {
    if let Err(e) = doc.save(path) {
        let _ = std::fs::remove_file(path);
        return Err(Error::Persistence {
            path: path.to_path_buf(),
            reason: e.to_string(),
        });
    }
    Ok(())
}
