//! Image discovery and natural ordering within a folder

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::{glob_with, MatchOptions, Pattern};
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

static PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:_([a-zA-Z]))?").expect("sort key pattern is valid")
});

/// Ordering key derived from a file stem such as `12_a`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Leading number and optional single-letter suffix
    Numbered(u64, String),
    /// Anything else; sorts after every numbered name
    Unnumbered,
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Numbered(a, sa), SortKey::Numbered(b, sb)) => a.cmp(b).then_with(|| sa.cmp(sb)),
            (SortKey::Numbered(..), SortKey::Unnumbered) => Ordering::Less,
            (SortKey::Unnumbered, SortKey::Numbered(..)) => Ordering::Greater,
            (SortKey::Unnumbered, SortKey::Unnumbered) => Ordering::Equal,
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute the natural sort key for a file name
///
/// - `"12_a.png"` → `Numbered(12, "a")`
/// - `"12.png"` → `Numbered(12, "")`
/// - `"x.png"` → `Unnumbered`
pub fn sort_key(file_name: &str) -> SortKey {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    let Some(caps) = PREFIX.captures(stem) else {
        return SortKey::Unnumbered;
    };

    match caps[1].parse::<u64>() {
        Ok(number) => {
            let suffix = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
            SortKey::Numbered(number, suffix)
        }
        // Too many digits to compare numerically
        Err(_) => SortKey::Unnumbered,
    }
}

/// Sort paths by their natural key; equal keys keep their relative order
pub fn sort_naturally(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|path| {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        sort_key(name)
    });
}

/// Options controlling which files count as images
#[derive(Debug, Clone)]
pub struct EnumerateOptions {
    /// File extensions to pick up, without the dot (matched case-insensitively)
    pub extensions: Vec<String>,
    /// Exact file names that are never picked up
    pub exclude: Vec<String>,
}

impl Default for EnumerateOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["png".to_string()],
            exclude: vec!["00_Result.png".to_string(), "00_Result".to_string()],
        }
    }
}

/// List the images in `dir`, filtered and in natural order
///
/// An empty result is not an error; the caller decides what an empty folder means.
pub fn list_images(dir: &Path, options: &EnumerateOptions) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InvalidPath(dir.to_path_buf()));
    }

    let match_options = MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };
    let base = Pattern::escape(&dir.to_string_lossy());

    let mut images = Vec::new();
    for ext in &options.extensions {
        let pattern = format!("{}/*.{}", base, Pattern::escape(ext));
        for entry in glob_with(&pattern, match_options)? {
            match entry {
                Ok(path) => {
                    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                    if !path.is_file() || options.exclude.iter().any(|ex| ex == name) {
                        debug!("Skipping {}", path.display());
                        continue;
                    }
                    if !images.contains(&path) {
                        images.push(path);
                    }
                }
                Err(e) => debug!("Unreadable entry under {}: {}", dir.display(), e),
            }
        }
    }

    sort_naturally(&mut images);
    Ok(images)
}
