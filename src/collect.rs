//! Interactive collection of input folders

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Words that end the prompt loop besides an empty line
const QUIT: [&str; 2] = ["q", "quit"];

/// Turn user input into an absolute directory path
///
/// Surrounding quotes (as left by drag-and-drop into a terminal) are removed
/// and a leading `~` is expanded from `HOME`.
pub fn resolve_folder(raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');

    let expanded = match trimmed.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home).join(rest.trim_start_matches(['/', '\\'])),
                None => PathBuf::from(trimmed),
            }
        }
        _ => PathBuf::from(trimmed),
    };

    match expanded.canonicalize() {
        Ok(path) if path.is_dir() => Ok(path),
        _ => Err(Error::InvalidPath(expanded)),
    }
}

/// Read folder paths, one per line, until a blank line, `q`, or end of input
///
/// Prompts and per-path feedback are written to `out`. Invalid paths are
/// reported and skipped.
pub fn collect_folders<R: BufRead, W: Write>(mut input: R, mut out: W) -> Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    writeln!(out, "Enter paths to image folders. Press Enter on an empty line (or q) to finish.")?;

    loop {
        write!(out, "Folder {} path: ", folders.len() + 1)?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        let entry = line.trim();
        if entry.is_empty() || QUIT.iter().any(|q| entry.eq_ignore_ascii_case(q)) {
            break;
        }

        match resolve_folder(entry) {
            Ok(folder) => {
                writeln!(out, "  Added: {}", folder.display())?;
                folders.push(folder);
            }
            Err(e) => writeln!(out, "  {}", e)?,
        }
    }

    Ok(folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_collects_until_blank_line() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let input = format!(
            "{}\n/no/such/folder\n\"{}\"\n\n{}\n",
            first.path().display(),
            second.path().display(),
            first.path().display()
        );

        let mut out = Vec::new();
        let folders = collect_folders(Cursor::new(input), &mut out).unwrap();

        assert_eq!(
            folders,
            vec![
                first.path().canonicalize().unwrap(),
                second.path().canonicalize().unwrap()
            ]
        );
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Not a directory: /no/such/folder"));
        assert!(transcript.contains("Folder 3 path: "));
    }

    #[test]
    fn test_quit_word_and_eof() {
        let dir = TempDir::new().unwrap();
        let input = format!("{}\nQ\n", dir.path().display());
        let folders = collect_folders(Cursor::new(input), Vec::new()).unwrap();
        assert_eq!(folders.len(), 1);

        let folders = collect_folders(Cursor::new(""), Vec::new()).unwrap();
        assert!(folders.is_empty());
    }

    #[test]
    fn test_files_are_not_folders() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("1.png");
        std::fs::write(&file, b"").unwrap();
        assert!(matches!(
            resolve_folder(&file.to_string_lossy()),
            Err(Error::InvalidPath(_))
        ));
    }
}
