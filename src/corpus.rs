//! Facilities for discovering corpus files and feeding their lines into a
//! tokenizer.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::IngestConfig;
use crate::error::{Result, SubtokError};
use crate::tokenizer::Tokenizer;

/// Discovers files rooted at the provided input paths according to the ingest
/// configuration.
///
/// Directories are traversed recursively by default; set
/// [`IngestConfig::recursive`] to `false` to limit discovery to the first
/// level. Symlink traversal is controlled through
/// [`IngestConfig::follow_symlinks`].
pub fn collect_paths<P: AsRef<Path>>(inputs: &[P], cfg: &IngestConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = input.as_ref();
        if !path.exists() {
            return Err(SubtokError::InvalidConfig(format!(
                "input path {path:?} does not exist"
            )));
        }
        let metadata = path
            .symlink_metadata()
            .map_err(|err| SubtokError::io(err, Some(path.to_path_buf())))?;
        if metadata.is_dir() {
            if cfg.recursive {
                let walker = WalkDir::new(path).follow_links(cfg.follow_symlinks);
                for entry in walker {
                    let entry = entry.map_err(|err| SubtokError::Internal(err.to_string()))?;
                    if entry.file_type().is_file() {
                        files.push(entry.path().to_path_buf());
                    }
                }
            } else {
                for entry in std::fs::read_dir(path)
                    .map_err(|err| SubtokError::io(err, Some(path.to_path_buf())))?
                {
                    let entry =
                        entry.map_err(|err| SubtokError::io(err, Some(path.to_path_buf())))?;
                    let entry_path = entry.path();
                    if entry_path.is_file() {
                        files.push(entry_path);
                    }
                }
            }
        } else if metadata.is_file() {
            files.push(path.to_path_buf());
        }
    }
    if files.is_empty() {
        return Err(SubtokError::InvalidConfig(
            "no files discovered in provided inputs".into(),
        ));
    }
    files.sort();
    Ok(files)
}

/// Feeds one corpus file into `tokenizer`, line by line, skipping the
/// configured number of header lines. Returns the number of lines ingested.
pub fn ingest_file(
    tokenizer: &mut Tokenizer,
    path: &Path,
    cfg: &IngestConfig,
) -> Result<usize> {
    let file = File::open(path).map_err(|err| SubtokError::io(err, Some(path.to_path_buf())))?;
    let reader = BufReader::new(file);
    let mut ingested = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| SubtokError::io(err, Some(path.to_path_buf())))?;
        if index < cfg.skip_header_lines {
            continue;
        }
        tokenizer.ingest(&line);
        ingested += 1;
    }
    Ok(ingested)
}
