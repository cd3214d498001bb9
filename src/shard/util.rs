//! Utility functions for shard management
//!
//! Provides helper functions for working with shard files on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::shard::{resolver, ShardError, ShardId, ShardResult, SHARD_EXTENSION};

/// Get the path for a shard file
pub fn shard_path(base_dir: &Path, shard_id: &str) -> PathBuf {
    base_dir.join(format!("{}.{}", shard_id, SHARD_EXTENSION))
}

/// List all shard files in a directory, sorted by shard ID
///
/// Sorting by ID is chronological because IDs are `YYYY-MM-DD`.
/// A missing directory has no shards.
pub fn list_shard_files(base_dir: &Path) -> ShardResult<Vec<(ShardId, PathBuf)>> {
    let entries = match fs::read_dir(base_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ShardError::file_error(
                base_dir,
                format!("Failed to list shard directory: {}", e),
            ))
        }
    };

    let mut result = Vec::new();

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if let Some(shard_id) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(resolver::shard_id_from_file_name)
        {
            result.push((shard_id, path));
        }
    }

    result.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(result)
}

/// Count the lines in a shard file
///
/// Every line counts, including blank or malformed ones. A final line without
/// a trailing newline counts too. A missing file has zero lines.
pub fn count_lines(path: &Path) -> ShardResult<usize> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(ShardError::file_error(
                path,
                format!("Failed to open shard file: {}", e),
            ))
        }
    };

    let mut count = 0;
    for line in BufReader::new(file).split(b'\n') {
        line?;
        count += 1;
    }

    Ok(count)
}

/// Append one line to a shard file, creating it if needed
///
/// The line and its newline go out in a single `write_all`.
pub fn append_line(path: &Path, line: &str) -> ShardResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ShardError::file_error(path, format!("Failed to open shard file: {}", e)))?;

    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');

    file.write_all(&buf)
        .map_err(|e| ShardError::file_error(path, format!("Failed to append to shard file: {}", e)))?;

    Ok(())
}

/// Delete a shard file
///
/// Returns `false` if the file was already gone.
pub fn delete_shard_file(path: &Path) -> ShardResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ShardError::file_error(
            path,
            format!("Failed to delete shard file: {}", e),
        )),
    }
}

/// Delete every shard file in a directory
///
/// Returns the number of files actually removed.
pub fn remove_all_shards(base_dir: &Path) -> ShardResult<usize> {
    let mut removed = 0;

    for (_, path) in list_shard_files(base_dir)? {
        if delete_shard_file(&path)? {
            removed += 1;
        }
    }

    Ok(removed)
}

/// Create the storage directory if it doesn't exist
pub fn ensure_shards_dir(base_dir: &Path) -> ShardResult<()> {
    fs::create_dir_all(base_dir).map_err(|e| {
        ShardError::file_error(base_dir, format!("Failed to create shards directory: {}", e))
    })
}
