//! Input discovery and mini-batch chunking for local runs.

use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use grainsplit_core::partition_format;
use tracing::{debug, warn};

use crate::error::{BatchError, Result};

/// Expand `inputs` into a sorted, de-duplicated list of files.
///
/// Files are taken as given. Directories are searched with the partition
/// glob for `grain_columns` (`*/*/*.parquet` for two columns); when that
/// finds nothing, CSV files at the same depth are used instead.
pub fn discover_inputs(inputs: &[PathBuf], grain_columns: &[String]) -> Result<Vec<PathBuf>> {
    let (_, parquet_glob) = partition_format(grain_columns);
    let csv_glob = parquet_glob.replace("*.parquet", "*.csv");

    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found = expand(input, &parquet_glob)?;
        if found.is_empty() {
            found = expand(input, &csv_glob)?;
        }
        if found.is_empty() {
            warn!(dir = %input.display(), pattern = %parquet_glob, "no input files found");
        }
        debug!(dir = %input.display(), files = found.len(), "discovered inputs");
        files.extend(found);
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn expand(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let escaped = Pattern::escape(&dir.to_string_lossy());
    let full = format!("{}/{}", escaped.trim_end_matches('/'), pattern);

    let paths = glob(&full).map_err(|e| BatchError::Discovery {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping unreadable path"),
        }
    }
    Ok(files)
}

/// Consecutive chunks of at most `size` files (a size of 0 is treated as 1).
pub fn mini_batches(files: &[PathBuf], size: usize) -> std::slice::Chunks<'_, PathBuf> {
    files.chunks(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_discover_partitioned_parquet() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("US/WA/part-0.parquet"));
        touch(&dir.path().join("US/CA/part-0.parquet"));
        touch(&dir.path().join("US/part-0.parquet"));
        touch(&dir.path().join("_partition.json"));

        let columns = vec!["country".to_string(), "state".to_string()];
        let files = discover_inputs(&[dir.path().to_path_buf()], &columns).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("US/CA/part-0.parquet"),
                dir.path().join("US/WA/part-0.parquet"),
            ]
        );
    }

    #[test]
    fn test_discover_falls_back_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("B/data.csv"));
        touch(&dir.path().join("A/data.csv"));

        let files = discover_inputs(&[dir.path().to_path_buf()], &["store".to_string()]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("A/data.csv"), dir.path().join("B/data.csv")]
        );
    }

    #[test]
    fn test_explicit_files_kept_and_deduplicated() {
        let inputs = vec![PathBuf::from("b/x.txt"), PathBuf::from("a/y.csv"), PathBuf::from("b/x.txt")];
        let files = discover_inputs(&inputs, &[]).unwrap();
        assert_eq!(files, vec![PathBuf::from("a/y.csv"), PathBuf::from("b/x.txt")]);
    }

    #[test]
    fn test_mini_batches() {
        let files: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("{i}.csv"))).collect();
        let sizes: Vec<usize> = mini_batches(&files, 2).map(|chunk| chunk.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(mini_batches(&files, 0).count(), 5);
    }
}
