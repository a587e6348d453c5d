// Grain identity encoded in directory layout
//
// Upstream partitioning writes one file per grain:
//   <root>/<grain_value_1>/<grain_value_2>/.../<file>
// so a file's grain is the N directories right above its name.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SplitError};

/// Directory segments identifying one grain, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GrainPath {
    segments: Vec<String>,
}

impl GrainPath {
    /// Derive the grain path from the `grain_column_count` directories
    /// immediately preceding the file name.
    ///
    /// Fails when the path is too shallow, or when one of those segments is
    /// not a plain directory name (`..`, a root, a drive prefix).
    pub fn from_file_path(path: &Path, grain_column_count: usize) -> Result<Self> {
        if grain_column_count == 0 {
            return Ok(Self::default());
        }

        let parents: Vec<Component<'_>> = path
            .parent()
            .map(|parent| parent.components().collect())
            .unwrap_or_default();

        let mut segments = Vec::with_capacity(grain_column_count);
        for component in parents.iter().rev().take(grain_column_count) {
            match component {
                Component::Normal(segment) => {
                    segments.push(segment.to_string_lossy().into_owned())
                }
                _ => break,
            }
        }

        if segments.len() != grain_column_count {
            return Err(SplitError::GrainPathDepth {
                path: path.display().to_string(),
                expected: grain_column_count,
                found: segments.len(),
            });
        }

        segments.reverse();
        Ok(Self { segments })
    }

    /// Build a grain path from raw values (e.g. while partitioning).
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            segments: values
                .into_iter()
                .map(|v| sanitize_segment(v.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Relative directory for this grain.
    pub fn to_path_buf(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for GrainPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Sanitize a grain value for use as a single directory name
///
/// Path separators and control characters become underscores, and names
/// that would be special to the filesystem (`""`, `.`, `..`) are escaped.
pub fn sanitize_segment(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    match cleaned.as_str() {
        "" => "__empty__".to_string(),
        "." | ".." => cleaned.replace('.', "_"),
        _ => cleaned,
    }
}

/// Partition format and matching glob for a set of grain columns.
///
/// `["Store", "Brand"]` gives `("{Store}/{Brand}/*.parquet", "*/*/*.parquet")`.
pub fn partition_format(grain_columns: &[String]) -> (String, String) {
    let mut format = String::new();
    let mut glob = String::new();
    for column in grain_columns {
        format.push('{');
        format.push_str(column);
        format.push_str("}/");
        glob.push_str("*/");
    }
    format.push_str("*.parquet");
    glob.push_str("*.parquet");
    (format, glob)
}
